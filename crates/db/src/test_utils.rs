//! Test utilities for database operations.
//!
//! Creates throwaway `PostgreSQL` databases with the schema migrated, for
//! tests that need real constraint checking.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{user, video};
use crate::migrations::Migrator;

/// Test database server settings, read from `TEST_DB_*` variables.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: env_or("TEST_DB_USER", "vidtube_test"),
            password: env_or("TEST_DB_PASSWORD", "vidtube_test"),
            database: env_or("TEST_DB_NAME", "vidtube_test"),
        }
    }
}

impl TestDbConfig {
    /// URL of the test database.
    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// URL of the maintenance database, used to create and drop test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.url_for("postgres")
    }

    fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, database
        )
    }
}

/// A freshly created and migrated database, dropped by [`TestDatabase::drop_database`].
pub struct TestDatabase {
    /// Database connection.
    pub conn: DatabaseConnection,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Create a uniquely named database and run all migrations on it.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("vidtube_test_{}", &suffix[..12]);

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Created test database");

        Ok(Self { conn, config })
    }

    /// Get the database connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Insert a user with `username`, deriving the other columns from it.
    pub async fn insert_user(&self, username: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(ulid::Ulid::new().to_string().to_lowercase()),
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            full_name: Set(username.to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            avatar_url: Set(format!("memory://media/avatars/{username}.png")),
            cover_image_url: Set(None),
            token: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(&self.conn)
        .await
    }

    /// Insert a published video owned by `owner_id`.
    pub async fn insert_video(&self, owner_id: &str, title: &str) -> Result<video::Model, DbErr> {
        video::ActiveModel {
            id: Set(ulid::Ulid::new().to_string().to_lowercase()),
            title: Set(title.to_string()),
            description: Set(String::new()),
            video_url: Set("memory://media/videos/v.mp4".to_string()),
            thumbnail_url: Set("memory://media/thumbnails/v.png".to_string()),
            duration: Set(1),
            views: Set(0),
            is_published: Set(true),
            owner_id: Set(owner_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(&self.conn)
        .await
    }

    /// Drop the database. Consumes self because the connection must close first.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        self.conn.close().await?;

        let admin = Database::connect(&self.config.postgres_url()).await?;

        // Best effort: stray pool connections would block the drop
        let _ = admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    self.config.database
                ),
            ))
            .await;

        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database),
            ))
            .await?;
        admin.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }
}
