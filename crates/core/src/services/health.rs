//! Health check service.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::warn;

/// Database reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbStatus {
    Connected,
    Disconnected,
}

/// Health check result.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Seconds since the service started
    pub uptime: f64,
    pub db: DbStatus,
    pub timestamp: DateTime<Utc>,
}

/// Health check service.
#[derive(Clone)]
pub struct HealthService {
    db: Arc<DatabaseConnection>,
    started: Instant,
}

impl HealthService {
    /// Create a new health service, starting the uptime clock.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            started: Instant::now(),
        }
    }

    /// Report uptime and whether the database answers.
    pub async fn check(&self) -> HealthReport {
        let db = match self.db.ping().await {
            Ok(()) => DbStatus::Connected,
            Err(e) => {
                warn!(error = %e, "Database ping failed");
                DbStatus::Disconnected
            }
        };

        HealthReport {
            uptime: self.started.elapsed().as_secs_f64(),
            db,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_connected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let report = HealthService::new(Arc::new(db)).check().await;

        assert_eq!(report.db, DbStatus::Connected);
        assert!(report.uptime >= 0.0);
    }

    #[tokio::test]
    async fn test_disconnected() {
        let report = HealthService::new(Arc::new(DatabaseConnection::Disconnected))
            .check()
            .await;

        assert_eq!(report.db, DbStatus::Disconnected);
    }
}
