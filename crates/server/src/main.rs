//! vidtube server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidtube_api::AppState;
use vidtube_common::{Config, StorageBackend, StorageConfig, build_storage};
use vidtube_core::{
    CommentService, DashboardService, HealthService, LikeService, MediaService, PlaylistService,
    SubscriptionService, TweetService, UserService, VideoService,
};
use vidtube_db::repositories::{
    CommentRepository, DashboardRepository, LikeRepository, PlaylistRepository,
    SubscriptionRepository, TweetRepository, UserRepository, VideoRepository,
};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Wire repositories and services over one connection pool and storage backend.
fn build_state(
    db: Arc<DatabaseConnection>,
    storage: Arc<dyn StorageBackend>,
) -> AppState {
    let media = MediaService::new(storage);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let video_repo = VideoRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let tweet_repo = TweetRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let playlist_repo = PlaylistRepository::new(Arc::clone(&db));
    let subscription_repo = SubscriptionRepository::new(Arc::clone(&db));
    let dashboard_repo = DashboardRepository::new(Arc::clone(&db));

    AppState {
        user_service: UserService::new(user_repo.clone(), media.clone()),
        video_service: VideoService::new(video_repo.clone(), media),
        comment_service: CommentService::new(comment_repo.clone(), video_repo.clone()),
        like_service: LikeService::new(
            like_repo,
            video_repo.clone(),
            comment_repo,
            tweet_repo.clone(),
        ),
        tweet_service: TweetService::new(tweet_repo, user_repo.clone()),
        playlist_service: PlaylistService::new(playlist_repo, video_repo.clone(), user_repo.clone()),
        subscription_service: SubscriptionService::new(subscription_repo, user_repo),
        dashboard_service: DashboardService::new(dashboard_repo, video_repo),
        health_service: HealthService::new(db),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidtube=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting vidtube server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = vidtube_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    vidtube_db::migrate(&db).await?;
    info!("Migrations completed");

    let storage = build_storage(&config.storage)?;
    info!("Media storage ready");

    let state = build_state(Arc::new(db), storage);

    let mut app = vidtube_api::app(state);
    if let StorageConfig::Local { base_path, .. } = &config.storage {
        app = app.nest_service("/media", ServeDir::new(base_path));
    }

    // Uploads are bounded by the configured limit instead of axum's default
    let app = app
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        );

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
