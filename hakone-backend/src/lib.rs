use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export shared types from hakone-types
pub use hakone_types::*;

pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod guest_link;
pub mod guest_link_id;
pub mod handlers;
pub mod service;
pub mod store;
pub mod validation;

use clock::SystemClock;
use config::Config;
use database::setup_database;
use error::{AppError, Result};
use guest_link_id::RandomIdGenerator;
use service::GuestLinkService;
use store::SeaOrmGuestLinkStore;

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub guest_links: GuestLinkService,
}

impl AppState {
    /// Production wiring: database-backed store, wall clock, random IDs
    pub fn new(config: Config, db: sea_orm::DatabaseConnection) -> Self {
        let guest_links = GuestLinkService::new(
            Arc::new(SeaOrmGuestLinkStore::new(db)),
            Arc::new(SystemClock),
            Arc::new(RandomIdGenerator),
        );
        Self {
            config,
            guest_links,
        }
    }
}

pub async fn run_server() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hakone_backend=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Setup database
    let db = setup_database(&config.database_url).await?;

    let server_address = config.server_address.clone();
    let state = AppState::new(config, db);

    // Build the application router
    let app = create_app(state);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(&server_address)
        .await
        .map_err(|e| {
            AppError::ServerError(format!("Failed to bind to {}: {}", server_address, e))
        })?;

    tracing::info!("🚀 Hakone backend server starting on {}", server_address);

    // Start the server
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::ServerError(format!("Server error: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_request_body_bytes;

    Router::new()
        // Guest link administration
        .route(
            "/api/guest-links",
            post(handlers::create_guest_link)
                .layer(DefaultBodyLimit::max(body_limit))
                .get(handlers::list_guest_links),
        )
        .route(
            "/api/guest-links/:id",
            get(handlers::get_guest_link).delete(handlers::delete_guest_link),
        )
        // Health check
        .route("/health", get(handlers::health_check))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
