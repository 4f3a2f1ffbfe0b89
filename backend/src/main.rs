//! Beverage Distribution Manager - Backend Server
//!
//! Inventory and sales tracking for a multi-site beverage distributor:
//! master data, daily warehouse counts per site and sales orders that
//! reserve stock atomically.

use axum::{response::Redirect, routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod feed;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

pub use config::Config;
pub use feed::ChangeFeed;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub feed: ChangeFeed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bdm_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Beverage Distribution Manager");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.is_development() {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    if let Some(admin) = &config.bootstrap_admin {
        services::AuthService::new(db_pool.clone(), &config)
            .ensure_bootstrap_admin(admin)
            .await?;
    }

    // Create application state
    let state = AppState {
        db: db_pool,
        feed: ChangeFeed::new(config.feed.capacity),
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/unauthorized", get(unauthorized_page))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .fallback(unknown_path)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                // Event streams are excluded by the default predicate
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Beverage Distribution Manager API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Landing page for requests rejected by a role gate
async fn unauthorized_page() -> &'static str {
    "You do not have access to this section / No tienes acceso a esta sección"
}

/// Unknown paths go back to the landing page
async fn unknown_path() -> Redirect {
    Redirect::to("/")
}
