//! Preproom Server - Equipment Booking Engine
//!
//! REST API server for laboratory equipment reservation and booking.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use preproom_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::{maintenance::spawn_sweeper, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            format!("preproom_server={},tower_http=debug", config.logging.level).into()
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Preproom Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.retention.clone());

    // Background retention sweeps
    if config.retention.enabled {
        spawn_sweeper(services.maintenance.clone());
        tracing::info!(
            interval_minutes = config.retention.sweep_interval_minutes,
            "Retention sweeper scheduled"
        );
    }

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Data routes, gated behind the maintenance flag
    let gated = Router::new()
        // Equipment inventory
        .route("/equipment", get(api::equipment::list_equipment))
        .route("/equipment", post(api::equipment::create_equipment))
        .route("/equipment/:id", get(api::equipment::get_equipment))
        .route("/equipment/:id", put(api::equipment::update_equipment))
        .route("/equipment/:id", delete(api::equipment::delete_equipment))
        // Activity templates
        .route("/activities", get(api::activities::list_activities))
        .route("/activities", post(api::activities::create_activity))
        .route("/activities/categories", get(api::activities::list_categories))
        .route("/activities/:id", get(api::activities::get_activity))
        .route("/activities/:id", put(api::activities::update_activity))
        .route("/activities/:id", delete(api::activities::delete_activity))
        .route("/activities/:id/instances", get(api::activities::count_instances))
        // Reservations
        .route("/reservations/check", post(api::reservations::check_reservation))
        // Bookings
        .route("/bookings", get(api::bookings::list_bookings))
        .route("/bookings", post(api::bookings::create_booking))
        .route("/bookings/ongoing", get(api::bookings::ongoing_bookings))
        .route("/bookings/:id", get(api::bookings::get_booking))
        .route("/bookings/:id", put(api::bookings::amend_booking))
        .route("/bookings/:id", delete(api::bookings::delete_booking))
        .route("/bookings/:id/postpone", post(api::bookings::postpone_booking))
        .route("/bookings/:id/status", put(api::bookings::set_booking_status))
        // Per-user views
        .route("/users/:id/bookings", get(api::bookings::personal_bookings))
        .route("/users/:id/bookings/current", get(api::bookings::current_booking))
        .route("/users/:id/notifications", get(api::dashboard::drain_notifications))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::maintenance_gate,
        ));

    // Health and maintenance stay reachable during a sweep
    let ungated = Router::new()
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        .route("/maintenance", get(api::maintenance::maintenance_status))
        .route("/maintenance/sweep", post(api::maintenance::trigger_sweep));

    let api_v1 = gated.merge(ungated).with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
