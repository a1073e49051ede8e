//! Employee Attendance Backend
//!
//! REST backend for daily check-in/check-out, holidays, admin corrections,
//! monthly statistics and rankings, with SQLite or in-memory persistence.

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod engine;
mod errors;
mod models;
mod seed;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clock::{Clock, SystemClock};
use config::{Config, StoreKind};
use db::{MemoryStore, RecordStore, SqliteStore};
use engine::AttendanceEngine;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AttendanceEngine>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting attendance backend");
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (ATTENDANCE_API_PSK). Authentication is disabled!");
    }

    let store: Arc<dyn RecordStore> = match config.store {
        StoreKind::Sqlite => {
            tracing::info!("Database path: {:?}", config.db_path);
            let pool = db::init_database(&config.db_path).await?;
            Arc::new(SqliteStore::new(pool))
        }
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory store; nothing is persisted");
            Arc::new(MemoryStore::new())
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    seed::ensure_admin(
        store.as_ref(),
        &config.admin_username,
        &config.admin_password,
    )
    .await?;
    if config.seed_demo {
        seed::seed_demo(store.as_ref(), clock.now().date()).await?;
    }

    // Create application state
    let state = AppState {
        engine: Arc::new(AttendanceEngine::new(store)),
        clock,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Datastore
        .route("/datastore/revision", get(api::get_revision))
        .route("/login", post(api::login))
        // Employees
        .route(
            "/employees",
            get(api::list_employees).post(api::create_employee),
        )
        .route(
            "/employees/{id}",
            get(api::get_employee).delete(api::delete_employee),
        )
        .route("/employees/{id}/password", put(api::reset_password))
        .route("/employees/{id}/check-in", post(api::check_in))
        .route("/employees/{id}/check-out", post(api::check_out))
        .route(
            "/employees/{id}/attendance/today",
            get(api::today_attendance),
        )
        .route("/employees/{id}/attendance", get(api::attendance_history))
        .route("/employees/{id}/stats", get(api::monthly_stats))
        // Attendance
        .route(
            "/attendance",
            get(api::daily_overview).post(api::create_attendance),
        )
        .route("/attendance/{id}", put(api::correct_attendance))
        .route("/change-logs", get(api::list_change_logs))
        // Calendar
        .route(
            "/holidays",
            get(api::list_holidays).post(api::create_holiday),
        )
        .route("/holidays/{id}", delete(api::delete_holiday))
        .route("/calendar/day-off", get(api::day_off))
        // Reports
        .route("/rankings", get(api::rankings))
        .route("/alerts", get(api::alerts))
        .route("/reports/attendance", get(api::attendance_report))
        .route("/reports/attendance.csv", get(api::attendance_report_csv))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
