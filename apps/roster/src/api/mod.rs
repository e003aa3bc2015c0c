//! # Roster HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /students` - List, search, filter and sort students
//! - `POST /students` - Register a student
//! - `GET|PATCH|DELETE /students/{id}` - Fetch, update or delete one student
//! - `POST /students/bulk-delete` - Delete several students
//! - `POST /students/{id}/activities` - Append to the activity log
//! - `GET /next-id` - Id the next registration will receive
//! - `GET /statistics` - Aggregate statistics (cached)
//! - `GET /analysis` - Performance analysis
//! - `POST /cache/clear` - Drop cached statistics
//! - `GET /export` - CSV export
//! - `POST /import` - CSV import (partial success)
//!
//! ## CORS
//!
//! `cors_origins` (config file or `ROSTER_CORS_ORIGINS`) is a comma-separated
//! list of allowed origins, or "*" for all. Unset means localhost only.

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `roster::api::*`)
pub use handlers::status_for;
pub use types::{
    ActivityRequest, ActivityResponse, BulkDeleteRequest, BulkDeleteResponse, CacheClearResponse,
    ErrorResponse, HealthResponse, ImportResponse, ListParams, NextIdResponse,
    StudentListResponse, StudentResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use roster_core::{Manager, RosterError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (CSV imports included).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the registry.
#[derive(Clone)]
pub struct AppState {
    /// The registry. Reads share the lock; mutations take it exclusively.
    pub manager: Arc<RwLock<Manager>>,
    /// Allowed CORS origins, as configured.
    pub cors_origins: Option<String>,
}

impl AppState {
    /// Create new app state around a registry.
    #[must_use]
    pub fn new(manager: Manager) -> Self {
        Self {
            manager: Arc::new(RwLock::new(manager)),
            cors_origins: None,
        }
    }

    #[must_use]
    pub fn with_cors_origins(mut self, origins: Option<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from the configured origins.
///
/// - `"*"`: allows all origins
/// - unset, or no parsable origin: localhost only
/// - otherwise: the comma-separated list
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. Do not use this in production.");
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                restricted_cors(allowed)
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.cors_origins.as_deref());

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/students",
            get(handlers::list_handler).post(handlers::create_handler),
        )
        .route("/students/bulk-delete", post(handlers::bulk_delete_handler))
        .route(
            "/students/{id}",
            get(handlers::get_handler)
                .patch(handlers::update_handler)
                .delete(handlers::delete_handler),
        )
        .route(
            "/students/{id}/activities",
            post(handlers::activity_handler),
        )
        .route("/next-id", get(handlers::next_id_handler))
        .route("/statistics", get(handlers::statistics_handler))
        .route("/analysis", get(handlers::analysis_handler))
        .route("/cache/clear", post(handlers::cache_clear_handler))
        .route("/export", get(handlers::export_handler))
        .route("/import", post(handlers::import_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), RosterError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RosterError::Persistence(format!("Bind failed: {}", e)))?;

    tracing::info!("Roster HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RosterError::Persistence(format!("Server error: {}", e)))
}

/// Resolve on Ctrl+C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
