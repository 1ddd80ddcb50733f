//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - JSON routes under `/api/v1`
//! - Cookie session middleware and the `CurrentUser` extractor
//! - Server-rendered login and dashboard pages
//! - `ApiError`, the JSON error envelope

pub mod error;
pub mod middleware;
pub mod pages;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use shareslice_shared::{AppConfig, types::PageRequest};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Creates the state from a connection and configuration.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }

    /// Clones the connection handle for a repository.
    #[must_use]
    pub fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }

    /// Builds a page request clamped to the configured limits.
    #[must_use]
    pub fn page(&self, page: Option<u32>, per_page: Option<u32>) -> PageRequest {
        PageRequest::from_query(page, per_page, self.config.pagination)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .merge(pages::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
