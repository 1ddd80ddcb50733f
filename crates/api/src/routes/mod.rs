//! API route definitions.

use axum::{
    Json, Router,
    extract::Query,
    middleware,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::{AppState, error::ApiError, middleware::auth_middleware};

pub mod admin;
pub mod assets;
pub mod auth;
pub mod fractions;
pub mod health;
pub mod offers;
pub mod trades;
pub mod transactions;
pub mod users;

/// JSON body whose rejections use the API error envelope.
pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// Query string whose rejections use the API error envelope.
pub type QueryParams<T> = WithRejection<Query<T>, ApiError>;

/// `?page&per_page` for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page, clamped to the configured maximum.
    pub per_page: Option<u32>,
}

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .merge(assets::routes())
        .merge(fractions::routes())
        .merge(trades::routes())
        .merge(transactions::routes())
        .merge(offers::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
