//! Platform statistics for managers.

use axum::{Json, Router, extract::State, routing::get};

use crate::{AppState, error::ApiResult, middleware::CurrentUser};
use shareslice_db::{StatsRepository, repositories::PlatformStats};

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/stats", get(stats))
}

/// GET /admin/stats
async fn stats(State(state): State<AppState>, caller: CurrentUser) -> ApiResult<Json<PlatformStats>> {
    caller.require_manager()?;
    let stats = StatsRepository::new(state.conn()).collect().await?;
    Ok(Json(stats))
}
