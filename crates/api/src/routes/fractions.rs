//! Fraction routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::CurrentUser};
use shareslice_db::{FractionRepository, entities::fractions, repositories::FractionWithHistory};

/// Creates the fraction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fractions/{id}", get(get_fraction))
        .route("/fractions/{id}/lineage", get(get_lineage))
}

/// GET /fractions/{id} - The fraction and its decoded ownership history.
async fn get_fraction(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FractionWithHistory>> {
    let fraction = FractionRepository::new(state.conn())
        .find_with_history(id)
        .await?;
    Ok(Json(fraction))
}

/// GET /fractions/{id}/lineage - The fraction followed by its ancestors.
async fn get_lineage(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<fractions::Model>>> {
    let chain = FractionRepository::new(state.conn()).lineage(id).await?;
    Ok(Json(chain))
}
