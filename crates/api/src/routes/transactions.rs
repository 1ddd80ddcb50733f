//! Ledger entry routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
};
use shareslice_db::{TransactionRepository, entities::transactions};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/transactions/{id}", get(get_transaction))
}

/// Whether `user_id` gave or received units in `tx`.
fn is_party(tx: &transactions::Model, user_id: Uuid) -> bool {
    tx.to_owner_id == user_id || tx.from_owner_id == Some(user_id)
}

/// GET /transactions/{id} - Parties and managers only.
async fn get_transaction(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<transactions::Model>> {
    let tx = TransactionRepository::new(state.conn())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("transaction", id))?;

    if !caller.is_manager && !is_party(&tx, caller.id) {
        return Err(ApiError::forbidden("Not a party to this transaction"));
    }

    Ok(Json(tx))
}
