//! Direct transfers between users.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use axum_extra::extract::WithRejection;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::JsonBody;
use crate::{AppState, error::ApiResult, middleware::CurrentUser};
use shareslice_db::{TradingRepository, repositories::TransferInput};

/// Creates the trade routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/trades", post(create_trade))
}

/// Request body for a direct transfer.
#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    /// Fraction the caller owns.
    pub fraction_id: Uuid,
    /// Recipient.
    pub to_user_id: Uuid,
    /// Units to move.
    pub quantity: i64,
    /// Agreed price per unit, if any.
    pub unit_price: Option<Decimal>,
}

/// POST /trades - Split units off a fraction the caller owns.
async fn create_trade(
    State(state): State<AppState>,
    caller: CurrentUser,
    WithRejection(Json(payload), _): JsonBody<TradeRequest>,
) -> ApiResult<impl IntoResponse> {
    let write = TradingRepository::new(state.conn())
        .transfer(
            caller.id,
            TransferInput {
                fraction_id: payload.fraction_id,
                to_user_id: payload.to_user_id,
                quantity: payload.quantity,
                unit_price: payload.unit_price,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(write)))
}
