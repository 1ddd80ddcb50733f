//! Offer routes: listing, placing, cancelling and accepting offers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{JsonBody, QueryParams};
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
};
use shareslice_core::trading::{OfferSide, TradeSummary};
use shareslice_db::{
    TradingRepository,
    entities::offers,
    repositories::{CreateOfferInput, OfferFilter, UpdateOfferInput},
};
use shareslice_shared::types::PageResponse;

/// Creates the offer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/offers", get(list_offers).post(create_offer))
        .route(
            "/offers/{id}",
            get(get_offer).put(update_offer).delete(cancel_offer),
        )
        .route("/offers/{id}/accept", post(accept_offer))
}

/// Query parameters for listing offers.
#[derive(Debug, Deserialize)]
pub struct ListOffersQuery {
    /// Filter by asset.
    pub asset_id: Option<Uuid>,
    /// `buy` or `sell`.
    pub side: Option<OfferSide>,
    /// Lowest price per unit (inclusive).
    pub min_price: Option<Decimal>,
    /// Highest price per unit (inclusive).
    pub max_price: Option<Decimal>,
    /// Filter by the user who placed the offer.
    pub user_id: Option<Uuid>,
    /// Filter by active flag.
    pub active: Option<bool>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for placing an offer.
#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    /// Asset to trade.
    pub asset_id: Uuid,
    /// `buy` or `sell`.
    pub side: OfferSide,
    /// Units wanted or offered.
    pub quantity: i64,
    /// Price per unit.
    pub price_per_unit: Decimal,
}

/// Request body for changing an offer's terms.
#[derive(Debug, Deserialize)]
pub struct UpdateOfferRequest {
    /// New quantity.
    pub quantity: Option<i64>,
    /// New price per unit.
    pub price_per_unit: Option<Decimal>,
}

/// An offer as returned by the API.
#[derive(Debug, Serialize)]
pub struct OfferResponse {
    /// Offer ID.
    pub id: Uuid,
    /// Asset ID.
    pub asset_id: Uuid,
    /// User who placed the offer.
    pub user_id: Uuid,
    /// `buy` or `sell`.
    pub side: OfferSide,
    /// Units.
    pub quantity: i64,
    /// Price per unit.
    pub price_per_unit: Decimal,
    /// Whether the offer can still be accepted.
    pub is_active: bool,
    /// When the offer was placed.
    pub created_at: DateTime<Utc>,
}

impl From<offers::Model> for OfferResponse {
    fn from(offer: offers::Model) -> Self {
        Self {
            id: offer.id,
            asset_id: offer.asset_id,
            user_id: offer.user_id,
            side: OfferSide::from_is_buyer(offer.is_buyer),
            quantity: offer.quantity,
            price_per_unit: offer.price_per_unit,
            is_active: offer.is_active,
            created_at: offer.created_at.with_timezone(&Utc),
        }
    }
}

/// GET /offers
async fn list_offers(
    State(state): State<AppState>,
    _caller: CurrentUser,
    WithRejection(Query(query), _): QueryParams<ListOffersQuery>,
) -> ApiResult<Json<PageResponse<OfferResponse>>> {
    let page = state.page(query.page, query.per_page);
    let filter = OfferFilter {
        asset_id: query.asset_id,
        side: query.side,
        min_price: query.min_price,
        max_price: query.max_price,
        user_id: query.user_id,
        active: query.active,
    };

    let (rows, total) = TradingRepository::new(state.conn())
        .list_offers(&filter, page)
        .await?;

    Ok(Json(PageResponse::new(rows, page, total).map(OfferResponse::from)))
}

/// POST /offers
async fn create_offer(
    State(state): State<AppState>,
    caller: CurrentUser,
    WithRejection(Json(payload), _): JsonBody<CreateOfferRequest>,
) -> ApiResult<impl IntoResponse> {
    let offer = TradingRepository::new(state.conn())
        .create_offer(
            caller.id,
            CreateOfferInput {
                asset_id: payload.asset_id,
                side: payload.side,
                quantity: payload.quantity,
                price_per_unit: payload.price_per_unit,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(OfferResponse::from(offer))))
}

/// GET /offers/{id}
async fn get_offer(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OfferResponse>> {
    let offer = TradingRepository::new(state.conn())
        .find_offer(id)
        .await?
        .ok_or_else(|| ApiError::not_found("offer", id))?;

    Ok(Json(OfferResponse::from(offer)))
}

/// PUT /offers/{id} - Change quantity or price, owner only.
async fn update_offer(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdateOfferRequest>,
) -> ApiResult<Json<OfferResponse>> {
    let offer = TradingRepository::new(state.conn())
        .update_offer(
            caller.id,
            id,
            UpdateOfferInput {
                quantity: payload.quantity,
                price_per_unit: payload.price_per_unit,
            },
        )
        .await?;

    Ok(Json(OfferResponse::from(offer)))
}

/// DELETE /offers/{id} - Owner only.
async fn cancel_offer(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OfferResponse>> {
    let offer = TradingRepository::new(state.conn())
        .cancel_offer(caller.id, id)
        .await?;

    Ok(Json(OfferResponse::from(offer)))
}

/// POST /offers/{id}/accept - Trade against the offer.
async fn accept_offer(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TradeSummary>> {
    let summary = TradingRepository::new(state.conn())
        .accept_offer(caller.id, id)
        .await?;
    Ok(Json(summary))
}
