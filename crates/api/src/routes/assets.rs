//! Asset routes: submission, the approval workflow, valuations, supply,
//! issuance, and the per-asset views of fractions, ledger and order book.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{JsonBody, QueryParams};
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
};
use shareslice_core::{
    asset::{AssetStatus, AssetSubmission},
    ownership::OwnerHolding,
    trading::OrderBook,
};
use shareslice_db::{
    AssetRepository, FractionRepository, TradingRepository, TransactionRepository,
    ValuationRepository,
    entities::{assets, fractions, transactions},
    repositories::{AssetDetail, LedgerFilter, ValuationPoint},
};
use shareslice_shared::{AppError, types::PageResponse};

/// Creates the asset routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assets", get(list_assets).post(submit_asset))
        .route("/assets/{id}", get(get_asset))
        .route("/assets/{id}/approve", post(approve_asset))
        .route("/assets/{id}/reject", post(reject_asset))
        .route("/assets/{id}/resubmit", post(resubmit_asset))
        .route("/assets/{id}/history", get(value_history))
        .route("/assets/{id}/valuations", post(adjust_valuation))
        .route("/assets/{id}/supply", patch(change_supply))
        .route("/assets/{id}/issue", post(issue_fractions))
        .route("/assets/{id}/fractions", get(list_fractions))
        .route("/assets/{id}/snapshot", get(ownership_snapshot))
        .route("/assets/{id}/transactions", get(asset_ledger))
        .route("/assets/{id}/offers", get(order_book))
}

/// Query parameters for listing assets.
#[derive(Debug, Deserialize)]
pub struct ListAssetsQuery {
    /// `pending`, `approved` or `rejected`. Defaults to `approved`.
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for rejecting an asset.
#[derive(Debug, Deserialize, Validate)]
pub struct RejectRequest {
    /// Why the asset was rejected.
    #[validate(length(min = 1, max = 1000, message = "must be 1 to 1000 characters"))]
    pub reason: String,
}

/// Date bounds for the valuation history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// First day (inclusive, `YYYY-MM-DD`).
    pub from: Option<NaiveDate>,
    /// Last day (inclusive, `YYYY-MM-DD`).
    pub to: Option<NaiveDate>,
}

/// Request body for a manual valuation.
#[derive(Debug, Deserialize)]
pub struct ValuationRequest {
    /// New asset value.
    pub value: Decimal,
    /// Why the value changed.
    pub reason: Option<String>,
}

/// Request body for a supply change.
#[derive(Debug, Deserialize)]
pub struct SupplyRequest {
    /// New available supply.
    pub available_fractions: i64,
}

/// Request body for issuing units from the unissued pool.
#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    /// Recipient.
    pub owner_id: Uuid,
    /// Units to issue.
    pub quantity: i64,
}

/// Query parameters for an asset's fractions.
#[derive(Debug, Deserialize)]
pub struct FractionsQuery {
    /// Include spent fractions.
    #[serde(default)]
    pub include_inactive: bool,
}

/// Query parameters for an ownership snapshot.
#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    /// Day to reconstruct; the end of that day in UTC is used.
    pub at: Option<NaiveDate>,
}

/// Query parameters for an asset's ledger.
#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    /// Only transactions this user is a party to.
    pub owner_id: Option<Uuid>,
    /// First day (inclusive).
    pub from: Option<NaiveDate>,
    /// Last day (inclusive).
    pub to: Option<NaiveDate>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Fails with 404 when the asset does not exist.
async fn ensure_asset(state: &AppState, id: Uuid) -> ApiResult<assets::Model> {
    AssetRepository::new(state.conn())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("asset", id))
}

/// Last instant of `day` in UTC.
fn end_of_day(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|t| t.and_utc())
}

/// GET /assets - Assets by status, approved by default.
async fn list_assets(
    State(state): State<AppState>,
    _caller: CurrentUser,
    WithRejection(Query(query), _): QueryParams<ListAssetsQuery>,
) -> ApiResult<Json<PageResponse<assets::Model>>> {
    let status = match query.status.as_deref() {
        None => AssetStatus::Approved,
        Some(raw) => AssetStatus::parse(raw).ok_or_else(|| {
            ApiError(AppError::Validation(format!(
                "status must be pending, approved or rejected, got '{raw}'"
            )))
        })?,
    };

    let page = state.page(query.page, query.per_page);
    let (rows, total) = AssetRepository::new(state.conn())
        .list(status.into(), page)
        .await?;

    Ok(Json(PageResponse::new(rows, page, total)))
}

/// POST /assets - Submit an asset for approval.
async fn submit_asset(
    State(state): State<AppState>,
    caller: CurrentUser,
    WithRejection(Json(payload), _): JsonBody<AssetSubmission>,
) -> ApiResult<impl IntoResponse> {
    let asset = AssetRepository::new(state.conn())
        .submit(caller.id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}

/// GET /assets/{id} - Asset with latest value and fraction value.
async fn get_asset(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AssetDetail>> {
    let detail = AssetRepository::new(state.conn()).find_detail(id).await?;
    Ok(Json(detail))
}

/// POST /assets/{id}/approve - Approve and issue the genesis fraction.
async fn approve_asset(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let approval = AssetRepository::new(state.conn())
        .approve(id, &caller.actor())
        .await?;

    Ok(Json(approval))
}

/// POST /assets/{id}/reject
async fn reject_asset(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<RejectRequest>,
) -> ApiResult<Json<assets::Model>> {
    payload.validate()?;

    let asset = AssetRepository::new(state.conn())
        .reject(id, &caller.actor(), &payload.reason)
        .await?;

    Ok(Json(asset))
}

/// POST /assets/{id}/resubmit - Rejected back to pending, submitter only.
async fn resubmit_asset(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<assets::Model>> {
    let asset = AssetRepository::new(state.conn())
        .resubmit(id, &caller.actor())
        .await?;

    Ok(Json(asset))
}

/// GET /assets/{id}/history - Valuations, oldest first.
async fn value_history(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Query(query), _): QueryParams<HistoryQuery>,
) -> ApiResult<Json<Vec<ValuationPoint>>> {
    ensure_asset(&state, id).await?;

    let points = ValuationRepository::new(state.conn())
        .history(id, query.from, query.to)
        .await?;
    Ok(Json(points))
}

/// POST /assets/{id}/valuations - Manual valuation, managers only.
async fn adjust_valuation(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<ValuationRequest>,
) -> ApiResult<impl IntoResponse> {
    let row = ValuationRepository::new(state.conn())
        .record_adjustment(id, &caller.actor(), payload.value, payload.reason)
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// PATCH /assets/{id}/supply - Managers only.
async fn change_supply(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<SupplyRequest>,
) -> ApiResult<Json<assets::Model>> {
    let asset = AssetRepository::new(state.conn())
        .change_supply(id, &caller.actor(), payload.available_fractions)
        .await?;

    Ok(Json(asset))
}

/// POST /assets/{id}/issue - Units from the unissued pool, managers only.
async fn issue_fractions(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<IssueRequest>,
) -> ApiResult<impl IntoResponse> {
    let write = AssetRepository::new(state.conn())
        .issue(id, &caller.actor(), payload.owner_id, payload.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(write)))
}

/// GET /assets/{id}/fractions
async fn list_fractions(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Query(query), _): QueryParams<FractionsQuery>,
) -> ApiResult<Json<Vec<fractions::Model>>> {
    ensure_asset(&state, id).await?;

    let rows = FractionRepository::new(state.conn())
        .list_by_asset(id, query.include_inactive)
        .await?;
    Ok(Json(rows))
}

/// GET /assets/{id}/snapshot - Holdings per owner at the end of a day.
async fn ownership_snapshot(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Query(query), _): QueryParams<SnapshotQuery>,
) -> ApiResult<Json<Vec<OwnerHolding>>> {
    ensure_asset(&state, id).await?;

    let at = match query.at {
        Some(day) => end_of_day(day)
            .ok_or_else(|| ApiError(AppError::Validation(format!("invalid date {day}"))))?,
        None => Utc::now(),
    };

    let holdings = FractionRepository::new(state.conn())
        .snapshot(id, at)
        .await?;
    Ok(Json(holdings))
}

/// GET /assets/{id}/transactions - The asset's ledger, newest first.
async fn asset_ledger(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Query(query), _): QueryParams<LedgerQuery>,
) -> ApiResult<Json<PageResponse<transactions::Model>>> {
    ensure_asset(&state, id).await?;

    let page = state.page(query.page, query.per_page);
    let filter = LedgerFilter {
        owner_id: query.owner_id,
        from: query.from,
        to: query.to,
    };
    let (rows, total) = TransactionRepository::new(state.conn())
        .list_for_asset(id, &filter, page)
        .await?;

    Ok(Json(PageResponse::new(rows, page, total)))
}

/// GET /assets/{id}/offers - Active bids and asks.
async fn order_book(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderBook>> {
    ensure_asset(&state, id).await?;

    let book = TradingRepository::new(state.conn()).order_book(id).await?;
    Ok(Json(book))
}
