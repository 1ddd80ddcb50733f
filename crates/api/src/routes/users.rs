//! User account routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{JsonBody, PageQuery, QueryParams, auth::user_info};
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
};
use shareslice_core::{
    auth::{hash_password, validate_username},
    portfolio::Portfolio,
};
use shareslice_db::{
    PortfolioRepository, SessionRepository, TransactionRepository, UserRepository,
    entities::transactions, repositories::UpdateUserInput,
};
use shareslice_shared::{
    auth::{UpdateUserRequest, UserInfo},
    types::PageResponse,
};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{id}/portfolio", get(get_portfolio))
        .route("/users/{id}/transactions", get(list_user_transactions))
}

/// Query parameters for a user's transactions.
#[derive(Debug, Deserialize)]
pub struct UserTransactionsQuery {
    /// Only transactions on this asset.
    pub asset_id: Option<Uuid>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// GET /users - Non-deleted users, managers only.
async fn list_users(
    State(state): State<AppState>,
    caller: CurrentUser,
    WithRejection(Query(query), _): QueryParams<PageQuery>,
) -> ApiResult<Json<PageResponse<UserInfo>>> {
    caller.require_manager()?;

    let page = state.page(query.page, query.per_page);
    let (users, total) = UserRepository::new(state.conn()).list(page).await?;

    Ok(Json(PageResponse::new(users, page, total).map(user_info)))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserInfo>> {
    caller.require_self_or_manager(id)?;

    let user = UserRepository::new(state.conn())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user", id))?;

    Ok(Json(user_info(user)))
}

/// PATCH /users/{id} - Partial update. Only managers may change roles.
async fn update_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<UserInfo>> {
    caller.require_self_or_manager(id)?;
    payload.validate()?;

    if payload.is_manager.is_some() {
        caller.require_manager()?;
    }
    if let Some(username) = &payload.username {
        validate_username(username)?;
    }

    let password_hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let user = UserRepository::new(state.conn())
        .update(
            id,
            UpdateUserInput {
                username: payload.username,
                email: payload.email,
                password_hash,
                is_manager: payload.is_manager,
            },
        )
        .await?;

    info!(user_id = %id, updated_by = %caller.id, "User updated");
    Ok(Json(user_info(user)))
}

/// DELETE /users/{id} - Soft delete and revoke every session.
async fn delete_user(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    caller.require_self_or_manager(id)?;

    UserRepository::new(state.conn()).soft_delete(id).await?;
    let revoked = SessionRepository::new(state.conn())
        .revoke_all_user_sessions(id)
        .await?;

    info!(user_id = %id, deleted_by = %caller.id, revoked, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{id}/portfolio
async fn get_portfolio(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Portfolio>> {
    caller.require_self_or_manager(id)?;

    if UserRepository::new(state.conn()).find_by_id(id).await?.is_none() {
        return Err(ApiError::not_found("user", id));
    }

    let portfolio = PortfolioRepository::new(state.conn()).for_user(id).await?;
    Ok(Json(portfolio))
}

/// GET /users/{id}/transactions - Newest first.
async fn list_user_transactions(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
    WithRejection(Query(query), _): QueryParams<UserTransactionsQuery>,
) -> ApiResult<Json<PageResponse<transactions::Model>>> {
    caller.require_self_or_manager(id)?;

    let page = state.page(query.page, query.per_page);
    let (rows, total) = TransactionRepository::new(state.conn())
        .list_for_user(id, query.asset_id, page)
        .await?;

    Ok(Json(PageResponse::new(rows, page, total)))
}
