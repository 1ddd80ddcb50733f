//! Authentication routes: signup, login, logout and the current user.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::{CookieJar, WithRejection};
use tracing::info;
use validator::Validate;

use super::JsonBody;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{
        CurrentUser,
        auth::{end_session, start_session},
    },
};
use shareslice_core::auth::{LoginIdentifier, hash_password, validate_username, verify_password};
use shareslice_db::{UserRepository, entities::users};
use shareslice_shared::{
    AppError,
    auth::{LoginRequest, LoginResponse, SignupRequest, UserInfo},
};

/// Public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Auth routes that need a session.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}

/// Public view of a user row.
pub fn user_info(user: users::Model) -> UserInfo {
    CurrentUser::from(user).info()
}

/// Checks a login against stored credentials.
///
/// Unknown users, deleted users and wrong passwords all produce the same
/// 401 so the response does not reveal which accounts exist.
pub async fn authenticate(state: &AppState, request: &LoginRequest) -> ApiResult<users::Model> {
    request.validate()?;
    let login = LoginIdentifier::parse(&request.login)?;

    let invalid = || ApiError(AppError::Unauthorized("Invalid login or password".to_string()));

    let Some(user) = UserRepository::new(state.conn()).find_by_login(&login).await? else {
        info!(login = %request.login, "Login attempt for unknown user");
        return Err(invalid());
    };

    if !verify_password(&request.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid());
    }

    Ok(user)
}

/// POST /auth/signup - Register a user.
async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    validate_username(&payload.username)?;

    let password_hash = hash_password(&payload.password)?;
    let user = UserRepository::new(state.conn())
        .create(&payload.username, &payload.email, &password_hash)
        .await?;

    info!(user_id = %user.id, username = %user.username, "User signed up");
    Ok((StatusCode::CREATED, Json(user_info(user))))
}

/// POST /auth/login - Verify credentials and set the session cookie.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    WithRejection(Json(payload), _): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = authenticate(&state, &payload).await?;
    let (jar, expires_at) = start_session(&state, jar, &headers, user.id).await?;

    info!(user_id = %user.id, "User logged in");
    Ok((
        jar,
        Json(LoginResponse {
            user: user_info(user),
            expires_at,
        }),
    ))
}

/// POST /auth/logout - Revoke the session and clear the cookie.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let jar = end_session(&state, jar).await?;
    Ok((jar, StatusCode::NO_CONTENT))
}

/// GET /auth/me - The current user.
async fn me(user: CurrentUser) -> Json<UserInfo> {
    Json(user.info())
}
