//! Session cookie authentication.
//!
//! The cookie carries an opaque token; only its SHA-256 hash is stored.
//! The middleware resolves the token to a live, non-deleted user and stores
//! a [`CurrentUser`] in the request extensions for handlers to extract.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::USER_AGENT, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use sea_orm::DbErr;
use shareslice_core::{asset::Actor, auth::can_manage_account};
use shareslice_db::{SessionRepository, UserRepository, entities::users};
use shareslice_shared::{auth::UserInfo, config::SessionConfig};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Whether the user is a manager.
    pub is_manager: bool,
    /// Account creation time.
    pub created_at: chrono::DateTime<Utc>,
}

impl CurrentUser {
    /// The caller as an actor for workflow rules.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor::new(self.id, self.is_manager)
    }

    /// Fails with 403 unless the caller is a manager.
    pub fn require_manager(&self) -> Result<(), ApiError> {
        if self.is_manager {
            Ok(())
        } else {
            Err(ApiError::forbidden("Manager role required"))
        }
    }

    /// Fails with 403 unless the caller is `user_id` or a manager.
    pub fn require_self_or_manager(&self, user_id: Uuid) -> Result<(), ApiError> {
        if can_manage_account(self.id, self.is_manager, user_id) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Not allowed to access another user's data"))
        }
    }

    /// Public view of the account.
    #[must_use]
    pub fn info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_manager: self.is_manager,
            created_at: self.created_at,
        }
    }
}

impl From<users::Model> for CurrentUser {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_manager: user.is_manager,
            created_at: user.created_at.with_timezone(&Utc),
        }
    }
}

/// Looks up the user behind the session cookie, if any.
///
/// Returns `Ok(None)` for a missing, unknown, expired or revoked token, or
/// when the user has since been deleted.
pub async fn resolve_session(
    state: &AppState,
    jar: &CookieJar,
) -> Result<Option<CurrentUser>, DbErr> {
    let Some(token) = jar.get(&state.config.session.cookie_name) else {
        return Ok(None);
    };

    let sessions = SessionRepository::new(state.conn());
    let Some(session) = sessions.find_valid_by_token(token.value()).await? else {
        return Ok(None);
    };

    let users = UserRepository::new(state.conn());
    Ok(users
        .find_by_id(session.user_id)
        .await?
        .map(CurrentUser::from))
}

/// Opens a session for `user_id` and returns the jar with the cookie set.
pub async fn start_session(
    state: &AppState,
    jar: CookieJar,
    headers: &HeaderMap,
    user_id: Uuid,
) -> Result<(CookieJar, chrono::DateTime<Utc>), DbErr> {
    let config = &state.config.session;
    let ttl = i64::try_from(config.ttl_secs).unwrap_or(i64::MAX);
    let expires_at = Utc::now() + Duration::seconds(ttl);

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let ip_address = forwarded_for(headers);

    let (_, token) = SessionRepository::new(state.conn())
        .create(user_id, expires_at, user_agent, ip_address)
        .await?;

    Ok((jar.add(session_cookie(config, token)), expires_at))
}

/// Revokes the session in the cookie, if any, and clears the cookie.
pub async fn end_session(state: &AppState, jar: CookieJar) -> Result<CookieJar, DbErr> {
    let name = state.config.session.cookie_name.clone();
    if let Some(cookie) = jar.get(&name) {
        SessionRepository::new(state.conn())
            .revoke_by_token(cookie.value())
            .await?;
    }
    Ok(jar.remove(Cookie::build((name, "")).path("/")))
}

/// Builds the session cookie: `HttpOnly`, `SameSite=Lax`, `Path=/`.
#[must_use]
pub fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.secure)
        .build()
}

/// First address in `X-Forwarded-For`.
fn forwarded_for(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Rejects requests without a valid session cookie.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_session(&state, &jar).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => ApiError::unauthenticated().into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(ApiError::unauthenticated)
    }
}
