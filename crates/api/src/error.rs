//! JSON error envelope for API handlers.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use shareslice_core::{
    asset::AssetError,
    auth::{CredentialError, PasswordError},
    ownership::OwnershipError,
    trading::TradeError,
    valuation::ValuationError,
};
use shareslice_db::{
    db_error_to_app,
    repositories::{AssetRepoError, FractionError, TradingError, UserError, ValuationRepoError},
};
use shareslice_shared::AppError;

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An `AppError` rendered as `{"error": CODE, "message": text}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 401 for a missing or expired session.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self(AppError::Unauthorized("Authentication required".to_string()))
    }

    /// 403 with the given reason.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }

    /// 404 naming the missing entity.
    #[must_use]
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self(AppError::not_found(entity, id))
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message safe to show a client. Server errors are masked.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.0.is_server_error() {
            "An internal error occurred".to_string()
        } else {
            self.0.message().to_string()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = json!({
            "error": self.0.error_code(),
            "message": self.public_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(db_error_to_app(err))
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self(AppError::Internal(err.to_string()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(AppError::Validation(rejection.body_text()))
    }
}

/// Errors that already know how to become an `AppError`.
macro_rules! via_app_error {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for ApiError {
            fn from(err: $ty) -> Self {
                Self(AppError::from(err))
            }
        }
    )*};
}

/// Core errors that carry their own HTTP status.
macro_rules! via_status_code {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for ApiError {
            fn from(err: $ty) -> Self {
                Self(AppError::from_status(err.status_code(), err.to_string()))
            }
        }
    )*};
}

via_app_error!(
    validator::ValidationErrors,
    UserError,
    AssetRepoError,
    FractionError,
    TradingError,
    ValuationRepoError,
);

via_status_code!(
    AssetError,
    CredentialError,
    OwnershipError,
    TradeError,
    ValuationError,
);
