//! Authentication payloads shared by the JSON API and the HTML login form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Signup request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    /// Desired username.
    #[validate(length(min = 3, max = 50, message = "must be 3 to 50 characters"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    /// Plaintext password.
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    /// Must equal `password`.
    #[validate(must_match(other = "password", message = "must match password"))]
    pub confirm_password: String,
}

/// Login request payload.
///
/// `login` accepts either a username or an email address.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username or email.
    #[validate(length(min = 1, message = "is required"))]
    pub login: String,
    /// Plaintext password.
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

/// Partial update of a user account.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    /// New username.
    #[validate(length(min = 3, max = 50, message = "must be 3 to 50 characters"))]
    pub username: Option<String>,
    /// New email address.
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    /// New password.
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: Option<String>,
    /// Manager flag. Only managers may change it.
    pub is_manager: Option<bool>,
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Whether the user is a manager.
    pub is_manager: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Response returned after a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// The authenticated user.
    pub user: UserInfo,
    /// Session expiry.
    pub expires_at: DateTime<Utc>,
}
