//! Username and login identifier rules.

use thiserror::Error;

/// Errors raised by credential rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Username contains characters outside `[A-Za-z0-9_.-]`.
    #[error("username may only contain letters, digits, '_', '.' and '-'")]
    InvalidUsername,

    /// Login string is empty after trimming.
    #[error("login is required")]
    EmptyLogin,
}

impl CredentialError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUsername => "INVALID_USERNAME",
            Self::EmptyLogin => "EMPTY_LOGIN",
        }
    }
}

/// Checks the username character set.
///
/// Length is validated on the request payload; this only rejects characters
/// that would make a username look like an email.
pub fn validate_username(username: &str) -> Result<(), CredentialError> {
    let valid = !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if valid {
        Ok(())
    } else {
        Err(CredentialError::InvalidUsername)
    }
}

/// What a login string refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    /// Login by email address.
    Email(String),
    /// Login by username.
    Username(String),
}

impl LoginIdentifier {
    /// Parses a login string. Anything containing `@` is an email.
    pub fn parse(login: &str) -> Result<Self, CredentialError> {
        let trimmed = login.trim();
        if trimmed.is_empty() {
            return Err(CredentialError::EmptyLogin);
        }

        if trimmed.contains('@') {
            Ok(Self::Email(trimmed.to_lowercase()))
        } else {
            Ok(Self::Username(trimmed.to_string()))
        }
    }
}
