//! Classification of database errors by SQLSTATE.
//!
//! Constraint and trigger failures, and numbers too large for their
//! column, are client errors. Everything else is a server-side database
//! failure.

use sea_orm::{DbErr, RuntimeErr};
use shareslice_shared::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// A constraint failure reported by PostgreSQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbViolation {
    /// Duplicate key (`23505`).
    Unique(String),
    /// Missing referenced row (`23503`).
    ForeignKey(String),
    /// CHECK constraint or trigger rejection (`23514`).
    Check(String),
    /// Numeric value too large for its column (`22003`).
    OutOfRange(String),
}

impl DbViolation {
    /// Builds a violation from a SQLSTATE code, if it is one we classify.
    #[must_use]
    pub fn from_code(code: &str, message: impl Into<String>) -> Option<Self> {
        match code {
            UNIQUE_VIOLATION => Some(Self::Unique(message.into())),
            FOREIGN_KEY_VIOLATION => Some(Self::ForeignKey(message.into())),
            CHECK_VIOLATION => Some(Self::Check(message.into())),
            NUMERIC_OUT_OF_RANGE => Some(Self::OutOfRange(message.into())),
            _ => None,
        }
    }
}

impl From<DbViolation> for AppError {
    fn from(violation: DbViolation) -> Self {
        match violation {
            DbViolation::Unique(m) => Self::Conflict(m),
            DbViolation::ForeignKey(m) | DbViolation::Check(m) | DbViolation::OutOfRange(m) => {
                Self::Validation(m)
            }
        }
    }
}

/// Extracts the constraint violation behind a `DbErr`, if any.
#[must_use]
pub fn classify_db_error(err: &DbErr) -> Option<DbViolation> {
    let runtime = match err {
        DbErr::Exec(e) | DbErr::Query(e) | DbErr::Conn(e) => e,
        _ => return None,
    };

    let RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) = runtime else {
        return None;
    };

    let code = db_err.code()?;
    DbViolation::from_code(&code, db_err.message())
}

/// Converts a `DbErr` into the application error a client should see.
#[must_use]
pub fn db_error_to_app(err: DbErr) -> AppError {
    match classify_db_error(&err) {
        Some(violation) => violation.into(),
        None => match err {
            DbErr::RecordNotFound(m) => AppError::NotFound(m),
            other => AppError::Database(other.to_string()),
        },
    }
}
