//! Asset error types for submission, approval, and supply changes.

use thiserror::Error;
use uuid::Uuid;

use crate::asset::types::AssetStatus;
use crate::valuation::ValuationError;

/// Errors that can occur in asset rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: AssetStatus,
        /// The attempted target status.
        to: AssetStatus,
    },

    /// Only managers may approve or reject assets.
    #[error("User {user_id} is not a manager")]
    NotManager {
        /// The user who attempted the action.
        user_id: Uuid,
    },

    /// Only the submitter may resubmit a rejected asset.
    #[error("User {user_id} did not submit this asset")]
    NotSubmitter {
        /// The user who attempted the action.
        user_id: Uuid,
    },

    /// Rejection reason is required but not provided.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Asset name is empty or too long.
    #[error("Asset name must be between 1 and {max} characters")]
    InvalidName {
        /// Maximum name length.
        max: usize,
    },

    /// Total fraction count is out of range.
    #[error("Total fractions must be between 1 and {max}, got {total}")]
    TotalFractionsOutOfRange {
        /// Submitted total.
        total: i64,
        /// Upper bound.
        max: i64,
    },

    /// Unit limits are inconsistent.
    #[error("Unit limits must satisfy 1 <= min ({min}) <= max ({max}) <= total ({total})")]
    InvalidUnitLimits {
        /// Submitted minimum.
        min: i64,
        /// Submitted maximum.
        max: i64,
        /// Submitted total.
        total: i64,
    },

    /// Submitted value must be positive.
    #[error("Submitted value must be greater than zero")]
    NonPositiveValue,

    /// Supply change would strand issued fractions or exceed the total.
    #[error("Available fractions must be between {issued} (issued) and {total} (total), got {requested}")]
    InvalidSupply {
        /// Requested available count.
        requested: i64,
        /// Quantity already issued to owners.
        issued: i64,
        /// Asset total.
        total: i64,
    },

    /// The asset must be approved for this operation.
    #[error("Asset is {status}, not approved")]
    NotApproved {
        /// Current status.
        status: AssetStatus,
    },

    /// Submitted value cannot be stored.
    #[error(transparent)]
    Amount(#[from] ValuationError),
}

impl AssetError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidTransition { .. }
            | Self::RejectionReasonRequired
            | Self::InvalidName { .. }
            | Self::TotalFractionsOutOfRange { .. }
            | Self::InvalidUnitLimits { .. }
            | Self::NonPositiveValue
            | Self::InvalidSupply { .. }
            | Self::NotApproved { .. } => 400,

            Self::NotManager { .. } | Self::NotSubmitter { .. } => 403,

            Self::Amount(inner) => inner.status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotManager { .. } => "NOT_MANAGER",
            Self::NotSubmitter { .. } => "NOT_SUBMITTER",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::InvalidName { .. } => "INVALID_NAME",
            Self::TotalFractionsOutOfRange { .. } => "TOTAL_FRACTIONS_OUT_OF_RANGE",
            Self::InvalidUnitLimits { .. } => "INVALID_UNIT_LIMITS",
            Self::NonPositiveValue => "NON_POSITIVE_VALUE",
            Self::InvalidSupply { .. } => "INVALID_SUPPLY",
            Self::NotApproved { .. } => "ASSET_NOT_APPROVED",
            Self::Amount(inner) => inner.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_errors_are_forbidden() {
        let err = AssetError::NotManager {
            user_id: Uuid::nil(),
        };
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "NOT_MANAGER");
    }

    #[test]
    fn test_transition_error_message() {
        let err = AssetError::InvalidTransition {
            from: AssetStatus::Approved,
            to: AssetStatus::Rejected,
        };
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("approved"));
        assert!(err.to_string().contains("rejected"));
    }
}
