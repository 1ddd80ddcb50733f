//! Ownership error types.

use shareslice_shared::types::{FractionId, UserId};
use thiserror::Error;

/// Errors raised while planning transfers or reading histories.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnershipError {
    /// Quantity must be positive.
    #[error("Quantity must be greater than zero, got {quantity}")]
    NonPositiveQuantity {
        /// Requested quantity.
        quantity: i64,
    },

    /// The source fraction has been fully transferred away.
    #[error("Fraction {fraction_id} is inactive")]
    InactiveFraction {
        /// Source fraction.
        fraction_id: FractionId,
    },

    /// The source fraction holds fewer units than requested.
    #[error("Fraction {fraction_id} holds {available} units, {requested} requested")]
    InsufficientQuantity {
        /// Source fraction.
        fraction_id: FractionId,
        /// Units held.
        available: i64,
        /// Units requested.
        requested: i64,
    },

    /// The seller's active fractions together hold fewer units than requested.
    #[error("Seller only has {available} units available, {requested} requested")]
    InsufficientUnits {
        /// Units held across all active fractions.
        available: i64,
        /// Units requested.
        requested: i64,
    },

    /// Transfer to the current owner.
    #[error("User {owner_id} already owns this fraction")]
    SelfTransfer {
        /// The owner.
        owner_id: UserId,
    },

    /// Quantity falls outside the asset's per-transfer limits.
    #[error("Quantity {quantity} is outside the allowed range {min}..={max}")]
    OutsideUnitLimits {
        /// Requested quantity.
        quantity: i64,
        /// Asset minimum.
        min: i64,
        /// Asset maximum.
        max: i64,
    },

    /// The stored history is not a valid event array.
    #[error("Malformed ownership history: {0}")]
    MalformedHistory(String),

    /// Parent links loop back on themselves.
    #[error("Fraction lineage contains a cycle at {fraction_id}")]
    LineageCycle {
        /// First fraction seen twice.
        fraction_id: FractionId,
    },
}

impl OwnershipError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NonPositiveQuantity { .. }
            | Self::InactiveFraction { .. }
            | Self::InsufficientQuantity { .. }
            | Self::InsufficientUnits { .. }
            | Self::SelfTransfer { .. }
            | Self::OutsideUnitLimits { .. } => 400,

            Self::MalformedHistory(_) | Self::LineageCycle { .. } => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveQuantity { .. } => "NON_POSITIVE_QUANTITY",
            Self::InactiveFraction { .. } => "INACTIVE_FRACTION",
            Self::InsufficientQuantity { .. } => "INSUFFICIENT_QUANTITY",
            Self::InsufficientUnits { .. } => "INSUFFICIENT_UNITS",
            Self::SelfTransfer { .. } => "SELF_TRANSFER",
            Self::OutsideUnitLimits { .. } => "OUTSIDE_UNIT_LIMITS",
            Self::MalformedHistory(_) => "MALFORMED_HISTORY",
            Self::LineageCycle { .. } => "LINEAGE_CYCLE",
        }
    }
}
