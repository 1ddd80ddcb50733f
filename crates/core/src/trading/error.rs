//! Trade error types.

use shareslice_shared::types::{OfferId, UserId};
use thiserror::Error;

use crate::ownership::OwnershipError;
use crate::valuation::ValuationError;

/// Errors that can occur when creating or accepting offers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TradeError {
    /// The offer was cancelled or already filled.
    #[error("Offer {offer_id} is no longer active")]
    OfferInactive {
        /// The offer.
        offer_id: OfferId,
    },

    /// A user tried to accept their own offer.
    #[error("User {user_id} cannot trade with themselves")]
    SelfTrade {
        /// The user.
        user_id: UserId,
    },

    /// Price per unit must be positive.
    #[error("Price per unit must be greater than zero")]
    NonPositivePrice,

    /// Only the offer owner may cancel it.
    #[error("User {user_id} does not own offer {offer_id}")]
    NotOfferOwner {
        /// The user.
        user_id: UserId,
        /// The offer.
        offer_id: OfferId,
    },

    /// Price cannot be stored.
    #[error(transparent)]
    Amount(#[from] ValuationError),

    /// Units could not be moved.
    #[error(transparent)]
    Ownership(#[from] OwnershipError),
}

impl TradeError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::OfferInactive { .. } | Self::SelfTrade { .. } | Self::NonPositivePrice => 400,
            Self::NotOfferOwner { .. } => 403,
            Self::Amount(inner) => inner.status_code(),
            Self::Ownership(inner) => inner.status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::OfferInactive { .. } => "OFFER_INACTIVE",
            Self::SelfTrade { .. } => "SELF_TRADE",
            Self::NonPositivePrice => "NON_POSITIVE_PRICE",
            Self::NotOfferOwner { .. } => "NOT_OFFER_OWNER",
            Self::Amount(inner) => inner.error_code(),
            Self::Ownership(inner) => inner.error_code(),
        }
    }
}
