//! Order book view of an asset's active offers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shareslice_shared::types::{OfferId, UserId};

use crate::trading::offer::OfferSide;

/// One active offer as shown in the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookEntry {
    /// Offer ID.
    pub offer_id: OfferId,
    /// Offer owner.
    pub user_id: UserId,
    /// Buy or sell.
    pub side: OfferSide,
    /// Units offered.
    pub quantity: i64,
    /// Price per unit.
    pub price_per_unit: Decimal,
    /// Placement time.
    pub created_at: DateTime<Utc>,
}

/// Bids and asks for one asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderBook {
    /// Buy offers, best (highest) price first.
    pub bids: Vec<BookEntry>,
    /// Sell offers, best (lowest) price first.
    pub asks: Vec<BookEntry>,
}

impl OrderBook {
    /// Splits offers by side and orders each side by price, then age.
    #[must_use]
    pub fn from_offers(offers: impl IntoIterator<Item = BookEntry>) -> Self {
        let (mut bids, mut asks): (Vec<_>, Vec<_>) =
            offers.into_iter().partition(|o| o.side == OfferSide::Buy);

        bids.sort_by(|a, b| {
            b.price_per_unit
                .cmp(&a.price_per_unit)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        asks.sort_by(|a, b| {
            a.price_per_unit
                .cmp(&b.price_per_unit)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        Self { bids, asks }
    }

    /// Highest bid price.
    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|e| e.price_per_unit)
    }

    /// Lowest ask price.
    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|e| e.price_per_unit)
    }

    /// Best ask minus best bid, when both sides are present.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }
}
