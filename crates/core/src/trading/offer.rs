//! Offer rules and trade parties.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shareslice_shared::types::{AssetId, OfferId, UserId};

use crate::ownership::UnitLimits;
use crate::trading::error::TradeError;
use crate::valuation::{round_value, validate_valuation};

/// Which side of the book an offer sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSide {
    /// The owner wants to buy units.
    Buy,
    /// The owner wants to sell units.
    Sell,
}

impl OfferSide {
    /// Maps the stored `is_buyer` flag.
    #[must_use]
    pub const fn from_is_buyer(is_buyer: bool) -> Self {
        if is_buyer { Self::Buy } else { Self::Sell }
    }

    /// Inverse of [`OfferSide::from_is_buyer`].
    #[must_use]
    pub const fn is_buyer(self) -> bool {
        matches!(self, Self::Buy)
    }

    /// Parses `buy` or `sell`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Buyer and seller of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parties {
    /// Receives units.
    pub buyer: UserId,
    /// Gives up units.
    pub seller: UserId,
}

/// Works out who buys and who sells when `counterparty` accepts an offer.
pub fn resolve_parties(
    offer_owner: UserId,
    side: OfferSide,
    counterparty: UserId,
) -> Result<Parties, TradeError> {
    if offer_owner == counterparty {
        return Err(TradeError::SelfTrade {
            user_id: counterparty,
        });
    }

    Ok(match side {
        OfferSide::Buy => Parties {
            buyer: offer_owner,
            seller: counterparty,
        },
        OfferSide::Sell => Parties {
            buyer: counterparty,
            seller: offer_owner,
        },
    })
}

/// Checks a price per unit: positive, at most 4 decimal places, and small
/// enough to store.
pub fn validate_price(price_per_unit: Decimal) -> Result<Decimal, TradeError> {
    if price_per_unit <= Decimal::ZERO {
        return Err(TradeError::NonPositivePrice);
    }
    Ok(validate_valuation(price_per_unit)?)
}

/// Checks a new offer against the asset's transfer limits.
pub fn validate_offer(
    quantity: i64,
    price_per_unit: Decimal,
    limits: &UnitLimits,
) -> Result<(), TradeError> {
    validate_price(price_per_unit)?;
    if quantity <= 0 {
        return Err(crate::ownership::OwnershipError::NonPositiveQuantity { quantity }.into());
    }
    limits.check(quantity)?;
    Ok(())
}

/// Total consideration for `quantity` units at `price_per_unit`.
#[must_use]
pub fn trade_total(quantity: i64, price_per_unit: Decimal) -> Decimal {
    round_value(Decimal::from(quantity) * price_per_unit)
}

/// Outcome of an accepted offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeSummary {
    /// The accepted offer.
    pub offer_id: OfferId,
    /// Side of the accepted offer.
    pub offer_side: OfferSide,
    /// Asset traded.
    pub asset_id: AssetId,
    /// Receiving user.
    pub buyer_id: UserId,
    /// Giving user.
    pub seller_id: UserId,
    /// Units moved.
    pub units_traded: i64,
    /// Agreed price.
    pub price_per_unit: Decimal,
    /// `units_traded * price_per_unit`.
    pub total_value: Decimal,
    /// One transaction per consumed source fraction.
    pub transactions_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::ValuationError;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn user() -> UserId {
        UserId::from(Uuid::new_v4())
    }

    #[test]
    fn test_sell_offer_makes_counterparty_buyer() {
        let (owner, taker) = (user(), user());
        let parties = resolve_parties(owner, OfferSide::Sell, taker).unwrap();
        assert_eq!(parties.seller, owner);
        assert_eq!(parties.buyer, taker);
    }

    #[test]
    fn test_buy_offer_makes_counterparty_seller() {
        let (owner, taker) = (user(), user());
        let parties = resolve_parties(owner, OfferSide::Buy, taker).unwrap();
        assert_eq!(parties.buyer, owner);
        assert_eq!(parties.seller, taker);
    }

    #[test]
    fn test_cannot_accept_own_offer() {
        let owner = user();
        assert_eq!(
            resolve_parties(owner, OfferSide::Sell, owner),
            Err(TradeError::SelfTrade { user_id: owner })
        );
    }

    #[test]
    fn test_validate_offer() {
        let limits = UnitLimits {
            min_units: 5,
            max_units: 50,
        };
        assert!(validate_offer(10, dec!(12.5), &limits).is_ok());
        assert_eq!(
            validate_offer(10, dec!(0), &limits),
            Err(TradeError::NonPositivePrice)
        );
        assert!(matches!(
            validate_offer(4, dec!(1), &limits),
            Err(TradeError::Ownership(_))
        ));
    }

    #[test]
    fn test_price_must_fit_storage() {
        assert_eq!(validate_price(dec!(12.5000)), Ok(dec!(12.5)));
        assert!(matches!(
            validate_price(dec!(10000000000000000)),
            Err(TradeError::Amount(ValuationError::TooLarge { .. }))
        ));
        let err = validate_offer(10, dec!(1.23456), &UnitLimits::UNBOUNDED).unwrap_err();
        assert_eq!(err, TradeError::Amount(ValuationError::TooPrecise { max: 4 }));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_side_mapping() {
        assert_eq!(OfferSide::from_is_buyer(true), OfferSide::Buy);
        assert!(!OfferSide::Sell.is_buyer());
        assert_eq!(OfferSide::parse("SELL"), Some(OfferSide::Sell));
        assert_eq!(OfferSide::parse("swap"), None);
    }

    #[test]
    fn test_trade_total() {
        assert_eq!(trade_total(3, dec!(10.3333)), dec!(30.9999));
    }
}
