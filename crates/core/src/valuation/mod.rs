//! Fraction value arithmetic.
//!
//! The database recomputes `fractions.fraction_value` with a trigger using
//! `ROUND(latest_value / available_fractions, 4)`. [`fraction_value`] is the
//! same formula, used for previews and to check the trigger in tests.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Decimal places kept for stored values, matching `NUMERIC(19, 4)`.
pub const VALUE_SCALE: u32 = 4;

/// Decimal places for percentages shown to clients.
pub const PERCENT_SCALE: u32 = 2;

/// Largest amount a `NUMERIC(19, 4)` column holds.
#[must_use]
pub fn max_stored_value() -> Decimal {
    Decimal::from_i128_with_scale(9_999_999_999_999_999_999, VALUE_SCALE)
}

/// Errors for valuation input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValuationError {
    /// Value must be positive.
    #[error("Valuation must be greater than zero")]
    NonPositive,

    /// Value carries more precision than the column stores.
    #[error("Value may have at most {max} decimal places")]
    TooPrecise {
        /// Allowed scale.
        max: u32,
    },

    /// Value does not fit the column.
    #[error("Value may not exceed {max}")]
    TooLarge {
        /// Largest storable value.
        max: Decimal,
    },
}

impl ValuationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositive => "NON_POSITIVE_VALUATION",
            Self::TooPrecise { .. } => "VALUE_TOO_PRECISE",
            Self::TooLarge { .. } => "VALUE_TOO_LARGE",
        }
    }
}

/// Rounds to the stored scale the way PostgreSQL rounds numerics.
#[must_use]
pub fn round_value(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(VALUE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Value of one fraction: latest asset value divided by available supply.
///
/// Zero when the asset has no valuation yet or no available supply.
#[must_use]
pub fn fraction_value(latest_value: Option<Decimal>, available_fractions: i64) -> Decimal {
    match latest_value {
        Some(value) if available_fractions > 0 => {
            round_value(value / Decimal::from(available_fractions))
        }
        _ => Decimal::ZERO,
    }
}

/// Checks a positive money amount before it is stored: valuations,
/// submitted values and prices.
pub fn validate_valuation(value: Decimal) -> Result<Decimal, ValuationError> {
    if value <= Decimal::ZERO {
        return Err(ValuationError::NonPositive);
    }
    let normalized = value.normalize();
    if normalized.scale() > VALUE_SCALE {
        return Err(ValuationError::TooPrecise { max: VALUE_SCALE });
    }
    let max = max_stored_value();
    if normalized > max {
        return Err(ValuationError::TooLarge { max });
    }
    Ok(normalized)
}

/// Value of `quantity` fractions at `fraction_value` each.
#[must_use]
pub fn estimated_value(quantity: i64, fraction_value: Decimal) -> Decimal {
    round_value(Decimal::from(quantity) * fraction_value)
}

/// Percentage change from `previous` to `current`, or `None` from zero.
#[must_use]
pub fn change_percent(previous: Decimal, current: Decimal) -> Option<Decimal> {
    if previous.is_zero() {
        return None;
    }
    Some(
        ((current - previous) / previous * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero),
    )
}

/// Share of `available_fractions` represented by `quantity`, in percent.
#[must_use]
pub fn ownership_percent(quantity: i64, available_fractions: i64) -> Decimal {
    if available_fractions <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(quantity) / Decimal::from(available_fractions) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(PERCENT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(Some(dec!(1000)), 100, dec!(10))]
    #[case(Some(dec!(1000)), 3, dec!(333.3333))]
    #[case(Some(dec!(2)), 3, dec!(0.6667))]
    #[case(Some(dec!(0.00005)), 1, dec!(0.0001))]
    #[case(None, 100, dec!(0))]
    #[case(Some(dec!(1000)), 0, dec!(0))]
    fn test_fraction_value(
        #[case] latest: Option<Decimal>,
        #[case] available: i64,
        #[case] expected: Decimal,
    ) {
        assert_eq!(fraction_value(latest, available), expected);
    }

    #[test]
    fn test_validate_valuation() {
        assert_eq!(validate_valuation(dec!(125000.50)), Ok(dec!(125000.5)));
        assert_eq!(validate_valuation(dec!(0)), Err(ValuationError::NonPositive));
        assert_eq!(validate_valuation(dec!(-1)), Err(ValuationError::NonPositive));
        assert_eq!(
            validate_valuation(dec!(1.00001)),
            Err(ValuationError::TooPrecise { max: 4 })
        );
        // Trailing zeros do not count against the scale.
        assert!(validate_valuation(dec!(1.100000)).is_ok());
    }

    #[test]
    fn test_validate_valuation_range() {
        let max = max_stored_value();
        assert_eq!(max, dec!(999999999999999.9999));
        assert_eq!(validate_valuation(max), Ok(max));
        assert_eq!(
            validate_valuation(dec!(10000000000000000)),
            Err(ValuationError::TooLarge { max })
        );
        assert_eq!(
            ValuationError::TooLarge { max }.error_code(),
            "VALUE_TOO_LARGE"
        );
    }

    #[test]
    fn test_estimated_value() {
        assert_eq!(estimated_value(25, dec!(10.5)), dec!(262.5));
        assert_eq!(estimated_value(0, dec!(10.5)), dec!(0));
    }

    #[test]
    fn test_change_percent() {
        assert_eq!(change_percent(dec!(100), dec!(110)), Some(dec!(10)));
        assert_eq!(change_percent(dec!(300), dec!(200)), Some(dec!(-33.33)));
        assert_eq!(change_percent(dec!(0), dec!(200)), None);
    }

    #[test]
    fn test_ownership_percent() {
        assert_eq!(ownership_percent(1, 3), dec!(33.33));
        assert_eq!(ownership_percent(50, 100), dec!(50));
        assert_eq!(ownership_percent(5, 0), dec!(0));
    }
}
