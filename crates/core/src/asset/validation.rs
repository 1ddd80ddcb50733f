//! Submission and supply rules for assets.

use rust_decimal::Decimal;

use crate::asset::error::AssetError;
use crate::asset::types::AssetSubmission;
use crate::valuation::validate_valuation;

/// Upper bound on `total_fractions` for a single asset.
pub const MAX_TOTAL_FRACTIONS: i64 = 100_000;

/// Maximum asset name length, matching the column width.
pub const MAX_NAME_LEN: usize = 255;

/// Validates a new asset submission.
pub fn validate_submission(submission: &AssetSubmission) -> Result<(), AssetError> {
    let name_len = submission.name.trim().chars().count();
    if name_len == 0 || name_len > MAX_NAME_LEN {
        return Err(AssetError::InvalidName { max: MAX_NAME_LEN });
    }

    if submission.total_fractions <= 0 || submission.total_fractions > MAX_TOTAL_FRACTIONS {
        return Err(AssetError::TotalFractionsOutOfRange {
            total: submission.total_fractions,
            max: MAX_TOTAL_FRACTIONS,
        });
    }

    if submission.min_units < 1
        || submission.min_units > submission.max_units
        || submission.max_units > submission.total_fractions
    {
        return Err(AssetError::InvalidUnitLimits {
            min: submission.min_units,
            max: submission.max_units,
            total: submission.total_fractions,
        });
    }

    if submission.submitted_value <= Decimal::ZERO {
        return Err(AssetError::NonPositiveValue);
    }
    validate_valuation(submission.submitted_value)?;

    Ok(())
}

/// Validates a change to `available_fractions`.
///
/// Supply may not drop below what is already issued to owners, nor rise
/// above the asset total.
pub fn validate_supply_change(total: i64, issued: i64, requested: i64) -> Result<(), AssetError> {
    if requested < issued || requested > total || requested < 0 {
        return Err(AssetError::InvalidSupply {
            requested,
            issued,
            total,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn submission() -> AssetSubmission {
        AssetSubmission {
            name: "Harbour Loft".to_string(),
            description: Some("Two-bedroom loft".to_string()),
            total_fractions: 1000,
            min_units: 1,
            max_units: 500,
            submitted_value: dec!(250000.00),
        }
    }

    #[test]
    fn test_valid_submission() {
        assert!(validate_submission(&submission()).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut s = submission();
        s.name = "   ".to_string();
        assert_eq!(
            validate_submission(&s),
            Err(AssetError::InvalidName { max: MAX_NAME_LEN })
        );
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    #[case(MAX_TOTAL_FRACTIONS + 1)]
    fn test_total_out_of_range(#[case] total: i64) {
        let mut s = submission();
        s.total_fractions = total;
        s.max_units = 1;
        assert!(matches!(
            validate_submission(&s),
            Err(AssetError::TotalFractionsOutOfRange { .. })
        ));
    }

    #[rstest]
    #[case(0, 10)]
    #[case(20, 10)]
    #[case(1, 1001)]
    fn test_bad_unit_limits(#[case] min: i64, #[case] max: i64) {
        let mut s = submission();
        s.min_units = min;
        s.max_units = max;
        assert!(matches!(
            validate_submission(&s),
            Err(AssetError::InvalidUnitLimits { .. })
        ));
    }

    #[test]
    fn test_zero_value_rejected() {
        let mut s = submission();
        s.submitted_value = Decimal::ZERO;
        assert_eq!(validate_submission(&s), Err(AssetError::NonPositiveValue));
    }

    #[rstest]
    #[case(dec!(10000000000000000), "VALUE_TOO_LARGE")]
    #[case(dec!(100.00001), "VALUE_TOO_PRECISE")]
    fn test_unstorable_value_rejected(#[case] value: Decimal, #[case] code: &str) {
        let mut s = submission();
        s.submitted_value = value;
        let err = validate_submission(&s).unwrap_err();
        assert!(matches!(err, AssetError::Amount(_)));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), code);
    }

    #[rstest]
    #[case(1000, 400, 400, true)]
    #[case(1000, 400, 1000, true)]
    #[case(1000, 400, 399, false)]
    #[case(1000, 400, 1001, false)]
    #[case(1000, 0, 0, true)]
    fn test_supply_change(
        #[case] total: i64,
        #[case] issued: i64,
        #[case] requested: i64,
        #[case] ok: bool,
    ) {
        assert_eq!(validate_supply_change(total, issued, requested).is_ok(), ok);
    }
}
