//! Currency conversion arithmetic.
//!
//! CRITICAL: Rounding strategy for stored amounts:
//! - Always round to the money scale of the column
//! - Use banker's rounding (round half to even)
//! - Keep both original and converted amounts

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Converts an amount using the given rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
/// Returns `None` if the product overflows.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    amount
        .checked_mul(rate)
        .map(|converted| {
            converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_amount() {
        // 100 TRY * 0.03 = 3.00 USD
        let result = convert_amount(dec!(100), dec!(0.03), 2);
        assert_eq!(result, Some(dec!(3.00)));
    }

    #[test]
    fn test_convert_with_rounding() {
        // 100.50 USD * 470.123 = 47247.3615 KZT -> 47247.36
        let result = convert_amount(dec!(100.50), dec!(470.123), 2);
        assert_eq!(result, Some(dec!(47247.36)));
    }

    #[test]
    fn test_bankers_rounding() {
        // 0.125 rounds to 0.12, 0.135 rounds to 0.14
        assert_eq!(convert_amount(dec!(1), dec!(0.125), 2), Some(dec!(0.12)));
        assert_eq!(convert_amount(dec!(1), dec!(0.135), 2), Some(dec!(0.14)));
    }

    #[test]
    fn test_overflow_is_none() {
        assert_eq!(convert_amount(Decimal::MAX, dec!(2), 2), None);
    }
}
