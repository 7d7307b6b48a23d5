//! SPY/USD conversion.
//!
//! All wallet arithmetic is carried out in SPY, the internal integer unit.
//! USD is a derived display value at a fixed ratio of 1 USD = 110 SPY,
//! rounded half-up (midpoint away from zero) to 2 decimal places. The
//! display value is never an arithmetic operand for balance mutation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fixed conversion ratio: 1 USD = 110 SPY.
pub const SPY_PER_USD: i64 = 110;

/// Derive the USD display value for an SPY amount.
///
/// Pure and deterministic: re-deriving from the same SPY amount always
/// reproduces the same value.
pub fn spy_to_usd(amount_spy: i64) -> Decimal {
    (Decimal::from(amount_spy) / Decimal::from(SPY_PER_USD))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a USD entry to whole SPY, rounding half-up.
///
/// Returns `None` if the value does not fit in an i64.
pub fn usd_to_spy(amount_usd: Decimal) -> Option<i64> {
    (amount_usd * Decimal::from(SPY_PER_USD))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spy_to_usd_exact() {
        assert_eq!(spy_to_usd(5500), Decimal::new(5000, 2)); // 50.00
        assert_eq!(spy_to_usd(110), Decimal::new(100, 2)); // 1.00
        assert_eq!(spy_to_usd(0), Decimal::new(0, 2));
    }

    #[test]
    fn test_spy_to_usd_rounds_half_up() {
        // 1 SPY = 0.00909... USD -> 0.01
        assert_eq!(spy_to_usd(1), Decimal::new(1, 2));
        // 55 SPY = 0.5 USD exactly
        assert_eq!(spy_to_usd(55), Decimal::new(50, 2));
        // 165 SPY = 1.5 USD exactly
        assert_eq!(spy_to_usd(165), Decimal::new(150, 2));
    }

    #[test]
    fn test_spy_to_usd_deterministic() {
        for amount in [1, 7, 55, 110, 999, 5500, 1_234_567] {
            assert_eq!(spy_to_usd(amount), spy_to_usd(amount));
        }
    }

    #[test]
    fn test_usd_to_spy() {
        assert_eq!(usd_to_spy(Decimal::new(5000, 2)), Some(5500)); // 50.00 USD
        assert_eq!(usd_to_spy(Decimal::new(100, 2)), Some(110)); // 1.00 USD
        // 0.005 USD = 0.55 SPY -> rounds up to 1
        assert_eq!(usd_to_spy(Decimal::new(5, 3)), Some(1));
    }

    #[test]
    fn test_round_trip_on_whole_usd() {
        for usd in 1..50 {
            let spy = usd_to_spy(Decimal::from(usd)).unwrap();
            assert_eq!(spy_to_usd(spy), Decimal::from(usd).round_dp(2));
        }
    }
}
