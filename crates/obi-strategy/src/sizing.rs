//! Fractional-risk position sizing.
//!
//! Converts a risk budget (a fraction of account equity) and a stop
//! distance into an order size. Degenerate inputs are signalled, never
//! divided through: callers skip the trade on `InvalidRiskInput`.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use obi_core::{Price, Size};

/// Sizing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SizingError {
    /// Inputs that cannot produce a meaningful size.
    #[error("degenerate sizing inputs: {0}")]
    InvalidRiskInput(String),
}

/// Compute an order size from equity, a risk fraction and a stop distance.
///
/// `risk_amount = account_balance × risk_per_trade`;
/// `size = risk_amount / |entry − stop|`, truncated to 2 decimal places.
///
/// # Errors
/// `InvalidRiskInput` when the balance is non-positive, the risk fraction
/// is outside (0, 1], or `entry == stop` (zero stop distance).
pub fn position_size(
    account_balance: Decimal,
    risk_per_trade: Decimal,
    entry_price: Price,
    stop_loss_price: Price,
) -> Result<Size, SizingError> {
    if account_balance <= Decimal::ZERO {
        return Err(SizingError::InvalidRiskInput(format!(
            "account balance must be positive, got {account_balance}"
        )));
    }
    if risk_per_trade <= Decimal::ZERO || risk_per_trade > Decimal::ONE {
        return Err(SizingError::InvalidRiskInput(format!(
            "risk fraction must be in (0, 1], got {risk_per_trade}"
        )));
    }

    let price_diff = (entry_price.inner() - stop_loss_price.inner()).abs();
    if price_diff.is_zero() {
        return Err(SizingError::InvalidRiskInput(
            "entry price equals stop price".to_string(),
        ));
    }

    let risk_amount = account_balance * risk_per_trade;
    let size = (risk_amount / price_diff).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    Ok(Size::new(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reference_scenario() {
        // balance=10000, risk=0.02, entry=100, stop=98
        // -> risk_amount=200, price_diff=2, size=100.00
        let size = position_size(
            dec!(10000),
            dec!(0.02),
            Price::new(dec!(100)),
            Price::new(dec!(98)),
        )
        .unwrap();
        assert_eq!(size.inner(), dec!(100.00));
    }

    #[test]
    fn test_entry_equals_stop_is_signalled() {
        let result = position_size(
            dec!(10000),
            dec!(0.02),
            Price::new(dec!(100)),
            Price::new(dec!(100)),
        );
        assert!(matches!(result, Err(SizingError::InvalidRiskInput(_))));
    }

    #[test]
    fn test_size_truncates_toward_zero() {
        // 10000 * 0.02 / 3 = 66.666... -> 66.66, never rounded up
        let size = position_size(
            dec!(10000),
            dec!(0.02),
            Price::new(dec!(103)),
            Price::new(dec!(100)),
        )
        .unwrap();
        assert_eq!(size.inner(), dec!(66.66));
    }

    #[test]
    fn test_stop_above_entry_uses_absolute_distance() {
        // Short: stop above entry; |100 - 102| = 2
        let size = position_size(
            dec!(10000),
            dec!(0.02),
            Price::new(dec!(100)),
            Price::new(dec!(102)),
        )
        .unwrap();
        assert_eq!(size.inner(), dec!(100.00));
    }

    #[test]
    fn test_non_positive_balance_rejected() {
        let result = position_size(
            dec!(0),
            dec!(0.02),
            Price::new(dec!(100)),
            Price::new(dec!(98)),
        );
        assert!(matches!(result, Err(SizingError::InvalidRiskInput(_))));
    }

    #[test]
    fn test_risk_fraction_bounds() {
        let entry = Price::new(dec!(100));
        let stop = Price::new(dec!(98));

        assert!(position_size(dec!(10000), dec!(0), entry, stop).is_err());
        assert!(position_size(dec!(10000), dec!(1.5), entry, stop).is_err());
        assert!(position_size(dec!(10000), dec!(1), entry, stop).is_ok());
    }
}
