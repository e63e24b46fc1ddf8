//! Precision-safe decimal types and the fixed-point wire codec.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Prices and sizes cross
//! the wire as integers scaled by 10^6; the conversion happens here and only
//! here, so signed payloads never contain floating-point representations.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use crate::error::CoreError;

/// Decimal places carried by the integer wire encoding.
pub const WIRE_PRICE_SCALE: u32 = 6;

/// Scale factor for the wire encoding (10^6).
const WIRE_FACTOR: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Encode a decimal as a scaled integer for a signed payload.
///
/// Values are rounded to 6 decimal places first; anything that does not fit
/// an `i64` after scaling is rejected.
fn to_fixed(value: Decimal) -> Result<i64, CoreError> {
    let scaled = value
        .checked_mul(WIRE_FACTOR)
        .ok_or_else(|| CoreError::FixedPointRange(value.to_string()))?
        .round();
    scaled
        .to_i64()
        .ok_or_else(|| CoreError::FixedPointRange(value.to_string()))
}

/// Decode a scaled integer from the wire back into a decimal.
fn from_fixed(raw: i64) -> Decimal {
    Decimal::new(raw, WIRE_PRICE_SCALE)
}

/// Price with exact decimal precision.
///
/// Wraps `Decimal` to prevent mixing prices with sizes in calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Midpoint between this price and another.
    #[inline]
    pub fn midpoint(&self, other: Price) -> Price {
        Self((self.0 + other.0) / Decimal::TWO)
    }

    /// Encode for a signed payload (×10^6 integer).
    pub fn to_wire(&self) -> Result<i64, CoreError> {
        to_fixed(self.0)
    }

    /// Decode from the wire encoding.
    pub fn from_wire(raw: i64) -> Self {
        Self(from_fixed(raw))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Price {
    type Output = Self;

    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Size/quantity with exact decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub Decimal);

impl Size {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Encode for a signed payload (×10^6 integer).
    pub fn to_wire(&self) -> Result<i64, CoreError> {
        to_fixed(self.0)
    }

    /// Decode from the wire encoding.
    pub fn from_wire(raw: i64) -> Self {
        Self(from_fixed(raw))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Size {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Size {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Size {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Size {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_wire_round_trip() {
        let price = Price::new(dec!(2451.375219));
        let raw = price.to_wire().unwrap();
        assert_eq!(raw, 2_451_375_219);
        assert_eq!(Price::from_wire(raw), price);
    }

    #[test]
    fn test_wire_rounds_beyond_six_decimals() {
        // 7th decimal place is rounded away before scaling
        let price = Price::new(dec!(0.12345649));
        let raw = price.to_wire().unwrap();
        assert_eq!(raw, 123_456);
        assert_eq!(Price::from_wire(raw).inner(), dec!(0.123456));
    }

    #[test]
    fn test_wire_zero_and_whole_numbers() {
        assert_eq!(Price::ZERO.to_wire().unwrap(), 0);
        assert_eq!(Price::new(dec!(100)).to_wire().unwrap(), 100_000_000);
        assert_eq!(Price::from_wire(100_000_000).inner(), dec!(100.000000));
    }

    #[test]
    fn test_wire_out_of_range() {
        let huge = Price::new(Decimal::MAX);
        assert!(matches!(
            huge.to_wire(),
            Err(CoreError::FixedPointRange(_))
        ));
    }

    #[test]
    fn test_size_wire_round_trip() {
        let size = Size::new(dec!(100.00));
        let raw = size.to_wire().unwrap();
        assert_eq!(raw, 100_000_000);
        assert_eq!(Size::from_wire(raw), size);
    }

    #[test]
    fn test_midpoint() {
        let bid = Price::new(dec!(100));
        let ask = Price::new(dec!(102));
        assert_eq!(bid.midpoint(ask).inner(), dec!(101));
    }

    #[test]
    fn test_price_arithmetic() {
        let spread = Price::new(dec!(101)) - Price::new(dec!(100));
        assert_eq!(spread.inner(), dec!(1));

        let bumped = Price::new(dec!(100)) * dec!(1.02);
        assert_eq!(bumped.inner(), dec!(102.00));
    }
}
