//! Fixed-point prices.
//!
//! The terminal transmits prices as `f64` major-currency values. Inside
//! the host every price is an integer count of pipettes (1/100_000),
//! so comparisons and arithmetic are exact.

use std::fmt;
use std::ops::{Add, Sub};

/// Number of pipettes in one major price unit.
pub const PIPETTES_PER_UNIT: i64 = 100_000;

/// A price (or price distance) in pipettes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// Build a price from a raw pipette count.
    pub const fn from_pipettes(pipettes: i64) -> Self {
        Price(pipettes)
    }

    /// Convert a wire `f64` into pipettes, rounding to the nearest one.
    pub fn from_f64(value: f64) -> Self {
        Price((value * PIPETTES_PER_UNIT as f64).round() as i64)
    }

    pub const fn pipettes(self) -> i64 {
        self.0
    }

    /// The major-unit value sent back over the wire.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / PIPETTES_PER_UNIT as f64
    }

    pub fn abs(self) -> Self {
        Price(self.0.abs())
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Price;

    fn sub(self, rhs: Price) -> Price {
        Price(self.0 - rhs.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let unit = PIPETTES_PER_UNIT as u64;
        write!(f, "{}{}.{:05}", sign, abs / unit, abs % unit)
    }
}
