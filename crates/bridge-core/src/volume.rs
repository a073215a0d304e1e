//! Trade volumes and account money.

use std::fmt;

/// A volume expressed in base units of the traded currency.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume(i64);

impl Volume {
    pub const ZERO: Volume = Volume(0);

    pub const fn from_base(units: i64) -> Self {
        Volume(units)
    }

    pub const fn base_units(self) -> i64 {
        self.0
    }

    pub fn saturating_add(self, other: Volume) -> Volume {
        Volume(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Volume) -> Volume {
        Volume(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} base units", self.0)
    }
}

/// An amount of money in the minor units of `currency` (e.g. cents).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Money {
    pub minor_units: i64,
    /// ISO 4217 code as reported by the terminal, e.g. `"EUR"`.
    pub currency: String,
}

impl Money {
    pub fn new(minor_units: i64, currency: impl Into<String>) -> Self {
        Money {
            minor_units,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (minor units)", self.minor_units, self.currency)
    }
}
