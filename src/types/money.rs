use crate::types::errors::TypeError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const DECIMAL_PLACES: u32 = 2;

/// A fixed-point amount with exactly two fractional digits.
///
/// Construction either rejects values with more precision (`new`, `from_str`)
/// or rounds them half-to-even (`rounded`), so every `Money` in the ledger is
/// already at cent precision.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Wraps a decimal that must already fit in two decimal places.
    pub fn new(value: Decimal) -> Result<Self, TypeError> {
        if value.normalize().scale() > DECIMAL_PLACES {
            return Err(TypeError::TooManyDecimalPlaces(value.to_string()));
        }

        Ok(Money(value))
    }

    /// Rounds an arbitrary precision decimal (e.g. a converted amount) to cents.
    pub fn rounded(value: Decimal) -> Self {
        Money(value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl Display for Money {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = TypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err(TypeError::InvalidMoney("Value is an empty string".to_string()));
        }

        let decimal = Decimal::from_str(value).map_err(|error| {
            TypeError::InvalidMoney(format!("[{value}] is not a decimal: {error}"))
        })?;

        Money::new(decimal)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        //NOTE: Read the raw text so formats that guess number types (csv) never round through f64
        deserializer.deserialize_str(MoneyVisitor)
    }
}

struct MoneyVisitor;

impl<'de> de::Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("a decimal string with at most two decimal places")
    }

    fn visit_str<E>(self, value: &str) -> Result<Money, E>
    where
        E: de::Error,
    {
        Money::from_str(value).map_err(E::custom)
    }
}
