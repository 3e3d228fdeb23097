use crate::types::Money;
use rust_decimal::Decimal;

/// Result of converting an amount at a rate and adding the spread.
///
/// `credit = converted + converted * spread`, computed at full precision and
/// rounded to cents once. The spread is not credited anywhere.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Conversion {
    pub rate: Decimal,
    pub converted: Money,
    pub spread_amount: Money,
    pub credit: Money
}

impl Conversion {
    /// Returns `None` on decimal overflow.
    pub fn compute(amount: Money, rate: Decimal, spread: Decimal) -> Option<Self> {
        let converted = amount.amount().checked_mul(rate)?;
        let spread_amount = converted.checked_mul(spread)?;
        let credit = converted.checked_add(spread_amount)?;

        Some(Self {
            rate,
            converted: Money::rounded(converted),
            spread_amount: Money::rounded(spread_amount),
            credit: Money::rounded(credit)
        })
    }
}
