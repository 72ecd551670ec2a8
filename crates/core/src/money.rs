use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid amount {0:?}")]
    Invalid(String),
}

/// A signed monetary value kept at two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money::from_decimal(Decimal::new(cents, 2))
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        let rounded = decimal.round_dp(2);
        // -0.00 would otherwise render with a sign.
        if rounded.is_zero() {
            Money(Decimal::ZERO)
        } else {
            Money(rounded)
        }
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// `None` when the sum does not fit in a `Decimal`.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money::from_decimal)
    }

    /// Normalizes a free-form bank amount such as `"(1,234.56)"` or `"$1,000"`.
    ///
    /// A leading `(` marks the value negative. Every `(`, `)`, `$` and `,` is
    /// then stripped and the remainder parsed as a decimal number.
    pub fn parse(raw: &str) -> Result<Self, AmountError> {
        let trimmed = raw.trim();
        let negative = trimmed.starts_with('(');
        let digits: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '(' | ')' | '$' | ','))
            .collect();
        let digits = digits.trim();

        let value = Decimal::from_str(digits)
            .or_else(|_| Decimal::from_scientific(digits))
            .map_err(|_| AmountError::Invalid(raw.to_string()))?;

        Ok(Money::from_decimal(if negative { -value } else { value }))
    }
}

impl FromStr for Money {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Neg for Money {
    type Output = Self;
    fn neg(self) -> Self {
        Money::from_decimal(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accounting_parens_with_thousands() {
        assert_eq!(Money::parse("(1,234.56)").unwrap(), Money::from_cents(-123456));
    }

    #[test]
    fn parse_dollar_sign_and_thousands() {
        let m = Money::parse("$1,000").unwrap();
        assert_eq!(m, Money::from_cents(100000));
        assert_eq!(m.to_string(), "1000.00");
    }

    #[test]
    fn parse_plain_and_signed() {
        assert_eq!(Money::parse("49.99").unwrap(), Money::from_cents(4999));
        assert_eq!(Money::parse("-50").unwrap(), Money::from_cents(-5000));
        assert_eq!(Money::parse(" 12.5 ").unwrap().to_string(), "12.50");
    }

    #[test]
    fn parse_negative_inside_parens_flips_back() {
        // Sign comes from the parenthesis and from the number itself.
        assert_eq!(Money::parse("(-5.00)").unwrap(), Money::from_cents(500));
    }

    #[test]
    fn parse_scientific_notation() {
        assert_eq!(Money::parse("1e3").unwrap(), Money::from_cents(100000));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(Money::parse("abc"), Err(AmountError::Invalid(_))));
        assert!(Money::parse("").is_err());
        assert!(Money::parse("$").is_err());
    }

    #[test]
    fn display_always_two_decimals() {
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-120).to_string(), "-1.20");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn negating_zero_has_no_sign() {
        assert_eq!((-Money::zero()).to_string(), "0.00");
        assert_eq!(Money::parse("-0").unwrap().to_string(), "0.00");
    }

    #[test]
    fn negate_twice_restores_value() {
        let m = Money::parse("123.45").unwrap();
        assert_eq!(-(-m), m);
        assert!(!(-m).is_positive());
    }

    #[test]
    fn checked_add_sums_amounts() {
        let total = ["1.10", "2.20", "(0.30)"]
            .iter()
            .map(|s| Money::parse(s).unwrap())
            .try_fold(Money::zero(), Money::checked_add);
        assert_eq!(total, Some(Money::from_cents(300)));
    }

    #[test]
    fn checked_add_reports_overflow() {
        let max = Money::parse("79228162514264337593543950335").unwrap();
        assert_eq!(max.checked_add(max), None);
        assert_eq!((-max).checked_add(-max), None);
        assert_eq!(max.checked_add(-max), Some(Money::zero()));
    }
}
