use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed money amount represented as **integer cents**.
///
/// Every monetary value in the engine (transaction amounts, assigned amounts,
/// goal targets, balances) is a `MoneyCents`. There is no floating point
/// anywhere on the money path.
///
/// Sign convention follows the ledger:
/// - positive = inflow
/// - negative = outflow
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "$12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
/// assert_eq!("-10,5".parse::<MoneyCents>().unwrap().cents(), -1050);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value. Saturates at `i64::MAX` for `i64::MIN`.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Ord::min(self, other)
    }

    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Ord::max(self, other)
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }

    /// Checked addition that reports overflow as a validation error.
    pub fn try_add(self, rhs: MoneyCents) -> Result<MoneyCents, EngineError> {
        self.checked_add(rhs)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))
    }

    /// Checked subtraction that reports overflow as a validation error.
    pub fn try_sub(self, rhs: MoneyCents) -> Result<MoneyCents, EngineError> {
        self.checked_sub(rhs)
            .ok_or_else(|| EngineError::InvalidAmount("amount overflow".to_string()))
    }

    /// Sums an iterator of amounts, failing on overflow.
    pub fn try_sum<I>(items: I) -> Result<MoneyCents, EngineError>
    where
        I: IntoIterator<Item = MoneyCents>,
    {
        items
            .into_iter()
            .try_fold(MoneyCents::ZERO, MoneyCents::try_add)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}${dollars}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

/// Plain arithmetic panics on overflow in debug builds; ledger code paths use
/// [`MoneyCents::try_add`] instead.
macro_rules! money_binop {
    ($trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:tt) => {
        impl $trait for MoneyCents {
            type Output = MoneyCents;

            fn $method(self, rhs: MoneyCents) -> MoneyCents {
                MoneyCents(self.0 $op rhs.0)
            }
        }

        impl $assign_trait for MoneyCents {
            fn $assign_method(&mut self, rhs: MoneyCents) {
                *self = *self $op rhs;
            }
        }
    };
}

money_binop!(Add, add, AddAssign, add_assign, +);
money_binop!(Sub, sub, SubAssign, sub_assign, -);

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> MoneyCents {
        MoneyCents(-self.0)
    }
}

impl std::iter::Sum for MoneyCents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MoneyCents::ZERO, Add::add)
    }
}

fn parse_digits(digits: &str, input: &str) -> Result<i64, EngineError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidAmount(format!("invalid amount: {input}")));
    }
    digits
        .parse()
        .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses user input such as `12`, `-12.5`, `+$3,40` into cents.
    ///
    /// Either `.` or `,` separates the (at most two) decimals.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        let (negative, text) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let text = text.trim_start();
        let text = text.strip_prefix('$').unwrap_or(text);
        if text.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }

        let (whole, fraction) = match text.split_once(['.', ',']) {
            Some((whole, fraction)) => (whole, fraction),
            None => (text, ""),
        };
        let whole = parse_digits(whole, input)?;
        let fraction = match fraction.len() {
            0 => 0,
            1 => parse_digits(fraction, input)? * 10,
            2 => parse_digits(fraction, input)?,
            _ if fraction.contains(['.', ',']) => {
                return Err(EngineError::InvalidAmount(format!("invalid amount: {input}")));
            }
            _ => {
                return Err(EngineError::InvalidAmount(
                    "at most two decimals are allowed".to_string(),
                ));
            }
        };

        let magnitude = whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        Ok(MoneyCents(if negative { -magnitude } else { magnitude }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_dollars() {
        assert_eq!(MoneyCents::new(0).to_string(), "$0.00");
        assert_eq!(MoneyCents::new(1).to_string(), "$0.01");
        assert_eq!(MoneyCents::new(1050).to_string(), "$10.50");
        assert_eq!(MoneyCents::new(-1050).to_string(), "-$10.50");
    }

    #[test]
    fn parse_accepts_dot_comma_and_symbol() {
        assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("10,50".parse::<MoneyCents>().unwrap().cents(), 1050);
        assert_eq!("-0.01".parse::<MoneyCents>().unwrap().cents(), -1);
        assert_eq!("+$1.00".parse::<MoneyCents>().unwrap().cents(), 100);
        assert_eq!("-$60".parse::<MoneyCents>().unwrap().cents(), -6000);
    }

    #[test]
    fn parse_rejects_more_than_two_decimals() {
        assert!("12.345".parse::<MoneyCents>().is_err());
        assert!("0.001".parse::<MoneyCents>().is_err());
        assert!("1.2.3".parse::<MoneyCents>().is_err());
        assert!("".parse::<MoneyCents>().is_err());
    }

    #[test]
    fn checked_sum_detects_overflow() {
        let items = [MoneyCents::new(i64::MAX), MoneyCents::new(1)];
        assert!(MoneyCents::try_sum(items).is_err());
        let items = [MoneyCents::new(-60_00), MoneyCents::new(20_00)];
        assert_eq!(MoneyCents::try_sum(items).unwrap(), MoneyCents::new(-40_00));
    }

    #[test]
    fn checked_sub_detects_overflow() {
        assert!(MoneyCents::new(1_00).try_sub(MoneyCents::new(i64::MIN)).is_err());
        assert_eq!(
            MoneyCents::new(1_00).try_sub(MoneyCents::new(40)).unwrap(),
            MoneyCents::new(60)
        );
    }

    #[test]
    fn min_max_abs() {
        let a = MoneyCents::new(-30);
        let b = MoneyCents::new(20);
        assert_eq!(a.abs(), MoneyCents::new(30));
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
    }
}
