//! Calendar month used as the budgeting period.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// A validated `(year, month)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BudgetMonth {
    year: i32,
    month: u32,
}

impl BudgetMonth {
    pub fn new(year: i32, month: u32) -> ResultEngine<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidMonth(format!(
                "month must be in 1..=12, got {month}"
            )));
        }
        if !(1900..=9999).contains(&year) {
            return Err(EngineError::InvalidMonth(format!(
                "year must be in 1900..=9999, got {year}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The following month, rolling over the year.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(self) -> ResultEngine<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| EngineError::InvalidMonth(self.to_string()))
    }

    /// Half-open date range `[first_day, next.first_day)`.
    pub fn date_range(self) -> ResultEngine<(NaiveDate, NaiveDate)> {
        Ok((self.first_day()?, self.next().first_day()?))
    }

    /// Number of months from `self` to `other`, inclusive of both ends.
    ///
    /// Returns 0 when `other` is before `self`.
    #[must_use]
    pub fn months_until(self, other: BudgetMonth) -> i64 {
        let from = i64::from(self.year) * 12 + i64::from(self.month);
        let to = i64::from(other.year) * 12 + i64::from(other.month);
        (to - from + 1).max(0)
    }
}

impl fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Integer percentage `numerator / denominator`, clamped to `[0, 100]`.
///
/// A non-positive denominator yields 0.
#[must_use]
pub fn percent(numerator: MoneyCents, denominator: MoneyCents) -> u8 {
    if !denominator.is_positive() || !numerator.is_positive() {
        return 0;
    }
    let pct = i128::from(numerator.cents()) * 100 / i128::from(denominator.cents());
    pct.clamp(0, 100) as u8
}
