//! See [`YearMonth`]

use chrono::prelude::*;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The `YYYY-MM` text could not be read as a month.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a month; expected `YYYY-MM`")]
pub struct ParseMonthError(pub String);

/// A calendar month, the unit the admin grid is built for.
///
/// Internally the first day of the month, so every [`YearMonth`] is a real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    /// [`None`] if `month` is not 1-12 or the year is out of range.
    #[inline]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month `date` falls in.
    #[inline]
    pub fn of(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// The month containing today's local date.
    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    /// Calendar year.
    #[inline]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Month number, 1-12.
    #[inline]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// Whether `date` falls in this month.
    #[inline]
    pub fn contains(self, date: NaiveDate) -> bool {
        Self::of(date) == self
    }

    /// Every date of the month in ascending order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.0.iter_days().take_while(move |date| self.contains(*date))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year = year.parse().map_err(|_| err())?;
        let month = month.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}
