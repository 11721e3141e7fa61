//! Bounded date windows for range queries.
//!
//! A window is inclusive on both ends and spans at most
//! [`MAX_QUERY_RANGE_DAYS`] days. Windows are validated before any backend
//! is contacted.

use chrono::NaiveDate;

use crate::{
    LedgerError, ResultLedger,
    dates::{self, days_between},
    keys,
    table::SortKeyRange,
};

pub const MIN_QUERY_RANGE_DAYS: i64 = 0;
pub const MAX_QUERY_RANGE_DAYS: i64 = 365;

/// Inclusive `[from, to]` window of business dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> ResultLedger<Self> {
        let days = days_between(from, to);
        if !(MIN_QUERY_RANGE_DAYS..=MAX_QUERY_RANGE_DAYS).contains(&days) {
            return Err(LedgerError::Range(format!(
                "invalid difference between 'from' and 'to' date; got={days}, max={MAX_QUERY_RANGE_DAYS}, min={MIN_QUERY_RANGE_DAYS}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Window reaching `months` calendar months back from `today`.
    pub fn months_back(clock: &dates::Clock, months: u32) -> ResultLedger<Self> {
        Self::new(clock.months_ago(months)?, clock.today())
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    /// Whether `date` lies inside the window, by day arithmetic.
    pub fn contains(&self, date: NaiveDate) -> bool {
        days_between(self.from, date) >= 0 && days_between(date, self.to) >= 0
    }

    /// Half-open sort-key interval `[from, to + 1 day)` covering every
    /// expense booked inside the window.
    pub(crate) fn sort_key_range(&self) -> ResultLedger<SortKeyRange> {
        Ok(SortKeyRange::between(
            keys::date_prefix(self.from),
            keys::date_prefix(dates::next_day(self.to)?),
        ))
    }
}

/// Optional category allow-list; an empty list lets everything through.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CategoryFilter<'a>(&'a [String]);

impl<'a> CategoryFilter<'a> {
    pub(crate) fn new(categories: &'a [String]) -> Self {
        Self(categories)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn categories(&self) -> &'a [String] {
        self.0
    }

    pub(crate) fn matches(&self, category: &str) -> bool {
        self.0.is_empty() || self.0.iter().any(|allowed| allowed == category)
    }
}
