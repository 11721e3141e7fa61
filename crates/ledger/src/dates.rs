//! Calendar helpers and the clock records are stamped with.

use chrono::{Datelike, Months, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;

use crate::{LedgerError, ResultLedger};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Warsaw;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> ResultLedger<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| LedgerError::Validation(format!("date: must be a valid date, got '{value}'")))
}

/// Signed number of days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

pub(crate) fn next_day(date: NaiveDate) -> ResultLedger<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| LedgerError::Range(format!("no day after {date}")))
}

/// First day of the month `date` falls in, and first day of the following month.
pub(crate) fn month_bounds(date: NaiveDate) -> ResultLedger<(NaiveDate, NaiveDate)> {
    let first = date
        .with_day(1)
        .ok_or_else(|| LedgerError::Range(format!("no first day for {date}")))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| LedgerError::Range(format!("no month after {date}")))?;
    Ok((first, next))
}

/// `YYYY-MM` label of the month `date` falls in.
pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Source of "today" and creation timestamps, pinned to one timezone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clock {
    tz: Tz,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl Clock {
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a clock from an IANA timezone name (e.g. `Europe/Warsaw`).
    pub fn from_name(name: &str) -> ResultLedger<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| LedgerError::Validation(format!("timezone: unknown '{name}'")))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Today's date in the clock timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    /// RFC 3339 timestamp with nanoseconds and the local offset.
    pub fn timestamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.tz)
            .to_rfc3339_opts(SecondsFormat::Nanos, false)
    }

    /// Date `months` calendar months before today, clamped to month end.
    pub fn months_ago(&self, months: u32) -> ResultLedger<NaiveDate> {
        let today = self.today();
        today
            .checked_sub_months(Months::new(months))
            .ok_or_else(|| LedgerError::Range(format!("{months} months before {today}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(
            parse_date("2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert!(matches!(
            parse_date("15/01/2024"),
            Err(LedgerError::Validation(_))
        ));
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn days_between_is_signed() {
        let a = parse_date("2023-01-01").unwrap();
        let b = parse_date("2024-01-02").unwrap();
        assert_eq!(days_between(a, b), 366);
        assert_eq!(days_between(b, a), -366);
        assert_eq!(days_between(a, a), 0);
    }

    #[test]
    fn month_bounds_cover_leap_february() {
        let (first, next) = month_bounds(parse_date("2024-02-29").unwrap()).unwrap();
        assert_eq!(first, parse_date("2024-02-01").unwrap());
        assert_eq!(next, parse_date("2024-03-01").unwrap());
    }

    #[test]
    fn timestamps_are_nanosecond_precise() {
        let clock = Clock::default();
        let stamp = clock.timestamp();
        let digits = stamp
            .split('.')
            .nth(1)
            .unwrap()
            .chars()
            .take_while(char::is_ascii_digit)
            .count();
        assert_eq!(digits, 9);
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        assert!(Clock::from_name("Europe/Warsaw").is_ok());
        assert!(Clock::from_name("Mars/Olympus").is_err());
    }
}
