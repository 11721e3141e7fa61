use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Signed expense amount represented as **integer minor units** (grosze,
/// cents, ...).
///
/// Amounts carry at most two fraction digits, so keeping them as integers
/// makes monthly sums exact. Addition is only offered checked.
///
/// # Examples
///
/// ```rust
/// use ledger::Amount;
///
/// let amount: Amount = "24.99".parse().unwrap();
/// assert_eq!(amount.minor(), 2499);
/// assert_eq!(amount.to_string(), "24.99");
/// assert!("12.345".parse::<Amount>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Creates a new amount from minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl TryFrom<f64> for Amount {
    type Error = LedgerError;

    /// Converts a major-unit float, rejecting more than two decimal digits.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(invalid("amount must be a finite number"));
        }
        let scaled = (value * 100.0).round();
        if (scaled / 100.0 - value).abs() > f64::EPSILON * value.abs().max(1.0) {
            return Err(invalid(
                "amount must have a precision of up to 2 decimal places",
            ));
        }
        if scaled.abs() >= i64::MAX as f64 {
            return Err(invalid("amount too large"));
        }
        Ok(Amount(scaled as i64))
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    /// Parses a decimal string into minor units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    /// At most 2 fractional digits are allowed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped.trim())
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped.trim())
        } else {
            (false, trimmed)
        };
        if rest.is_empty() {
            return Err(invalid("amount must not be empty"));
        }

        let rest = rest.replace(',', ".");
        let (major_str, fraction_str) = match rest.split_once('.') {
            Some((major, fraction)) => (major, fraction),
            None => (rest.as_str(), ""),
        };

        if major_str.is_empty()
            || !major_str.chars().all(|c| c.is_ascii_digit())
            || !fraction_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("amount must be a decimal number"));
        }

        let major: i64 = major_str
            .parse()
            .map_err(|_| invalid("amount too large"))?;
        let minor: i64 = match fraction_str.len() {
            0 => 0,
            1 => fraction_str.parse::<i64>().unwrap_or_default() * 10,
            2 => fraction_str.parse::<i64>().unwrap_or_default(),
            _ => {
                return Err(invalid(
                    "amount must have a precision of up to 2 decimal places",
                ));
            }
        };

        let total = major
            .checked_mul(100)
            .and_then(|v| v.checked_add(minor))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Amount(if negative { -total } else { total }))
    }
}

fn invalid(message: &str) -> LedgerError {
    LedgerError::Validation(format!("amount: {message}"))
}
