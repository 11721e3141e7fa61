//! Expense records and the monthly sums derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    Amount, Currency, ResultLedger,
    dates::{self, Clock},
    keys,
    validation::{self, NAME_MAX_LENGTH, NAME_MIN_LENGTH, Validator},
};

/// A single expense of a vault.
///
/// `sort_key` is derived from `date` and `created_at`; `created_at` and
/// `created_by` never change once the expense has been persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub sort_key: String,
    pub name: String,
    pub date: NaiveDate,
    pub category: String,
    pub amount: Amount,
    pub currency: Currency,
    pub created_at: String,
    pub created_by: String,
}

impl Expense {
    /// Build a new expense stamped with the default clock.
    pub fn new(
        name: &str,
        date: &str,
        category: &str,
        amount: Amount,
        currency: Currency,
    ) -> ResultLedger<Self> {
        Self::with_clock(&Clock::default(), name, date, category, amount, currency)
    }

    /// Build a new expense stamped with `clock`.
    pub fn with_clock(
        clock: &Clock,
        name: &str,
        date: &str,
        category: &str,
        amount: Amount,
        currency: Currency,
    ) -> ResultLedger<Self> {
        let created_at = clock.timestamp();
        let date = validate(name, date, category, amount)?;
        Ok(Self {
            sort_key: keys::sort_key(date, &created_at)?,
            name: name.trim().to_string(),
            date,
            category: category.trim().to_string(),
            amount,
            currency,
            created_at,
            created_by: String::new(),
        })
    }

    /// Build the new state of the expense stored under `sort_key`.
    ///
    /// The creation timestamp and creator are left empty: the store recovers
    /// them from the persisted record.
    pub fn for_update(
        sort_key: &str,
        name: &str,
        date: &str,
        category: &str,
        amount: Amount,
        currency: Currency,
    ) -> ResultLedger<Self> {
        let date = validate(name, date, category, amount)?;
        Ok(Self {
            sort_key: sort_key.to_string(),
            name: name.trim().to_string(),
            date,
            category: category.trim().to_string(),
            amount,
            currency,
            created_at: String::new(),
            created_by: String::new(),
        })
    }

    /// `YYYY-MM` month the expense is booked in.
    pub fn month(&self) -> String {
        dates::month_of(self.date)
    }
}

fn validate(name: &str, date: &str, category: &str, amount: Amount) -> ResultLedger<NaiveDate> {
    let mut validator = Validator::default();
    validator.check(
        validation::length_between(name, NAME_MIN_LENGTH, NAME_MAX_LENGTH),
        "name",
        validation::length_message(NAME_MIN_LENGTH, NAME_MAX_LENGTH),
    );
    validator.check(
        validation::length_between(
            category,
            crate::category::NAME_MIN_LENGTH,
            crate::category::NAME_MAX_LENGTH,
        ),
        "category",
        validation::length_message(
            crate::category::NAME_MIN_LENGTH,
            crate::category::NAME_MAX_LENGTH,
        ),
    );
    validator.check(!amount.is_zero(), "amount", "must be non-zero");
    let parsed = validator.accept(dates::parse_date(date));
    validator.finish()?;
    parsed.ok_or_else(|| crate::LedgerError::Validation(format!("date: invalid '{date}'")))
}

/// Sum of a vault's expenses for one category in one month.
///
/// Derived on request, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySum {
    /// `YYYY-MM`
    pub month: String,
    pub category: String,
    pub sum: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LedgerError;

    fn amount(value: &str) -> Amount {
        value.parse().unwrap()
    }

    #[test]
    fn new_expense_derives_sort_key_from_date_and_timestamp() {
        let expense = Expense::new(
            "  Groceries ",
            "2024-01-15",
            " Food",
            amount("24.99"),
            Currency::Pln,
        )
        .unwrap();

        assert_eq!(expense.name, "Groceries");
        assert_eq!(expense.category, "Food");
        assert_eq!(expense.month(), "2024-01");
        assert_eq!(
            expense.sort_key,
            format!("2024-01-15::{}", expense.created_at)
        );
        assert!(expense.created_by.is_empty());
    }

    #[test]
    fn invalid_fields_are_reported_together() {
        let err = Expense::new("a", "2024-13-01", "b", Amount::ZERO, Currency::Eur).unwrap_err();
        let LedgerError::Validation(message) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(message.contains("name:"));
        assert!(message.contains("category:"));
        assert!(message.contains("amount: must be non-zero"));
        assert!(message.contains("date:"));
    }

    #[test]
    fn name_length_is_bounded() {
        let long = "x".repeat(51);
        assert!(Expense::new(&long, "2024-01-15", "Food", amount("1"), Currency::Pln).is_err());
        let max = "x".repeat(50);
        assert!(Expense::new(&max, "2024-01-15", "Food", amount("1"), Currency::Pln).is_ok());
    }

    #[test]
    fn update_payload_keeps_sort_key_and_defers_immutable_fields() {
        let expense = Expense::for_update(
            "2024-01-15::stamp",
            "Rent",
            "2024-01-20",
            "Home",
            amount("-100"),
            Currency::Eur,
        )
        .unwrap();
        assert_eq!(expense.sort_key, "2024-01-15::stamp");
        assert!(expense.created_at.is_empty());
        assert_eq!(expense.amount.minor(), -10_000);
    }
}
