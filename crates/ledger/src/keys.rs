//! Key scheme shared by every backend.
//!
//! A record lives under a partition key identifying its vault and a sort key
//! ordering it inside the partition:
//!
//! - expenses: `expense::<vault>` / `<YYYY-MM-DD>::<createdAt>`
//! - categories: `expensecategory::<vault>` / `<name>`
//!
//! `createdAt` carries sub-second precision, so two expenses only collide when
//! they were stamped in the same instant for the same date. Such a collision is
//! not resolved here: it surfaces as a rejected create.

use chrono::NaiveDate;

use crate::{dates::DATE_FORMAT, error::BackendFault};

pub const SEPARATOR: &str = "::";
pub const EXPENSE_PREFIX: &str = "expense";
pub const CATEGORY_PREFIX: &str = "expensecategory";

/// Partition key for the expenses of `vault_id`.
pub fn expense_partition(vault_id: &str) -> Result<String, BackendFault> {
    partition_key(EXPENSE_PREFIX, vault_id)
}

/// Partition key for the categories of `vault_id`.
pub fn category_partition(vault_id: &str) -> Result<String, BackendFault> {
    partition_key(CATEGORY_PREFIX, vault_id)
}

fn partition_key(prefix: &str, vault_id: &str) -> Result<String, BackendFault> {
    if vault_id.trim().is_empty() {
        return Err(BackendFault::InvalidKey(format!(
            "empty vault id for {prefix} partition"
        )));
    }
    Ok(format!("{prefix}{SEPARATOR}{vault_id}"))
}

/// Sort key of an expense: business date plus creation timestamp.
pub fn sort_key(date: NaiveDate, created_at: &str) -> Result<String, BackendFault> {
    if created_at.is_empty() {
        return Err(BackendFault::InvalidKey(format!(
            "missing creation timestamp for date {date}"
        )));
    }
    Ok(format!(
        "{}{SEPARATOR}{created_at}",
        date.format(DATE_FORMAT)
    ))
}

/// Lower bound of every sort key stamped on `date`.
pub(crate) fn date_prefix(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, DATE_FORMAT).unwrap()
    }

    #[test]
    fn partition_keys_are_prefixed_per_entity() {
        assert_eq!(expense_partition("v1").unwrap(), "expense::v1");
        assert_eq!(category_partition("v1").unwrap(), "expensecategory::v1");
    }

    #[test]
    fn empty_vault_is_an_invalid_key() {
        assert!(matches!(
            expense_partition("  "),
            Err(BackendFault::InvalidKey(_))
        ));
    }

    #[test]
    fn sort_key_joins_date_and_timestamp() {
        let key = sort_key(date("2024-01-15"), "2024-01-15T10:00:00.000000001+01:00").unwrap();
        assert_eq!(key, "2024-01-15::2024-01-15T10:00:00.000000001+01:00");
    }

    #[test]
    fn sort_key_distinguishes_sub_second_timestamps() {
        let a = sort_key(date("2024-01-15"), "2024-01-15T10:00:00.000000001+01:00").unwrap();
        let b = sort_key(date("2024-01-15"), "2024-01-15T10:00:00.000000002+01:00").unwrap();
        let c = sort_key(date("2024-01-16"), "2024-01-15T10:00:00.000000001+01:00").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn missing_timestamp_is_rejected() {
        assert!(sort_key(date("2024-01-15"), "").is_err());
    }

    #[test]
    fn date_prefix_bounds_the_keys_of_that_day() {
        let key = sort_key(date("2024-01-18"), "2024-01-18T23:59:59.999999999+01:00").unwrap();
        assert!(date_prefix(date("2024-01-18")).as_str() <= key.as_str());
        assert!(key.as_str() < date_prefix(date("2024-01-19")).as_str());
    }
}
