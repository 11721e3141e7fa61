//! Field checks used by the record constructors.
//!
//! Failures are collected per field and reported together as a single
//! [`LedgerError::Validation`].

use crate::{LedgerError, ResultLedger};

pub const NAME_MIN_LENGTH: usize = 2;
pub const NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Default)]
pub(crate) struct Validator {
    messages: Vec<String>,
}

impl Validator {
    pub(crate) fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.messages.push(format!("{field}: {}", message.into()));
        }
    }

    /// Record the error of a fallible field conversion and keep its value.
    pub(crate) fn accept<T>(&mut self, result: ResultLedger<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(LedgerError::Validation(message)) => {
                self.messages.push(message);
                None
            }
            Err(other) => {
                self.messages.push(other.to_string());
                None
            }
        }
    }

    pub(crate) fn finish(self) -> ResultLedger<()> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Validation(self.messages.join("; ")))
        }
    }
}

/// Whether the trimmed text has between `min` and `max` characters.
pub(crate) fn length_between(value: &str, min: usize, max: usize) -> bool {
    let length = value.trim().chars().count();
    (min..=max).contains(&length)
}

pub(crate) fn length_message(min: usize, max: usize) -> String {
    format!("must be between {min} and {max} characters long")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_characters_after_trim() {
        assert!(length_between("  ab ", 2, 50));
        assert!(!length_between(" a ", 2, 50));
        assert!(length_between("żółw", 2, 4));
        assert!(!length_between(&"x".repeat(51), 2, 50));
    }

    #[test]
    fn collects_every_failed_field() {
        let mut validator = Validator::default();
        validator.check(false, "name", "too short");
        validator.check(true, "category", "fine");
        validator.check(false, "amount", "must be non-zero");
        assert_eq!(
            validator.finish(),
            Err(LedgerError::Validation(
                "name: too short; amount: must be non-zero".to_string()
            ))
        );
    }
}
