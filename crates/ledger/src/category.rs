//! Category registry per vault.
//!
//! A category is identified by its name inside the vault; it is only ever
//! created or deleted, never renamed in place.

use serde::{Deserialize, Serialize};

use crate::{
    ResultLedger,
    validation::{self, Validator},
};

pub const NAME_MIN_LENGTH: usize = 2;
pub const NAME_MAX_LENGTH: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub created_by: String,
}

impl Category {
    pub fn new(name: &str) -> ResultLedger<Self> {
        let mut validator = Validator::default();
        validator.check(
            validation::length_between(name, NAME_MIN_LENGTH, NAME_MAX_LENGTH),
            "name",
            validation::length_message(NAME_MIN_LENGTH, NAME_MAX_LENGTH),
        );
        validator.finish()?;

        Ok(Self {
            name: name.trim().to_string(),
            created_by: String::new(),
        })
    }
}
