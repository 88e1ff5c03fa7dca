//! Resource contract
//!
//! Everything the generic handlers need to know about one catalog table on
//! top of [`Versioned`]: wire names, request bodies and list filters.

use std::collections::HashMap;

use kernel::validation::{Validate, Validator};
use platform::store::Versioned;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub trait Resource: Versioned + Validate + Serialize {
    /// Body of a create request
    type Input: DeserializeOwned + Send + 'static;
    /// Body of a partial update; absent fields are left alone
    type Patch: DeserializeOwned + Send + 'static;

    /// Envelope key for one record (`movie`)
    const SINGULAR: &'static str;
    /// Envelope key for a page of records (`movies`)
    const PLURAL: &'static str;
    /// Collection path below `/v1` (`/movies`)
    const PATH: &'static str;

    /// A not-yet-inserted record
    fn create(input: Self::Input) -> Self;

    fn apply(&mut self, patch: Self::Patch);

    /// List filter from the query string; problems go to `v`
    fn parse_filter(query: &HashMap<String, String>, v: &mut Validator) -> Self::Filter;

    /// Field error for a violated foreign key, if the table has one
    fn reference_error(_constraint: &str) -> Option<(&'static str, &'static str)> {
        None
    }
}

/// Shared name check (`required`, at most 500 bytes)
pub fn check_name(v: &mut Validator, key: &str, value: &str) {
    v.check(!value.is_empty(), key, "must be provided");
    v.check(value.len() <= 500, key, "must not be more than 500 bytes long");
}

/// Shared positive-quantity check
pub fn check_positive(v: &mut Validator, key: &str, value: i64) {
    v.check(value != 0, key, "must be provided");
    v.check(value > 0, key, "must be a positive integer");
}
