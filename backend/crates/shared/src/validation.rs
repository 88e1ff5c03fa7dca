//! Field Validation
//!
//! Collects field → message pairs before any write reaches storage. The
//! first message recorded for a field wins, so checks are written from the
//! most basic ("must be provided") to the most specific.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use crate::error::app_error::{AppError, AppResult};

/// Field name → message. Ordered so responses are stable.
pub type FieldErrors = BTreeMap<String, String>;

/// Accumulates field errors for one request.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no check has failed.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` for `key` unless the field already has one.
    pub fn add_error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(key.into())
            .or_insert_with(|| message.into());
    }

    /// Record `message` for `key` when `ok` is false.
    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_error(key, message);
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// `Ok(())` when valid, otherwise a 422 carrying every field error.
    pub fn finish(self) -> AppResult<()> {
        if self.valid() {
            Ok(())
        } else {
            Err(AppError::failed_validation(self.errors))
        }
    }
}

/// Records that know their own field invariants.
pub trait Validate {
    fn validate(&self, v: &mut Validator);
}

/// True if `value` is one of `permitted`.
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True if every element of `values` is distinct.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}
