//! Form validation.
//!
//! # Responsibilities
//! - Collect field-scoped and form-wide error messages
//! - Provide pure predicates used by form checks
//! - Share the behaviour across every form type through [`Validatable`]
//!
//! # Design Decisions
//! - The first failing check for a field wins; later failures for the same key are ignored
//! - Predicates never panic and never allocate more than the input

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Email pattern recommended by the WHATWG for `<input type="email">`.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is a valid regex")
});

/// Accumulated validation errors for one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validator {
    pub field_errors: BTreeMap<String, String>,
    pub non_field_errors: Vec<String>,
}

impl Validator {
    /// True when no check has failed.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Record `message` under `key` unless the key already has an error.
    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    /// Record `message` under `key` when `ok` is false.
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }
}

/// Validation behaviour for any form that embeds a [`Validator`].
pub trait Validatable {
    fn validator(&self) -> &Validator;
    fn validator_mut(&mut self) -> &mut Validator;

    fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        self.validator_mut().check_field(ok, key, message);
    }

    fn add_non_field_error(&mut self, message: &str) {
        self.validator_mut().add_non_field_error(message);
    }

    fn valid(&self) -> bool {
        self.validator().valid()
    }

    fn field_error(&self, key: &str) -> Option<&str> {
        self.validator().field_errors.get(key).map(String::as_str)
    }
}

/// True if the value contains something other than whitespace.
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if the value has at most `n` characters.
pub fn max_chars(value: &str, n: i64) -> bool {
    if n <= 0 {
        return value.is_empty();
    }
    value.chars().count() as u64 <= n as u64
}

/// True if the value has at least `n` characters.
pub fn min_chars(value: &str, n: i64) -> bool {
    n <= 0 || value.chars().count() as u64 >= n as u64
}

/// True if `value` is one of `allowed`.
pub fn permitted_int(value: i64, allowed: &[i64]) -> bool {
    allowed.contains(&value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}
