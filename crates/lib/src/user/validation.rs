//! Field rules shared by account creation and the edit form.

use super::errors::ValidationError;

pub const BLANK: &str = "can't be blank";
pub const INVALID: &str = "is invalid";
pub const TAKEN: &str = "has already been taken";

/// Trim a field; blank values become `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Record `BLANK` for `field` when `value` is empty after trimming.
pub fn require(errors: &mut ValidationError, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, BLANK);
    }
}

/// Check presence and shape of an email address.
///
/// Uniqueness needs the store and is checked separately.
pub fn check_email(errors: &mut ValidationError, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", BLANK);
    } else if !is_well_formed_email(email) {
        errors.add("email", INVALID);
    }
}

/// One `@`, a non-empty local part, and a dotted domain with non-empty labels.
pub fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Emails are unique regardless of case.
pub fn emails_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
