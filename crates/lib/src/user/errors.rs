//! Error types for the user model
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {reason}")]
    PasswordHashFailed { reason: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl UserError {
    pub fn is_validation_error(&self) -> bool {
        matches!(self, UserError::Invalid(_))
    }
}

/// Field-level validation failures, keyed by form field name.
///
/// Messages are kept in insertion order per field so the form can render
/// them next to the input they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add(field, message);
        err
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| (*field, m.as_str())))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, message)| format!("{field} {message}"))
            .collect();
        write!(f, "Validation failed: {}", parts.join(", "))
    }
}

impl std::error::Error for ValidationError {}

impl From<UserError> for crate::Error {
    fn from(err: UserError) -> Self {
        crate::Error::User(err)
    }
}

impl From<ValidationError> for crate::Error {
    fn from(err: ValidationError) -> Self {
        crate::Error::User(UserError::Invalid(err))
    }
}
