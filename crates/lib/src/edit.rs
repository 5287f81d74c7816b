//! Profile edit form state.
//!
//! An edit goes `Viewing -> Validating -> Saved | Rejected`. Viewing and
//! rejection both produce an [`EditForm`]; only a save touches the store.
//! The transitions themselves live on [`UserDirectory`](crate::UserDirectory).

use serde::Deserialize;

use crate::user::validation::{self, normalize_optional};
use crate::user::{ProfileUpdate, User, UserId, ValidationError};

/// Raw profile fields as submitted by the edit form.
///
/// Missing fields deserialize as blank so they fail validation instead of
/// failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileSubmission {
    pub email: String,
    pub mundane_name: String,
    pub sca_name: String,
}

impl ProfileSubmission {
    /// Field checks that need no store access.
    pub fn validate(&self) -> Result<ProfileUpdate, ValidationError> {
        let mut errors = ValidationError::new();
        validation::check_email(&mut errors, &self.email);
        validation::require(&mut errors, "mundane_name", &self.mundane_name);
        errors.into_result()?;

        Ok(ProfileUpdate {
            email: self.email.trim().to_string(),
            mundane_name: self.mundane_name.trim().to_string(),
            sca_name: normalize_optional(Some(&self.sca_name)),
        })
    }
}

/// Everything needed to render the edit page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub id: UserId,
    /// `Editing <display name>`, from the stored record.
    pub title: String,
    pub email: String,
    pub mundane_name: String,
    pub sca_name: String,
    pub errors: ValidationError,
}

impl EditForm {
    /// Pre-filled with the user's current values.
    pub fn for_user(user: &User) -> Self {
        Self {
            id: user.id,
            title: title_for(user),
            email: user.email.clone(),
            mundane_name: user.mundane_name.clone(),
            sca_name: user.sca_name.clone().unwrap_or_default(),
            errors: ValidationError::new(),
        }
    }

    /// Echo a rejected submission back with its errors.
    pub fn rejected(user: &User, submission: &ProfileSubmission, errors: ValidationError) -> Self {
        Self {
            id: user.id,
            title: title_for(user),
            email: submission.email.clone(),
            mundane_name: submission.mundane_name.clone(),
            sca_name: submission.sca_name.clone(),
            errors,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

fn title_for(user: &User) -> String {
    format!("Editing {}", user.display_name())
}

/// Result of submitting the edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Persisted; carries the updated record.
    Saved(User),
    /// Nothing persisted; re-render this form.
    Rejected(EditForm),
}

impl EditOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, EditOutcome::Saved(_))
    }
}
