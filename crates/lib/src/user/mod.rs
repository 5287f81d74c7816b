//! User accounts
//!
//! A user has a legal ("mundane") name, an optional persona ("SCA") name,
//! a unique email, independent role flags and a set of subject tracks.

pub mod crypto;
pub mod errors;
pub mod role;
pub mod track;
pub mod validation;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use errors::{UserError, ValidationError};
pub use role::{Role, RoleSet};
pub use track::Track;

/// Text rendered for a user with no tracks.
pub const NO_TRACKS: &str = "-";

/// Store-assigned user identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub mundane_name: String,
    #[serde(default)]
    pub sca_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub roles: RoleSet,
    #[serde(default)]
    pub tracks: BTreeSet<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl User {
    /// The persona name when set, otherwise the legal name.
    pub fn display_name(&self) -> &str {
        match self.sca_name.as_deref().map(str::trim) {
            Some(sca) if !sca.is_empty() => sca,
            _ => &self.mundane_name,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Tracks joined for display, or [`NO_TRACKS`] when there are none.
    pub fn tracks_display(&self) -> String {
        if self.tracks.is_empty() {
            NO_TRACKS.to_string()
        } else {
            self.tracks
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Fields for a new account.
///
/// Registration lives elsewhere; this is what the CLI and fixtures use.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub mundane_name: String,
    pub sca_name: Option<String>,
    pub email: String,
    pub roles: RoleSet,
    pub tracks: BTreeSet<Track>,
    pub password: Option<String>,
}

impl NewUser {
    pub fn new(mundane_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            mundane_name: mundane_name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn with_sca_name(mut self, sca_name: impl Into<String>) -> Self {
        self.sca_name = Some(sca_name.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_track(mut self, track: Track) -> Self {
        self.tracks.insert(track);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Check field rules (not uniqueness) and return the normalized record.
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        let mut errors = ValidationError::new();
        validation::require(&mut errors, "mundane_name", &self.mundane_name);
        validation::check_email(&mut errors, &self.email);
        errors.into_result()?;

        Ok(NewUser {
            mundane_name: self.mundane_name.trim().to_string(),
            sca_name: validation::normalize_optional(self.sca_name.as_deref()),
            email: self.email.trim().to_string(),
            ..self
        })
    }
}

/// A validated change to the editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: String,
    pub mundane_name: String,
    pub sca_name: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(&self, user: &mut User) {
        user.email = self.email.clone();
        user.mundane_name = self.mundane_name.clone();
        user.sca_name = self.sca_name.clone();
    }
}
