//!
//! Instructable: the user directory behind an event's class-scheduling site.
//!
//! This library holds the administrative user directory: listing, searching,
//! filtering, paginating and editing user accounts, gated so that only
//! administrators reach any of it.
//!
//! ## Core Concepts
//!
//! * **Users (`user::User`)**: An account with a legal ("mundane") name, an optional persona
//!   ("SCA") name, a unique email, independent role flags (`user::RoleSet`) and a set of
//!   subject tracks (`user::Track`).
//! * **Stores (`store::UserStore`)**: A pluggable persistence layer for users. An in-memory store
//!   with JSON snapshots and a sqlx-based SQL store (SQLite or PostgreSQL) are provided.
//! * **Directory (`directory::UserDirectory`)**: The administrative operations. Every call takes
//!   an `authz::Actor` and refuses non-administrators before touching the store.
//! * **Queries (`query::UserQuery`)**: Search term plus role filter, evaluated by the store and
//!   returned a page at a time (`query::UserPage`).
//! * **Edit forms (`edit::EditForm`)**: The state needed to render the profile edit form, including
//!   field-level validation errors on a rejected save.

pub mod authz;
pub mod config;
pub mod directory;
pub mod edit;
pub mod pagination;
pub mod query;
pub mod store;
pub mod user;

pub use authz::Actor;
pub use config::{DirectoryConfig, SearchMode};
pub use directory::UserDirectory;

/// Result type used throughout the Instructable library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Instructable library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The acting user may not perform the operation.
    #[error("Not authorized")]
    NotAuthorized,

    /// Structured user model errors from the user module
    #[error(transparent)]
    User(user::UserError),

    /// Structured persistence errors from the store module
    #[error(transparent)]
    Store(store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::NotAuthorized => "authz",
            Error::User(_) => "user",
            Error::Store(_) => "store",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::NotAuthorized)
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::User(user_err) => user_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error is a failed sign-in.
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, Error::User(user::UserError::InvalidCredentials))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_io_error(),
            _ => false,
        }
    }
}
