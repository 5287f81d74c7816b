//! Error types for user stores.

use thiserror::Error;

use crate::user::UserId;

/// Errors raised by [`UserStore`](super::UserStore) implementations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No user with this id.
    #[error("User not found: {id}")]
    UserNotFound { id: UserId },

    /// Another user already has this email (compared case-insensitively).
    #[error("Email already in use: {email}")]
    EmailTaken { email: String },

    /// A stored row could not be turned back into a user.
    #[error("Corrupt user record {id}: {reason}")]
    CorruptRecord { id: UserId, reason: String },

    /// SQL operation failed.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    Sqlx {
        reason: String,
        #[source]
        source: Option<sqlx::Error>,
    },

    #[error("Serialization failed")]
    SerializationFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("Deserialization failed")]
    DeserializationFailed {
        #[source]
        source: serde_json::Error,
    },

    #[error("File I/O error")]
    FileIo {
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::UserNotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::EmailTaken { .. })
    }

    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::FileIo { .. }
                | StoreError::SerializationFailed { .. }
                | StoreError::DeserializationFailed { .. }
        )
    }

    /// The user this error is about, if any.
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            StoreError::UserNotFound { id } | StoreError::CorruptRecord { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
