//! User persistence.
//!
//! The [`UserStore`] trait is the interface the directory uses to read and
//! write accounts. This keeps the directory logic independent of where users
//! actually live.
//!
//! Two implementations are provided:
//!
//! - [`InMemoryStore`]: a map behind a `tokio::sync::RwLock`, with JSON
//!   snapshots to and from disk.
//! - [`SqlxStore`] (features `sqlite` / `postgres`): SQLite or PostgreSQL
//!   through sqlx's `AnyPool`.
//!
//! Every implementation must agree on the listing rules in [`crate::query`]:
//! the same filters, the same order, and the same page boundaries.

use std::any::Any;
use std::fmt;

use async_trait::async_trait;

use crate::Result;
use crate::config::SearchMode;
use crate::query::{PageRequest, UserPage, UserQuery};
use crate::user::{NewUser, ProfileUpdate, User, UserId};

mod errors;
pub use errors::StoreError;

pub mod in_memory;
pub use in_memory::InMemoryStore;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::SqlxStore;

/// Which implementation is behind a `dyn UserStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    InMemory,
    Sqlite,
    Postgres,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::InMemory => "inmemory",
            StoreKind::Sqlite => "sqlite",
            StoreKind::Postgres => "postgres",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage for user accounts.
///
/// Implementations must be `Send + Sync` so one store can be shared across
/// request handlers, and implement `Any` so callers can downcast (the server
/// uses this to snapshot the in-memory store on shutdown).
///
/// Emails are unique regardless of case. `create` and `update_profile`
/// return [`StoreError::EmailTaken`] rather than writing a duplicate.
#[async_trait]
pub trait UserStore: Send + Sync + Any {
    fn kind(&self) -> StoreKind;

    /// Fetch one user, or [`StoreError::UserNotFound`].
    async fn get(&self, id: UserId) -> Result<User>;

    /// Case-insensitive lookup by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Insert a validated account and assign its id.
    ///
    /// `password_hash` is an already hashed PHC string; `user.password` is
    /// ignored.
    async fn create(&self, user: NewUser, password_hash: Option<String>) -> Result<User>;

    /// Overwrite the editable profile fields of one user.
    ///
    /// Roles, tracks and the password hash are left as they are.
    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<User>;

    /// One page of the users matching `query`, in listing order.
    ///
    /// `query` is expected to be normalized.
    async fn list(
        &self,
        query: &UserQuery,
        mode: SearchMode,
        page: PageRequest,
    ) -> Result<UserPage>;

    /// Total number of stored users.
    async fn count(&self) -> Result<usize>;

    /// Returns a reference to the store as a `dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}
