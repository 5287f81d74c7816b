//! Who is asking, and whether they may manage users.
//!
//! Administrative operations are only available to signed-in users holding
//! the admin role. The check happens before any data is read.

use crate::user::User;
use crate::{Error, Result};

/// The party performing an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Actor {
    /// No signed-in user.
    #[default]
    Anonymous,
    User(User),
}

impl Actor {
    pub fn user(&self) -> Option<&User> {
        match self {
            Actor::Anonymous => None,
            Actor::User(user) => Some(user),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Actor::User(_))
    }
}

impl From<Option<User>> for Actor {
    fn from(user: Option<User>) -> Self {
        user.map_or(Actor::Anonymous, Actor::User)
    }
}

/// Admins only; every other role, and anonymous callers, are refused.
pub fn can_access_admin_users(actor: &Actor) -> bool {
    actor.user().is_some_and(User::is_admin)
}

/// The admin behind `actor`, or [`Error::NotAuthorized`].
pub fn require_admin(actor: &Actor) -> Result<&User> {
    match actor.user() {
        Some(user) if user.is_admin() => Ok(user),
        _ => {
            tracing::debug!(
                signed_in = actor.is_signed_in(),
                "Refusing non-admin access to user administration"
            );
            Err(Error::NotAuthorized)
        }
    }
}
