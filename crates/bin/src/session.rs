//! Session management for the web interface
//!
//! In-memory session storage mapping cookie tokens to signed-in user ids.
//! Only the id is kept: the user record is re-read on every request so role
//! changes take effect immediately.

use std::{collections::HashMap, sync::Arc};

use instructable::user::UserId;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session token (UUID stored in cookie)
pub type SessionToken = String;

#[derive(Debug, Clone)]
struct Session {
    user_id: UserId,
    flash: Option<String>,
}

/// In-memory session store
///
/// Sessions are ephemeral and lost on server restart.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new session for a user and return its token
    pub async fn create_session(&self, user_id: UserId) -> SessionToken {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            token.clone(),
            Session {
                user_id,
                flash: None,
            },
        );
        token
    }

    /// The user signed in under `token`, if the session exists
    pub async fn get_user_id(&self, token: &str) -> Option<UserId> {
        let sessions = self.sessions.read().await;
        sessions.get(token).map(|session| session.user_id)
    }

    pub async fn destroy_session(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(token);
    }

    /// Queue a one-shot message for the next page this session renders.
    /// Ignored for unknown tokens.
    pub async fn set_flash(&self, token: &str, message: impl Into<String>) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(token) {
            session.flash = Some(message.into());
        }
    }

    /// Remove and return the pending flash message
    pub async fn take_flash(&self, token: &str) -> Option<String> {
        let mut sessions = self.sessions.write().await;
        sessions.get_mut(token).and_then(|session| session.flash.take())
    }

    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
