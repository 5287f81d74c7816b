//! In-memory user store with JSON snapshots.
//!
//! All users live in a single map behind a `tokio::sync::RwLock`. The whole
//! state, including the id counter, can be written to and read back from a
//! JSON file so a development server keeps its accounts across restarts.

use std::any::Any;
use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use super::{StoreError, StoreKind, UserStore};
use crate::config::SearchMode;
use crate::query::{self, PageRequest, UserPage, UserQuery};
use crate::user::validation::emails_match;
use crate::user::{NewUser, ProfileUpdate, User, UserId};
use crate::{Error, Result};

/// The current snapshot file format version.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    users: BTreeMap<UserId, User>,
}

impl State {
    fn email_owner(&self, email: &str) -> Option<UserId> {
        self.users
            .values()
            .find(|u| emails_match(&u.email, email))
            .map(|u| u.id)
    }
}

/// On-disk form of the store.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    next_id: i64,
    #[serde(default)]
    users: Vec<User>,
}

/// A [`UserStore`] that keeps every user in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the whole store to `path` as pretty JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let snapshot = {
            let state = self.state.read().await;
            Snapshot {
                version: PERSISTENCE_VERSION,
                next_id: state.next_id,
                users: state.users.values().cloned().collect(),
            }
        };

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| -> Error { StoreError::SerializationFailed { source: e }.into() })?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| -> Error { StoreError::FileIo { source: e }.into() })
    }

    /// Load a store written by [`save_to_file`](Self::save_to_file).
    ///
    /// A missing file yields an empty store.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(StoreError::FileIo { source: e }.into()),
        };

        let snapshot: Snapshot = serde_json::from_str(&json)
            .map_err(|e| -> Error { StoreError::DeserializationFailed { source: e }.into() })?;

        let users: BTreeMap<UserId, User> =
            snapshot.users.into_iter().map(|u| (u.id, u)).collect();
        // Never hand out an id that is already taken, even if the counter is stale.
        let max_id = users.keys().map(|id| id.0).max().unwrap_or(0);

        Ok(Self {
            state: RwLock::new(State {
                next_id: snapshot.next_id.max(max_id),
                users,
            }),
        })
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    fn kind(&self) -> StoreKind {
        StoreKind::InMemory
    }

    async fn get(&self, id: UserId) -> Result<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound { id }.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .email_owner(email)
            .and_then(|id| state.users.get(&id).cloned()))
    }

    async fn create(&self, user: NewUser, password_hash: Option<String>) -> Result<User> {
        let mut state = self.state.write().await;
        if state.email_owner(&user.email).is_some() {
            return Err(StoreError::EmailTaken { email: user.email }.into());
        }

        state.next_id += 1;
        let created = User {
            id: UserId(state.next_id),
            mundane_name: user.mundane_name,
            sca_name: user.sca_name,
            email: user.email,
            roles: user.roles,
            tracks: user.tracks,
            password_hash,
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> Result<User> {
        let mut state = self.state.write().await;
        if state.email_owner(&update.email).is_some_and(|owner| owner != id) {
            return Err(StoreError::EmailTaken {
                email: update.email.clone(),
            }
            .into());
        }

        let user = state
            .users
            .get_mut(&id)
            .ok_or(StoreError::UserNotFound { id })?;
        update.apply(user);
        Ok(user.clone())
    }

    async fn list(
        &self,
        query: &UserQuery,
        mode: SearchMode,
        page: PageRequest,
    ) -> Result<UserPage> {
        let mut matching: Vec<User> = self
            .state
            .read()
            .await
            .users
            .values()
            .filter(|u| query.matches(u, mode))
            .cloned()
            .collect();
        matching.sort_by(query::listing_order);
        Ok(query::paginate(matching, page))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().await.users.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
