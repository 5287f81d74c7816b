//! The administrative user directory.
//!
//! [`UserDirectory`] ties the authorization gate, the query engine and the
//! edit workflow to a [`UserStore`]. It is the only type the web layer and
//! the CLI talk to.

use std::sync::Arc;

use crate::Result;
use crate::authz::{self, Actor};
use crate::config::DirectoryConfig;
use crate::edit::{EditForm, EditOutcome, ProfileSubmission};
use crate::query::{PageRequest, UserPage, UserQuery};
use crate::store::{StoreKind, UserStore};
use crate::user::validation::TAKEN;
use crate::user::{NewUser, User, UserError, UserId, ValidationError, crypto};

/// Handle to the user directory. Cheap to clone.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn UserStore>,
    config: DirectoryConfig,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self::with_config(store, DirectoryConfig::default())
    }

    pub fn with_config(store: Arc<dyn UserStore>, config: DirectoryConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store.kind()
    }

    /// A page request using the configured page size.
    pub fn page(&self, number: usize) -> PageRequest {
        PageRequest::new(number, self.config.page_size)
    }

    /// One page of users matching `query`.
    ///
    /// A page past the end is empty, not an error.
    pub async fn list_users(
        &self,
        actor: &Actor,
        query: UserQuery,
        page: PageRequest,
    ) -> Result<UserPage> {
        authz::require_admin(actor)?;

        let query = query.normalized();
        let result = self
            .store
            .list(&query, self.config.search_mode, page)
            .await?;

        tracing::debug!(
            search = query.search.as_deref(),
            role = query.role.map(|r| r.as_str()),
            page = page.page,
            total = result.total,
            "Listed users"
        );
        Ok(result)
    }

    /// The edit form pre-filled with the user's current profile.
    pub async fn edit_form(&self, actor: &Actor, id: UserId) -> Result<EditForm> {
        authz::require_admin(actor)?;
        let user = self.store.get(id).await?;
        Ok(EditForm::for_user(&user))
    }

    /// Validate and save a profile edit.
    ///
    /// Invalid input is an [`EditOutcome::Rejected`], not an error. Errors are
    /// reserved for refusal, a missing user and store failures.
    pub async fn update_user(
        &self,
        actor: &Actor,
        id: UserId,
        submission: ProfileSubmission,
    ) -> Result<EditOutcome> {
        let admin = authz::require_admin(actor)?;
        let user = self.store.get(id).await?;

        let (update, mut errors) = match submission.validate() {
            Ok(update) => (Some(update), ValidationError::new()),
            Err(errors) => (None, errors),
        };

        if !errors.has("email")
            && let Some(owner) = self.store.find_by_email(&submission.email).await?
            && owner.id != id
        {
            errors.add("email", TAKEN);
        }

        let update = match update {
            Some(update) if errors.is_empty() => update,
            _ => {
                tracing::debug!(user = %id, %errors, "Rejected user edit");
                return Ok(EditOutcome::Rejected(EditForm::rejected(
                    &user,
                    &submission,
                    errors,
                )));
            }
        };

        match self.store.update_profile(id, &update).await {
            Ok(saved) => {
                tracing::info!(admin = %admin.id, user = %id, "Updated user profile");
                Ok(EditOutcome::Saved(saved))
            }
            // Lost a race with another write of the same email.
            Err(err) if err.is_conflict() => Ok(EditOutcome::Rejected(EditForm::rejected(
                &user,
                &submission,
                ValidationError::single("email", TAKEN),
            ))),
            Err(err) => Err(err),
        }
    }

    /// Check a sign-in attempt.
    ///
    /// Unknown emails, accounts without a password and wrong passwords all
    /// fail the same way.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(UserError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(UserError::InvalidCredentials)?;
        crypto::verify_password(password, hash)?;

        tracing::info!(user = %user.id, "User signed in");
        Ok(user)
    }

    /// Turn a session's user id back into an actor.
    ///
    /// A user who has since disappeared is treated as signed out.
    pub async fn resolve_actor(&self, id: Option<UserId>) -> Result<Actor> {
        let Some(id) = id else {
            return Ok(Actor::Anonymous);
        };
        match self.store.get(id).await {
            Ok(user) => Ok(Actor::User(user)),
            Err(err) if err.is_not_found() => Ok(Actor::Anonymous),
            Err(err) => Err(err),
        }
    }

    /// Create an account.
    ///
    /// Used by the CLI and fixtures, not the web UI. A duplicate email is
    /// reported as a validation failure on `email`.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let new_user = new_user.validate()?;
        let password_hash = new_user
            .password
            .as_deref()
            .map(crypto::hash_password)
            .transpose()?;

        let user = match self.store.create(new_user, password_hash).await {
            Ok(user) => user,
            Err(err) if err.is_conflict() => {
                return Err(ValidationError::single("email", TAKEN).into());
            }
            Err(err) => return Err(err),
        };

        tracing::info!(user = %user.id, roles = ?user.roles.labels(), "Created user");
        Ok(user)
    }
}

impl std::fmt::Debug for UserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDirectory")
            .field("store", &self.store.kind())
            .field("config", &self.config)
            .finish()
    }
}

impl From<Arc<dyn UserStore>> for UserDirectory {
    fn from(store: Arc<dyn UserStore>) -> Self {
        Self::new(store)
    }
}
