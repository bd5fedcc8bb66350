//! Account registration, login, and administration.

use tracing::{debug, info, warn};

use crate::model::{Role, User, UserId};
use crate::ports::StoreError;
use crate::service::{JemputService, ServiceError};

#[derive(Debug, Clone)]
/// Account as submitted by the administration form.
pub struct UserDraft {
    /// Existing account being edited, or `None` to create one.
    pub id: Option<UserId>,
    /// Login name.
    pub username: String,
    /// New password. Required when creating; `None` keeps the current hash.
    pub password: Option<String>,
    /// Access level.
    pub role: Role,
}

impl JemputService {
    /// Self-register a regular account.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for blank input,
    /// [`ServiceError::DuplicateUsername`] when the name is taken, and
    /// [`ServiceError::Store`] or [`ServiceError::Hash`] on backend failures.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "username and password are required".into(),
            ));
        }
        self.create_user(username, password, Role::User).await
    }

    /// Verify credentials.
    ///
    /// Returns `None` for blank input, unknown usernames, and wrong passwords.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the lookup fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>, ServiceError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Ok(None);
        }

        let Some(user) = self.stores.users.user_by_username(username).await? else {
            debug!(username, "login for unknown user");
            return Ok(None);
        };

        match bcrypt::verify(password, &user.password_hash) {
            Ok(true) => {
                info!(username, role = %user.role, "user logged in");
                Ok(Some(user))
            }
            Ok(false) => Ok(None),
            Err(err) => {
                warn!(username, error = %err, "stored password hash is unreadable");
                Ok(None)
            }
        }
    }

    /// Verify credentials, treating a mismatch as an error.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidCredentials`] when [`Self::login`] finds
    /// no match, and [`ServiceError::Store`] when the lookup fails.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        self.login(username, password)
            .await?
            .ok_or(ServiceError::InvalidCredentials)
    }

    /// All accounts ordered by username.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` is an admin, and
    /// [`ServiceError::Store`] when the read fails.
    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>, ServiceError> {
        if !actor.role.can_manage_users() {
            return Err(ServiceError::Forbidden);
        }
        let mut users = self.stores.users.all_users().await?;
        users.sort_by(|left, right| left.username.cmp(&right.username));
        Ok(users)
    }

    /// Create or update an account on behalf of an admin.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` is an admin,
    /// [`ServiceError::Validation`] for a blank username or a new account
    /// without password, [`ServiceError::DuplicateUsername`] when the name
    /// belongs to another account, and [`ServiceError::Store`] or
    /// [`ServiceError::Hash`] on backend failures.
    pub async fn save_user(&self, actor: &User, draft: UserDraft) -> Result<User, ServiceError> {
        if !actor.role.can_manage_users() {
            return Err(ServiceError::Forbidden);
        }
        let username = draft.username.trim();
        if username.is_empty() {
            return Err(ServiceError::Validation("username is required".into()));
        }
        let password = draft.password.filter(|password| !password.is_empty());

        let Some(id) = draft.id.filter(|id| !id.0.trim().is_empty()) else {
            let password = password
                .ok_or_else(|| ServiceError::Validation("password is required".into()))?;
            return self.create_user(username, &password, draft.role).await;
        };

        let stored = self
            .stores
            .users
            .user(&id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.0.clone()))?;

        if let Some(owner) = self.stores.users.user_by_username(username).await?
            && owner.id != stored.id
        {
            return Err(ServiceError::DuplicateUsername(username.to_owned()));
        }

        let password_hash = match password {
            Some(password) => bcrypt::hash(password, self.hash_cost)?,
            None => stored.password_hash,
        };
        let user = User {
            id: stored.id,
            username: username.to_owned(),
            password_hash,
            role: draft.role,
        };
        self.stores.users.replace_user(user.clone()).await?;
        info!(user_id = %user.id, role = %user.role, actor = %actor.username, "user updated");
        Ok(user)
    }

    /// Delete an account on behalf of an admin.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Forbidden`] unless `actor` is an admin, and
    /// [`ServiceError::Store`] when the delete fails.
    pub async fn delete_user(&self, actor: &User, id: &UserId) -> Result<(), ServiceError> {
        if !actor.role.can_manage_users() {
            return Err(ServiceError::Forbidden);
        }
        self.stores.users.delete_user(id).await?;
        info!(user_id = %id, actor = %actor.username, "user deleted");
        Ok(())
    }

    /// Create an admin account when the store holds no accounts at all.
    ///
    /// Returns the created admin, or `None` when accounts already exist. An
    /// empty store without `credentials` stays empty and is logged at warn.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for blank credentials and
    /// [`ServiceError::Store`] or [`ServiceError::Hash`] on backend failures.
    pub async fn ensure_admin(
        &self,
        credentials: Option<(&str, &str)>,
    ) -> Result<Option<User>, ServiceError> {
        if !self.stores.users.all_users().await?.is_empty() {
            return Ok(None);
        }
        let Some((username, password)) = credentials else {
            warn!("no accounts exist and no bootstrap admin is configured");
            return Ok(None);
        };
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "bootstrap admin needs a username and password".into(),
            ));
        }
        let admin = self.create_user(username, password, Role::Admin).await?;
        info!(username, "bootstrap admin created");
        Ok(Some(admin))
    }

    async fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, ServiceError> {
        if self.stores.users.user_by_username(username).await?.is_some() {
            return Err(ServiceError::DuplicateUsername(username.to_owned()));
        }
        let user = User {
            id: UserId(self.stores.ids.next_id()),
            username: username.to_owned(),
            password_hash: bcrypt::hash(password, self.hash_cost)?,
            role,
        };
        self.stores.users.insert_user(user.clone()).await?;
        info!(user_id = %user.id, username, role = %role, "user created");
        Ok(user)
    }
}
