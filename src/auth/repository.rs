// User registry: validation, hashing and CRUD over a UserStore

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{NewUser, UserChanges, UserRecord, UserResponse, UserUpdate},
    password::PasswordService,
};
use crate::storage::UserStore;

/// Owns the user collection. Nothing outside the registry touches raw
/// records except through these methods.
#[derive(Clone)]
pub struct UserRegistry {
    store: Arc<dyn UserStore>,
    passwords: PasswordService,
}

impl UserRegistry {
    pub fn new(store: Arc<dyn UserStore>, passwords: PasswordService) -> Self {
        Self { store, passwords }
    }

    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    /// All records, password hashes included. Callers must convert to
    /// `UserResponse` before anything leaves the process.
    pub async fn list(&self) -> Result<Vec<UserRecord>, AuthError> {
        self.store.list().await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        self.store.find_by_email(email).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        self.store.find_by_id(id).await
    }

    /// Create a new user.
    ///
    /// All of name/email/password must be non-empty (`MissingData`). The
    /// store rejects a taken email or name atomically with the insert.
    pub async fn create(&self, new_user: NewUser) -> Result<UserResponse, AuthError> {
        new_user.validate()?;

        let password_hash = self.passwords.hash_password(&new_user.password)?;
        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash,
            is_admin: new_user.is_admin,
            created_at: now,
            updated_at: now,
        };

        let user = self.store.insert(record).await?;
        info!(user_id = %user.id, is_admin = user.is_admin, "user created");
        Ok(user.into())
    }

    /// Overwrite the supplied fields of the record with `id`, re-hashing a
    /// new password. Name and email stay unique across records.
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<UserResponse, AuthError> {
        changes.validate()?;

        let password_hash = changes
            .password
            .as_deref()
            .map(|password| self.passwords.hash_password(password))
            .transpose()?;

        let update = UserUpdate {
            name: changes.name,
            email: changes.email,
            password_hash,
            is_admin: changes.is_admin,
        };

        let user = self.store.update(id, update).await?;
        info!(user_id = %user.id, "user updated");
        Ok(user.into())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        self.store.delete(id).await?;
        debug!(user_id = %id, "user record removed");
        Ok(())
    }
}
