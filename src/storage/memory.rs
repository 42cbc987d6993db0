//! In-memory user store for development, tests and single-process deployments

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserStore;
use crate::auth::{
    error::AuthError,
    models::{UserRecord, UserUpdate},
};

/// Records live in a vector behind one read/write lock. Lookups are linear
/// scans; writers hold the write guard across their uniqueness checks.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conflict_with_others(
    users: &[UserRecord],
    exclude: Option<Uuid>,
    name: Option<&str>,
    email: Option<&str>,
) -> Option<AuthError> {
    let others = || users.iter().filter(move |u| Some(u.id) != exclude);

    if let Some(email) = email {
        if others().any(|u| u.email == email) {
            return Some(AuthError::DuplicateEmail);
        }
    }
    if let Some(name) = name {
        if others().any(|u| u.name == name) {
            return Some(AuthError::DuplicateName);
        }
    }
    None
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self) -> Result<Vec<UserRecord>, AuthError> {
        Ok(self.users.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<UserRecord, AuthError> {
        let mut users = self.users.write().await;

        if let Some(err) =
            conflict_with_others(&users, None, Some(&record.name), Some(&record.email))
        {
            return Err(err);
        }

        users.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, changes: UserUpdate) -> Result<UserRecord, AuthError> {
        let mut users = self.users.write().await;

        if !users.iter().any(|u| u.id == id) {
            return Err(AuthError::NotFound);
        }
        if let Some(err) = conflict_with_others(
            &users,
            Some(id),
            changes.name.as_deref(),
            changes.email.as_deref(),
        ) {
            return Err(err);
        }

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AuthError::NotFound)?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(is_admin) = changes.is_admin {
            user.is_admin = is_admin;
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or(AuthError::NotFound)?;
        users.remove(index);
        Ok(())
    }
}
