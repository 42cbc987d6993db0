//! Abstract user store and its backends
//!
//! The registry talks to records only through [`UserStore`]. Both writes are
//! check-then-act sequences (uniqueness, existence) and every backend must run
//! each of them as one atomic unit.

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{UserRecord, UserUpdate},
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Keyed record store backing the user registry
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All live records, password hashes included
    async fn list(&self) -> Result<Vec<UserRecord>, AuthError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;

    /// Insert a record. Fails with `DuplicateEmail` or `DuplicateName` (email
    /// checked first) if another live record holds either value.
    async fn insert(&self, record: UserRecord) -> Result<UserRecord, AuthError>;

    /// Apply `changes` to the record with `id` and refresh `updated_at`.
    /// Fails with `NotFound`, or a duplicate error if the new name or email
    /// belongs to a different record.
    async fn update(&self, id: Uuid, changes: UserUpdate) -> Result<UserRecord, AuthError>;

    async fn delete(&self, id: Uuid) -> Result<(), AuthError>;
}
