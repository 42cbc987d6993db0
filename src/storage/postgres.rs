//! PostgreSQL user store
//!
//! Writes run inside a transaction. The explicit existence checks give the
//! same error precedence as the in-memory store; the `users_name_key` and
//! `users_email_key` unique constraints close the race between concurrent
//! transactions.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::UserStore;
use crate::auth::{
    error::AuthError,
    models::{UserRecord, UserUpdate},
};

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, created_at, updated_at";

/// User store backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check name/email uniqueness against every record other than `exclude`
    async fn check_unique(
        tx: &mut Transaction<'_, Postgres>,
        exclude: Option<Uuid>,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), AuthError> {
        if let Some(email) = email {
            let taken: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id IS DISTINCT FROM $2)",
            )
            .bind(email)
            .bind(exclude)
            .fetch_one(&mut **tx)
            .await?;
            if taken.unwrap_or(false) {
                return Err(AuthError::DuplicateEmail);
            }
        }

        if let Some(name) = name {
            let taken: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE name = $1 AND id IS DISTINCT FROM $2)",
            )
            .bind(name)
            .bind(exclude)
            .fetch_one(&mut **tx)
            .await?;
            if taken.unwrap_or(false) {
                return Err(AuthError::DuplicateName);
            }
        }

        Ok(())
    }
}

/// Map a write failure, turning unique violations into duplicate errors
fn map_write_error(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_name_key") => AuthError::DuplicateName,
                _ => AuthError::DuplicateEmail,
            };
        }
    }
    AuthError::from(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<UserRecord>, AuthError> {
        let users = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, record: UserRecord) -> Result<UserRecord, AuthError> {
        let mut tx = self.pool.begin().await?;

        Self::check_unique(&mut tx, None, Some(&record.name), Some(&record.email)).await?;

        let user = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_admin, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.is_admin)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await.map_err(map_write_error)?;
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserUpdate) -> Result<UserRecord, AuthError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1 FOR UPDATE",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AuthError::NotFound)?;

        Self::check_unique(
            &mut tx,
            Some(id),
            changes.name.as_deref(),
            changes.email.as_deref(),
        )
        .await?;

        let user = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                is_admin = COALESCE($4, is_admin),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.is_admin)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await.map_err(map_write_error)?;
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }
}
