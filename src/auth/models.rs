// User records and request/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Stored user record.
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// process, so every outward path converts to [`UserResponse`] first.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response model (excludes password_hash)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "ana")]
    pub name: String,
    #[schema(example = "ana@x.com")]
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Validated input for creating a record
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub is_admin: bool,
}

/// Validated input for updating a record. `None` keeps the current value.
#[derive(Debug, Clone, Default, Validate)]
pub struct UserChanges {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

/// Field values as written to the store (password already hashed)
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_admin: Option<bool>,
}

/// Registration request DTO
///
/// Absent fields deserialize as empty so they surface as `MissingData`
/// instead of a body rejection.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    #[schema(example = "ana")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "ana@x.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "p1")]
    pub password: String,
    /// Only honored when the caller presents an admin token
    #[serde(default, alias = "isAdm", alias = "isAdmin")]
    pub is_admin: Option<bool>,
}

impl From<RegisterRequest> for NewUser {
    fn from(request: RegisterRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            password: request.password,
            is_admin: request.is_admin.unwrap_or(false),
        }
    }
}

/// Login request DTO
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "ana@x.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "p1")]
    pub password: String,
}

/// Update request DTO; all fields optional to support partial updates
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Only an admin caller may change this
    #[serde(default, alias = "isAdm", alias = "isAdmin")]
    pub is_admin: Option<bool>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            password: request.password,
            is_admin: request.is_admin,
        }
    }
}

/// Successful login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    #[schema(example = 86400)]
    pub expires_in: i64,
    pub user: UserResponse,
}
