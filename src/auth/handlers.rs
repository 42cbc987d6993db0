// HTTP handlers for registration, login and user management

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::{
    error::{AuthError, ErrorResponse},
    extract::{ApiJson, ApiPath},
    middleware::AuthenticatedUser,
    models::{AuthResponse, LoginRequest, RegisterRequest, UpdateUserRequest, UserResponse},
    service::AuthService,
};

/// Liveness probe
/// GET /home
pub async fn home_handler() -> &'static str {
    "Opa"
}

/// Register a new user
/// POST /users
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing name, email or password", body = ErrorResponse),
        (status = 403, description = "Admin flag requested without admin token", body = ErrorResponse),
        (status = 409, description = "Email or name already taken", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn register_handler(
    State(service): State<Arc<AuthService>>,
    caller: Option<AuthenticatedUser>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    let user = service.register(caller.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login a user
/// POST /login
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = service.login(&request.email, &request.password).await?;
    Ok(Json(response))
}

/// List all users (admin only)
/// GET /users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users_handler(
    State(service): State<Arc<AuthService>>,
    caller: AuthenticatedUser,
) -> Result<Json<Vec<UserResponse>>, AuthError> {
    let users = service.list_all(&caller).await?;
    Ok(Json(users))
}

/// Get the caller's own profile
/// GET /users/me
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Caller profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Caller no longer exists", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn me_handler(
    State(service): State<Arc<AuthService>>,
    caller: AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    let user = service.get_profile(caller.user_id).await?;
    Ok(Json(user))
}

/// Update a user (self or admin)
/// PUT /users/:id
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Empty field supplied", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not the owner and not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email or name already taken", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user_handler(
    State(service): State<Arc<AuthService>>,
    caller: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    let user = service.update_user(&caller, id, request).await?;
    Ok(Json(user))
}

/// Delete a user (self or admin)
/// DELETE /users/:id
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Not the owner and not an admin", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user_handler(
    State(service): State<Arc<AuthService>>,
    caller: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, AuthError> {
    service.delete_user(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
