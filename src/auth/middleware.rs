// Bearer token extraction for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    token::{Claims, TokenService},
};

/// Caller identity resolved from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            is_admin: claims.is_admin,
        }
    }
}

/// Read the raw token from an `Authorization: Bearer <token>` header
pub fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or(AuthError::InvalidToken)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = tokens.verify(token)?;

        debug!(user_id = %claims.sub, "request authenticated");
        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::IdentityClaims;
    use axum::http::Request;

    fn parts_with_auth(auth_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = auth_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    fn token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new("test_secret_key_for_testing_purposes").unwrap())
    }

    #[tokio::test]
    async fn test_missing_header_is_missing_token() {
        let mut parts = parts_with_auth(None);
        let result = AuthenticatedUser::from_request_parts(&mut parts, &token_service()).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_wrong_scheme_is_invalid_token() {
        let mut parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        let result = AuthenticatedUser::from_request_parts(&mut parts, &token_service()).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid_token() {
        let mut parts = parts_with_auth(Some("Bearer not.a.token"));
        let result = AuthenticatedUser::from_request_parts(&mut parts, &token_service()).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_valid_token_yields_caller() {
        let tokens = token_service();
        let user_id = Uuid::new_v4();
        let token = tokens
            .issue(
                user_id,
                &IdentityClaims {
                    email: "ana@x.com".to_string(),
                    is_admin: false,
                },
            )
            .unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {}", token)));
        let caller = AuthenticatedUser::from_request_parts(&mut parts, &tokens)
            .await
            .unwrap();

        assert_eq!(caller.user_id, user_id);
        assert_eq!(caller.email, "ana@x.com");
        assert!(!caller.is_admin);
    }
}
