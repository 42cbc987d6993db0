// JWT token issuance and verification service

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::error::AuthError;

/// Lifetime of every issued token: 24 hours
pub const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub email: String,
    pub is_admin: bool,
    pub iat: i64, // issued at timestamp
    pub exp: i64, // expiration timestamp
}

/// Identity claims embedded next to the subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub email: String,
    pub is_admin: bool,
}

/// Stateless token service. Holds the process-wide signing secret; tokens are
/// never stored, so validity is signature plus expiry.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a new TokenService from the signing secret.
    /// An empty secret is a configuration error.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.trim().is_empty() {
            return Err(AuthError::ConfigError(
                "JWT secret must not be empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token for `subject` that expires after the fixed 24h TTL
    pub fn issue(&self, subject: Uuid, claims: &IdentityClaims) -> Result<String, AuthError> {
        self.issue_with_ttl(subject, claims, Duration::seconds(TOKEN_TTL_SECONDS))
    }

    pub fn issue_with_ttl(
        &self,
        subject: Uuid,
        claims: &IdentityClaims,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            email: claims.email.clone(),
            is_admin: claims.is_admin,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))?;
        debug!(user_id = %subject, "token issued");
        Ok(token)
    }

    /// Verify signature, structure and expiry. Every failure is `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(reason = ?e.kind(), "token rejected");
                AuthError::InvalidToken
            })
    }
}
