// Password hashing and verification service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::auth::error::AuthError;

/// Argon2id memory cost in KiB
const MEMORY_COST_KIB: u32 = 19_456;
/// Argon2id iteration count
const TIME_COST: u32 = 2;
/// Argon2id lanes
const PARALLELISM: u32 = 1;

/// Password service for hashing and verification.
///
/// The cost parameters are fixed; verification reads the parameters embedded
/// in each stored PHC string.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> Self {
        let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
            .unwrap_or(Params::DEFAULT);
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AuthError::PasswordHashError
            })
    }

    /// Verify a password against a stored hash.
    ///
    /// Returns `false` on mismatch and on a malformed hash; never errors.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new()
    }
}
