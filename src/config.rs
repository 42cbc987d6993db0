// Process configuration loaded once at startup

use std::fmt;

use crate::auth::error::AuthError;

const REDACTED: &str = "<redacted>";

/// Credentials for the admin seeded at startup
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// PostgreSQL connection string; `None` selects the in-memory store
    pub database_url: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .finish()
    }
}

// The database URL can carry a password too
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &REDACTED)
            .field("database_url", &self.database_url.as_ref().map(|_| REDACTED))
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish()
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| AuthError::ConfigError("JWT_SECRET must be set".to_string()))?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AuthError::ConfigError(format!("invalid PORT: {}", raw)))?,
            None => 3001,
        };

        let bootstrap_admin = match (
            get("BOOTSTRAP_ADMIN_NAME"),
            get("BOOTSTRAP_ADMIN_EMAIL"),
            get("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(name), Some(email), Some(password)) => Some(BootstrapAdmin {
                name,
                email,
                password,
            }),
            (None, None, None) => None,
            _ => {
                return Err(AuthError::ConfigError(
                    "BOOTSTRAP_ADMIN_NAME, BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            jwt_secret,
            database_url: get("DATABASE_URL"),
            bootstrap_admin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
