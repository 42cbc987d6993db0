// Authentication service - request-level authentication and authorization

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{AuthResponse, NewUser, RegisterRequest, UpdateUserRequest, UserResponse},
    repository::UserRegistry,
    token::{IdentityClaims, TokenService, TOKEN_TTL_SECONDS},
};

/// Why a caller was allowed to act on a target record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The caller is the target
    SelfAllowed,
    /// The caller is an admin acting on someone else
    AdminAllowed,
}

/// Self-or-admin rule for operations on `target_id`. Checks run in order and
/// the first that decides returns.
pub fn authorize_target(caller: &AuthenticatedUser, target_id: Uuid) -> Result<Access, AuthError> {
    if caller.user_id == target_id {
        return Ok(Access::SelfAllowed);
    }
    if caller.is_admin {
        return Ok(Access::AdminAllowed);
    }
    warn!(
        caller_id = %caller.user_id,
        caller_email = %caller.email,
        target_id = %target_id,
        "non-admin acting on another user"
    );
    Err(AuthError::Forbidden)
}

pub fn require_admin(caller: &AuthenticatedUser) -> Result<(), AuthError> {
    if caller.is_admin {
        Ok(())
    } else {
        warn!(caller_id = %caller.user_id, caller_email = %caller.email, "admin privilege required");
        Err(AuthError::Forbidden)
    }
}

/// Authentication service coordinating registry, hashing and tokens
pub struct AuthService {
    registry: UserRegistry,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(registry: UserRegistry, tokens: Arc<TokenService>) -> Self {
        Self { registry, tokens }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Register a new user.
    ///
    /// `is_admin: true` is honored only for an admin caller. The email
    /// pre-check runs before the registry's own validation and name check.
    pub async fn register(
        &self,
        caller: Option<&AuthenticatedUser>,
        request: RegisterRequest,
    ) -> Result<UserResponse, AuthError> {
        if request.is_admin == Some(true) {
            match caller {
                Some(admin) if admin.is_admin => {
                    info!(caller_id = %admin.user_id, caller_email = %admin.email, "admin creating privileged user");
                }
                _ => {
                    warn!("self-registration attempted to set admin flag");
                    return Err(AuthError::Forbidden);
                }
            }
        }

        if self.registry.find_by_email(&request.email).await?.is_some() {
            debug!("registration with an email already in use");
            return Err(AuthError::DuplicateEmail);
        }

        self.registry.create(NewUser::from(request)).await
    }

    /// Authenticate by email and password and issue a token.
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let user = match self.registry.find_by_email(email).await? {
            Some(user) => user,
            None => {
                debug!("login for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self
            .registry
            .passwords()
            .verify_password(password, &user.password_hash)
        {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(
            user.id,
            &IdentityClaims {
                email: user.email.clone(),
                is_admin: user.is_admin,
            },
        )?;

        info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_TTL_SECONDS,
            user: user.into(),
        })
    }

    /// Profile of the caller identified by a verified token
    pub async fn get_profile(&self, caller_id: Uuid) -> Result<UserResponse, AuthError> {
        self.registry
            .find_by_id(caller_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AuthError::NotFound)
    }

    /// Every record, stripped of password hashes. Admin only.
    pub async fn list_all(&self, caller: &AuthenticatedUser) -> Result<Vec<UserResponse>, AuthError> {
        require_admin(caller)?;

        let users = self.registry.list().await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Update a record: the caller's own unconditionally, anyone's as admin.
    /// Changing the admin flag always needs an admin caller.
    pub async fn update_user(
        &self,
        caller: &AuthenticatedUser,
        target_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, AuthError> {
        authorize_target(caller, target_id)?;
        if request.is_admin.is_some() {
            require_admin(caller)?;
        }

        self.registry.update(target_id, request.into()).await
    }

    /// Delete a record under the same self-or-admin rule as updates
    pub async fn delete_user(
        &self,
        caller: &AuthenticatedUser,
        target_id: Uuid,
    ) -> Result<(), AuthError> {
        let access = authorize_target(caller, target_id)?;
        self.registry.delete(target_id).await?;

        info!(caller_id = %caller.user_id, user_id = %target_id, ?access, "user deleted");
        Ok(())
    }

    /// Seed an admin record at startup unless one with that email exists.
    /// Returns the created record, or `None` if it was already present.
    pub async fn bootstrap_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<UserResponse>, AuthError> {
        if self.registry.find_by_email(email).await?.is_some() {
            debug!("bootstrap admin already present");
            return Ok(None);
        }

        let created = self
            .registry
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                is_admin: true,
            })
            .await;

        match created {
            Ok(admin) => {
                info!(user_id = %admin.id, "bootstrap admin created");
                Ok(Some(admin))
            }
            // Anyone can register first, so a taken name must not stop startup
            Err(AuthError::DuplicateName) | Err(AuthError::DuplicateEmail) => {
                warn!(name = %name, "bootstrap admin skipped: name or email already held by another user");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordService;
    use crate::storage::InMemoryUserStore;

    fn service() -> AuthService {
        let registry = UserRegistry::new(Arc::new(InMemoryUserStore::new()), PasswordService::new());
        let tokens = Arc::new(TokenService::new("service_test_secret").unwrap());
        AuthService::new(registry, tokens)
    }

    fn register_request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            is_admin: None,
        }
    }

    fn caller(user: &UserResponse) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user.id,
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }

    #[test]
    fn test_authorize_target_rules() {
        let me = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "me@x.com".to_string(),
            is_admin: false,
        };
        let admin = AuthenticatedUser {
            is_admin: true,
            ..me.clone()
        };

        assert_eq!(authorize_target(&me, me.user_id).unwrap(), Access::SelfAllowed);
        assert!(matches!(
            authorize_target(&me, Uuid::new_v4()),
            Err(AuthError::Forbidden)
        ));
        assert_eq!(authorize_target(&admin, admin.user_id).unwrap(), Access::SelfAllowed);
        assert_eq!(
            authorize_target(&admin, Uuid::new_v4()).unwrap(),
            Access::AdminAllowed
        );
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let ana = service
            .register(None, register_request("ana", "ana@x.com", "p1"))
            .await
            .unwrap();

        let auth = service.login("ana@x.com", "p1").await.unwrap();
        assert_eq!(auth.user, ana);
        assert_eq!(auth.expires_in, 86_400);

        let claims = service.tokens().verify(&auth.token).unwrap();
        assert_eq!(claims.sub, ana.id);
        assert_eq!(claims.email, "ana@x.com");
        assert!(!claims.is_admin);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service
            .register(None, register_request("ana", "ana@x.com", "p1"))
            .await
            .unwrap();

        let wrong_password = service.login("ana@x.com", "wrong").await.unwrap_err();
        let unknown_email = service.login("nobody@x.com", "p1").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.error_message(), unknown_email.error_message());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_checked_first() {
        let service = service();
        service
            .register(None, register_request("ana", "ana@x.com", "p1"))
            .await
            .unwrap();

        // Taken email wins over missing password
        let result = service
            .register(None, register_request("bob", "ana@x.com", ""))
            .await;
        assert!(matches!(result, Err(AuthError::DuplicateEmail)));

        let result = service
            .register(None, register_request("ana", "other@x.com", "p2"))
            .await;
        assert!(matches!(result, Err(AuthError::DuplicateName)));
    }

    #[tokio::test]
    async fn test_self_registration_cannot_grant_admin() {
        let service = service();
        let mut request = register_request("mallory", "m@x.com", "p1");
        request.is_admin = Some(true);

        let result = service.register(None, request.clone()).await;
        assert!(matches!(result, Err(AuthError::Forbidden)));

        let ana = service
            .register(None, register_request("ana", "ana@x.com", "p1"))
            .await
            .unwrap();
        let result = service.register(Some(&caller(&ana)), request).await;
        assert!(matches!(result, Err(AuthError::Forbidden)));

        let mut explicit_false = register_request("bob", "bob@x.com", "p1");
        explicit_false.is_admin = Some(false);
        assert!(!service.register(None, explicit_false).await.unwrap().is_admin);
    }

    #[tokio::test]
    async fn test_admin_can_register_admin() {
        let service = service();
        let root = service
            .bootstrap_admin("root", "root@x.com", "rootpw")
            .await
            .unwrap()
            .unwrap();
        assert!(root.is_admin);

        let mut request = register_request("ops", "ops@x.com", "p1");
        request.is_admin = Some(true);
        let ops = service.register(Some(&caller(&root)), request).await.unwrap();
        assert!(ops.is_admin);
    }

    #[tokio::test]
    async fn test_bootstrap_admin_is_idempotent() {
        let service = service();
        assert!(service
            .bootstrap_admin("root", "root@x.com", "rootpw")
            .await
            .unwrap()
            .is_some());
        assert!(service
            .bootstrap_admin("root", "root@x.com", "rootpw")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_admin_skips_taken_name() {
        let service = service();
        let squatter = service
            .register(None, register_request("root", "evil@x.com", "p1"))
            .await
            .unwrap();

        let seeded = service
            .bootstrap_admin("root", "root@x.com", "rootpw")
            .await
            .unwrap();
        assert!(seeded.is_none());

        // Nobody was promoted and no second record appeared
        assert!(service.login("root@x.com", "rootpw").await.is_err());
        let claims = service
            .tokens()
            .verify(&service.login("evil@x.com", "p1").await.unwrap().token)
            .unwrap();
        assert_eq!(claims.sub, squatter.id);
        assert!(!claims.is_admin);
    }

    #[tokio::test]
    async fn test_list_all_requires_admin() {
        let service = service();
        let ana = service
            .register(None, register_request("ana", "ana@x.com", "p1"))
            .await
            .unwrap();
        let root = service
            .bootstrap_admin("root", "root@x.com", "rootpw")
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(
            service.list_all(&caller(&ana)).await,
            Err(AuthError::Forbidden)
        ));
        assert_eq!(service.list_all(&caller(&root)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_self_other_and_admin() {
        let service = service();
        let ana = service
            .register(None, register_request("ana", "ana@x.com", "p1"))
            .await
            .unwrap();
        let bob = service
            .register(None, register_request("bob", "bob@x.com", "p2"))
            .await
            .unwrap();
        let root = service
            .bootstrap_admin("root", "root@x.com", "rootpw")
            .await
            .unwrap()
            .unwrap();

        let rename = |name: &str| UpdateUserRequest {
            name: Some(name.to_string()),
            ..Default::default()
        };

        let updated = service
            .update_user(&caller(&ana), ana.id, rename("ana2"))
            .await
            .unwrap();
        assert_eq!(updated.name, "ana2");

        assert!(matches!(
            service.update_user(&caller(&ana), bob.id, rename("hacked")).await,
            Err(AuthError::Forbidden)
        ));

        let updated = service
            .update_user(&caller(&root), bob.id, rename("robert"))
            .await
            .unwrap();
        assert_eq!(updated.name, "robert");

        assert!(matches!(
            service.update_user(&caller(&root), Uuid::new_v4(), rename("x")).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_only_admin_changes_admin_flag() {
        let service = service();
        let ana = service
            .register(None, register_request("ana", "ana@x.com", "p1"))
            .await
            .unwrap();
        let root = service
            .bootstrap_admin("root", "root@x.com", "rootpw")
            .await
            .unwrap()
            .unwrap();

        let promote = UpdateUserRequest {
            is_admin: Some(true),
            ..Default::default()
        };

        assert!(matches!(
            service.update_user(&caller(&ana), ana.id, promote.clone()).await,
            Err(AuthError::Forbidden)
        ));
        let promoted = service
            .update_user(&caller(&root), ana.id, promote)
            .await
            .unwrap();
        assert!(promoted.is_admin);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let service = service();
        let ana = service
            .register(None, register_request("ana", "ana@x.com", "p1"))
            .await
            .unwrap();
        let bob = service
            .register(None, register_request("bob", "bob@x.com", "p2"))
            .await
            .unwrap();
        let root = service
            .bootstrap_admin("root", "root@x.com", "rootpw")
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(
            service.delete_user(&caller(&ana), bob.id).await,
            Err(AuthError::Forbidden)
        ));

        service.delete_user(&caller(&ana), ana.id).await.unwrap();
        assert!(matches!(service.get_profile(ana.id).await, Err(AuthError::NotFound)));

        service.delete_user(&caller(&root), bob.id).await.unwrap();
        assert!(matches!(
            service.delete_user(&caller(&root), bob.id).await,
            Err(AuthError::NotFound)
        ));
    }
}
