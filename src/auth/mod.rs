// Authentication module
// Registration, login, bearer tokens and self-or-admin access control over the user registry

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{
    delete_user_handler, home_handler, list_users_handler, login_handler, me_handler,
    register_handler, update_user_handler,
};
pub use middleware::AuthenticatedUser;
pub use models::{
    AuthResponse, LoginRequest, RegisterRequest, UpdateUserRequest, UserRecord, UserResponse,
};
pub use password::PasswordService;
pub use repository::UserRegistry;
pub use service::AuthService;
pub use token::TokenService;
