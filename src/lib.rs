pub mod auth;
pub mod config;
pub mod db;
pub mod storage;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    error::ErrorResponse, handlers, AuthError, AuthResponse, AuthService, LoginRequest,
    PasswordService, RegisterRequest, TokenService, UpdateUserRequest, UserRegistry,
    UserResponse,
};
use storage::UserStore;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register_handler,
        handlers::login_handler,
        handlers::list_users_handler,
        handlers::me_handler,
        handlers::update_user_handler,
        handlers::delete_user_handler,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            UpdateUserRequest,
            UserResponse,
            AuthResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "users", description = "User registration and management"),
        (name = "auth", description = "Login and token issuance")
    ),
    info(
        title = "User Registry API",
        version = "0.1.0",
        description = "User registration, authentication and self-or-admin access control"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
}

impl AppState {
    /// Wire the auth pipeline over `store`, signing tokens with `jwt_secret`
    pub fn new(store: Arc<dyn UserStore>, jwt_secret: &str) -> Result<Self, AuthError> {
        let token_service = Arc::new(TokenService::new(jwt_secret)?);
        let registry = UserRegistry::new(store, PasswordService::new());
        let auth_service = Arc::new(AuthService::new(registry, Arc::clone(&token_service)));

        Ok(Self {
            auth_service,
            token_service,
        })
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.auth_service)
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.token_service)
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS and tracing middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/home", get(handlers::home_handler))
        .route("/login", post(handlers::login_handler))
        .route(
            "/users",
            post(handlers::register_handler).get(handlers::list_users_handler),
        )
        .route("/users/me", get(handlers::me_handler))
        .route(
            "/users/:id",
            put(handlers::update_user_handler).delete(handlers::delete_user_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
