use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use user_registry::{
    config::AppConfig,
    create_router, db,
    storage::{InMemoryUserStore, PgUserStore, UserStore},
    AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("user_registry=debug,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("User Registry - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let state = AppState::new(store, &config.jwt_secret).expect("Failed to initialise auth");

    if let Some(admin) = &config.bootstrap_admin {
        state
            .auth_service
            .bootstrap_admin(&admin.name, &admin.email, &admin.password)
            .await
            .expect("Failed to seed bootstrap admin");
    }

    let app = create_router(state);

    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("User Registry is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
