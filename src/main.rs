use std::sync::Arc;

use anyhow::Context;
use axum::http::Method;
use finance_auth::core::auth::{AuthApiState, AuthService, BcryptHasher, auth_api_router};
use finance_auth::core::config::AppConfig;
use finance_auth::core::db::{
    AccountRepository, CredentialStore, DbConfig, InMemoryCredentialStore,
    create_pool_with_migrations,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // RUST_LOG=
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Missing or weak token secrets abort startup
    let config = AppConfig::from_env().context("Invalid configuration")?;

    tracing::info!(
        "Config loaded: database={}, bind_addr={}, bcrypt_cost={}",
        config.has_database(),
        config.bind_addr,
        config.bcrypt_cost
    );

    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool_with_migrations(&DbConfig::new(url.clone()))
                .await
                .context("Failed to initialize database")?;
            Arc::new(AccountRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; accounts are kept in memory and lost on restart");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let auth_service = AuthService::new(
        store,
        Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        &config.secrets,
    );

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    let app = auth_api_router(AuthApiState { auth_service }).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}
