mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState, TokenConfig},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(storefront_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = storefront_db::PoolConfig::from_app_config(&config);
    let pool = storefront_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = storefront_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending migrations");
    }

    if matches!(config.env, storefront_core::Environment::Development) {
        seed_demo_catalog(&pool, &config).await?;
    }

    let jwt_secret = Arc::new(config.jwt_secret.clone());
    let tokens = TokenConfig {
        jwt_secret: Arc::clone(&jwt_secret),
        access_ttl_minutes: config.access_token_ttl_minutes,
        refresh_ttl_minutes: config.refresh_token_ttl_minutes,
    };
    let auth = AuthState::new(jwt_secret);
    let app = build_app(AppState { pool, tokens }, auth, default_rate_limit_state());

    tracing::info!(addr = %config.bind_addr, env = %config.env, "listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Load the demo catalog into an empty development database.
///
/// A missing fixture file is not an error; local setups without one just
/// start empty.
async fn seed_demo_catalog(
    pool: &sqlx::PgPool,
    config: &storefront_core::AppConfig,
) -> anyhow::Result<()> {
    if !config.seed_path.exists() {
        tracing::debug!(path = %config.seed_path.display(), "no seed catalog file, skipping");
        return Ok(());
    }
    if !storefront_db::catalog_is_empty(pool).await? {
        tracing::debug!("catalog already populated, skipping seed");
        return Ok(());
    }

    let catalog = storefront_core::load_seed_catalog(&config.seed_path)?;
    let created = storefront_db::seed_catalog(pool, &catalog).await?;
    tracing::info!(
        products = created,
        path = %config.seed_path.display(),
        "seeded demo catalog"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
