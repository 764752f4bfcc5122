//! API server entry point.

use std::error::Error;
use std::sync::Arc;

use api::Backend;
use api::auth::TokenAuthenticator;
use api::config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use shop_store::{InMemoryShopStore, PostgresShopStore};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Load API tokens
    let authenticator = TokenAuthenticator::from_grants(&config.api_tokens);
    if authenticator.is_empty() {
        tracing::warn!("API_TOKENS is empty; every authenticated route will answer 401");
    }

    // 4. Pick the storage backend and seed the token holders as users
    match config.database_url.as_deref() {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let store = PostgresShopStore::new(pool);
            store.run_migrations().await?;
            for principal in authenticator.principals() {
                let name = principal.name().map_or_else(|| principal.id().to_string(), str::to_string);
                store.register_user(principal.id(), &name).await?;
            }
            tracing::info!("using PostgreSQL shop store");
            serve(store, authenticator, &config, metrics_handle).await
        }
        None => {
            let store = InMemoryShopStore::new();
            for principal in authenticator.principals() {
                let name = principal.name().map_or_else(|| principal.id().to_string(), str::to_string);
                store.register_user(principal.id(), name).await;
            }
            tracing::info!("DATABASE_URL not set, using in-memory shop store");
            serve(store, authenticator, &config, metrics_handle).await
        }
    }
}

async fn serve<S: Backend>(
    store: S,
    authenticator: TokenAuthenticator,
    config: &Config,
    metrics_handle: PrometheusHandle,
) -> Result<(), BoxError> {
    // 5. Build the application
    let state = api::create_state(store, Arc::new(authenticator), config);
    let app = api::create_app(state, metrics_handle, config.body_limit());

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}
