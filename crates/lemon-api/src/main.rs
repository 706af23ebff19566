//! Lemon Stack API server entrypoint.
//!
//! Reads configuration from the environment, connects to Postgres when
//! `DATABASE_URL` is set, hydrates the in-memory stores, applies the
//! bootstrap manager, and serves the Axum application.

use anyhow::Context;

use lemon_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let port = config.port;

    let pool = lemon_api::db::init_pool()
        .await
        .context("database initialization failed")?;

    let state = AppState::with_config(config, pool);
    state.hydrate().await.context("state hydration failed")?;
    state
        .apply_bootstrap_manager()
        .await
        .context("bootstrap manager setup failed")?;

    let app = lemon_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "lemon-api listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;
    Ok(())
}

/// Initialize the tracing subscriber. `LEMON_LOG_JSON=true` switches to
/// JSON output; `RUST_LOG` controls the filter (default `info`).
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LEMON_LOG_JSON")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
