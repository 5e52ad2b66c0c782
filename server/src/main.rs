//! Owner console server: relay and guarded views.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PORT` | `3000` | TCP port to listen on. |
//! | `CONSOLE_API_BASE_URL` | *(none)* | Backend origin. Blank values are ignored. |
//! | `API_BASE_URL` | `http://localhost:4000` | Backend origin when the first is unset. |
//! | `UPSTREAM_TIMEOUT_SECS` | *(none)* | Per-request timeout for backend calls. |

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use console_server::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("console_server=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env()?;
    let state = AppState::new(&config)?;

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(
        addr = %addr,
        upstream = %config.upstream_url,
        timeout = ?config.upstream_timeout,
        "owner console listening"
    );

    console_server::run(listener, state).await?;
    Ok(())
}
