use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use console_core::config::resolve_from;

#[derive(Clone, Debug)]
pub struct Config {
    /// Backend origin the relay and the server gateway talk to.
    pub upstream_url: String,
    pub port: u16,
    /// Unset means no timeout, matching browser fetch.
    pub upstream_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let upstream_url = resolve_from(|name| env::var(name).ok());
        Url::parse(&upstream_url).with_context(|| format!("Invalid backend origin: {upstream_url}"))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("Invalid PORT")?;

        let upstream_timeout = match env::var("UPSTREAM_TIMEOUT_SECS") {
            Ok(v) if !v.trim().is_empty() => Some(Duration::from_secs(
                v.trim().parse().context("Invalid UPSTREAM_TIMEOUT_SECS")?,
            )),
            _ => None,
        };

        Ok(Config {
            upstream_url,
            port,
            upstream_timeout,
        })
    }

    pub fn for_upstream(upstream_url: &str) -> Self {
        Config {
            upstream_url: upstream_url.trim_end_matches('/').to_string(),
            port: 0,
            upstream_timeout: None,
        }
    }
}
