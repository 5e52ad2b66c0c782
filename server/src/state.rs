use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::redirect::Policy;

use console_core::{ReqwestTransport, ServerGateway};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    /// Backend origin, without trailing slash.
    pub upstream: Arc<str>,
    /// Client used by the relay. Never follows redirects.
    pub client: reqwest::Client,
    pub gateway: Arc<ServerGateway<ReqwestTransport>>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().redirect(Policy::none());
        let mut transport = ReqwestTransport::new();
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
            transport = transport.with_timeout(timeout).context("building gateway transport")?;
        }
        let client = builder.build().context("building relay client")?;

        Ok(Self {
            upstream: Arc::from(config.upstream_url.trim_end_matches('/')),
            client,
            gateway: Arc::new(ServerGateway::new(transport, &config.upstream_url)),
        })
    }
}
