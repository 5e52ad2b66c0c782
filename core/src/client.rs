//! Gateway for interactive (browser-side) callers.
//!
//! # Design
//! Every request targets the same-origin relay prefix; the backend origin is
//! never known here. Requests always carry `Credentials::Include` so the
//! transport's cookie jar supplies the session, and caching defaults to
//! `no-store`. Non-2xx responses become `ApiError::Http`; success returns the
//! decoded body unwrapped.

use serde_json::Value;

use crate::decode::{decode_body, error_message};
use crate::error::ApiError;
use crate::http::{join_url, Credentials, HttpRequest, HttpResponse};
use crate::options::{build_request, CallOptions};
use crate::transport::Transport;

/// Path prefix the relay is mounted on.
pub const PROXY_PREFIX: &str = "/api";

#[derive(Debug, Clone)]
pub struct ClientGateway<T> {
    transport: T,
}

impl<T> ClientGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_request(&self, path: &str, options: CallOptions) -> Result<HttpRequest, ApiError> {
        build_request(join_url(PROXY_PREFIX, path), options, Credentials::Include)
    }

    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let data = decode_body(&response.body);
        if response.is_success() {
            return Ok(data);
        }
        Err(ApiError::Http {
            message: error_message(&data),
            status: response.status,
            data,
        })
    }
}

impl<T: Transport> ClientGateway<T> {
    pub async fn call(&self, path: &str, options: CallOptions) -> Result<Value, ApiError> {
        let request = self.build_request(path, options)?;
        let response = self.transport.execute(request).await?;
        self.parse_response(response)
    }
}
