//! Gateway for server-rendered callers.
//!
//! # Design
//! Calls go straight to the backend origin. A server-side hop has no cookie
//! jar, so the inbound request's `cookie` header is passed in explicitly as
//! `Inbound` and forwarded verbatim. Ordinary HTTP failures come back as
//! `ServerResponse { ok: false, .. }` so a render can branch on them; only
//! encoding and transport failures are `Err`.

use serde::Serialize;
use serde_json::Value;

use crate::decode::{decode_body, error_message};
use crate::error::ApiError;
use crate::http::{join_url, set_header, Credentials, HttpRequest, HttpResponse};
use crate::options::{build_request, CallOptions};
use crate::transport::Transport;

/// Credentials taken from the inbound request. Lives for one request only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inbound {
    cookie: Option<String>,
}

impl Inbound {
    /// No session to forward.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_cookie(cookie: &str) -> Self {
        Self::from_cookie_values([cookie])
    }

    /// Build from every `cookie` header value on the inbound request.
    /// HTTP/2 clients may split cookies across several header lines.
    pub fn from_cookie_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let parts: Vec<&str> = values.into_iter().filter(|v| !v.is_empty()).collect();
        let cookie = (!parts.is_empty()).then(|| parts.join("; "));
        Self { cookie }
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }
}

/// Uniform result of a server-side call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerResponse {
    pub ok: bool,
    pub status: u16,
    pub data: Value,
}

impl ServerResponse {
    /// Convert a failed response into the same error the client gateway raises.
    pub fn into_result(self) -> Result<Value, ApiError> {
        if self.ok {
            return Ok(self.data);
        }
        Err(ApiError::Http {
            message: error_message(&self.data),
            status: self.status,
            data: self.data,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerGateway<T> {
    transport: T,
    base_url: String,
}

impl<T> ServerGateway<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn build_request(&self, path: &str, inbound: &Inbound, options: CallOptions) -> Result<HttpRequest, ApiError> {
        let mut request = build_request(join_url(&self.base_url, path), options, Credentials::Omit)?;
        if let Some(cookie) = inbound.cookie() {
            set_header(&mut request.headers, "cookie", cookie);
        }
        Ok(request)
    }

    pub fn parse_response(&self, response: HttpResponse) -> ServerResponse {
        ServerResponse {
            ok: response.is_success(),
            status: response.status,
            data: decode_body(&response.body),
        }
    }
}

impl<T: Transport> ServerGateway<T> {
    pub async fn call(&self, path: &str, inbound: &Inbound, options: CallOptions) -> Result<ServerResponse, ApiError> {
        let request = self.build_request(path, inbound, options)?;
        let response = self.transport.execute(request).await?;
        let result = self.parse_response(response);
        if !result.ok {
            tracing::debug!(path, status = result.status, "backend returned an error status");
        }
        Ok(result)
    }

    /// Like `call`, but a non-2xx status becomes `ApiError::Http`.
    pub async fn call_or_error(&self, path: &str, inbound: &Inbound, options: CallOptions) -> Result<Value, ApiError> {
        self.call(path, inbound, options).await?.into_result()
    }
}
