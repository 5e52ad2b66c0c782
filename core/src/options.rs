//! Per-call options shared by both gateways.

use crate::body::{self, RequestBody};
use crate::error::ApiError;
use crate::http::{set_header, CachePolicy, Credentials, HttpMethod, HttpRequest};

#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    pub cache: CachePolicy,
}

impl CallOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: impl Into<RequestBody>) -> Self {
        Self::with_body(HttpMethod::Post, body)
    }

    pub fn with_body(method: HttpMethod, body: impl Into<RequestBody>) -> Self {
        Self {
            method,
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }
}

/// Encode the body and assemble the request. Fails before any I/O when the
/// body is rejected by the encoder.
pub(crate) fn build_request(
    url: String,
    options: CallOptions,
    credentials: Credentials,
) -> Result<HttpRequest, ApiError> {
    let encoded = body::encode(options.body)?;
    let mut headers = options.headers;
    if let Some(content_type) = encoded.content_type {
        set_header(&mut headers, "content-type", content_type);
    }
    Ok(HttpRequest {
        method: options.method,
        url,
        headers,
        body: encoded.payload,
        cache: options.cache,
        credentials,
    })
}
