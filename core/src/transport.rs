//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! Gateways stay pure; this is the one place in the core crate that performs
//! I/O. `ReqwestTransport` plays the part of a browser's fetch: it resolves
//! relative URLs against an origin and keeps its own cookie jar, which is
//! only consulted for `Credentials::Include` requests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, Url};

use crate::body::{FormPayload, FormValue};
use crate::error::ApiError;
use crate::http::{CachePolicy, Credentials, HttpMethod, HttpRequest, HttpResponse, Payload};

/// Runs one request/response round-trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// reqwest-backed transport with a browser-style cookie jar.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    origin: Option<Url>,
    jar: Arc<Jar>,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Transport for absolute URLs only.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            origin: None,
            jar: Arc::new(Jar::default()),
        }
    }

    /// Transport that resolves relative URLs such as `/api/auth/me` against
    /// `origin`.
    pub fn with_origin(origin: &str) -> Result<Self, ApiError> {
        let origin = Url::parse(origin).map_err(|e| ApiError::Transport(format!("invalid origin {origin}: {e}")))?;
        Ok(Self {
            origin: Some(origin),
            ..Self::new()
        })
    }

    /// Abort requests that take longer than `timeout`. Off by default.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ApiError> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(self)
    }

    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    fn resolve(&self, url: &str) -> Result<Url, ApiError> {
        match (Url::parse(url), &self.origin) {
            (Ok(absolute), _) => Ok(absolute),
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(origin)) => origin
                .join(url)
                .map_err(|e| ApiError::Transport(format!("invalid url {url}: {e}"))),
            (Err(e), _) => Err(ApiError::Transport(format!("invalid url {url}: {e}"))),
        }
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Caller headers in order, then `cache-control: no-store` in place of any
/// caller value when the request bypasses caches.
fn outbound_headers(request: &HttpRequest) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::with_capacity(request.headers.len() + 1);
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::Transport(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ApiError::Transport(format!("invalid value for header {name}: {e}")))?;
        headers.append(name, value);
    }
    if request.cache == CachePolicy::NoStore {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }
    Ok(headers)
}

fn multipart_form(payload: FormPayload) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for field in payload.fields {
        form = match field.value {
            FormValue::Text(text) => form.text(field.name, text),
            FormValue::File {
                file_name,
                content_type,
                data,
            } => {
                let mut part = Part::bytes(data).file_name(file_name);
                if let Some(ct) = content_type {
                    part = part.mime_str(&ct).map_err(|e| ApiError::Serialization(e.to_string()))?;
                }
                form.part(field.name, part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = self.resolve(&request.url)?;
        let mut builder = self
            .client
            .request(reqwest_method(request.method), url.clone())
            .headers(outbound_headers(&request)?);

        let include = request.credentials == Credentials::Include;
        if include {
            if let Some(cookies) = self.jar.cookies(&url) {
                builder = builder.header(COOKIE, cookies);
            }
        }
        builder = match request.body {
            Some(Payload::Bytes(bytes)) => builder.body(bytes),
            Some(Payload::Multipart(form)) => builder.multipart(multipart_form(form)?),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(method = request.method.as_str(), url = %url, error = %e, "transport failure");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        if include {
            let mut set_cookies = response.headers().get_all(SET_COOKIE).iter();
            self.jar.set_cookies(&mut set_cookies, &url);
        }
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::debug!(method = request.method.as_str(), url = %url, status, "request completed");
        Ok(HttpResponse { status, headers, body })
    }
}
