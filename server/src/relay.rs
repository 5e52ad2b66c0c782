//! Same-origin reverse proxy to the backend.
//!
//! # Design
//! The browser only ever talks to this origin, so backend cookies stay
//! same-site. Requests are re-issued with the original method, headers (minus
//! `host` and hop-by-hop headers) and body stream. Redirects are relayed, not
//! followed. Bodies are streamed both ways.

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{
        header::{CONNECTION, HOST, SET_COOKIE},
        HeaderMap,
    },
    response::Response,
};

use console_core::{join_url, PROXY_PREFIX};

use crate::error::RelayError;
use crate::state::AppState;

/// Backend URL for an inbound `/api/...` URI: the remainder after the
/// prefix, query string preserved.
pub fn upstream_url(upstream: &str, path: &str, query: Option<&str>) -> Result<String, RelayError> {
    let rest = path
        .strip_prefix(PROXY_PREFIX)
        .filter(|rest| rest.starts_with('/'))
        .ok_or_else(|| RelayError::InvalidRequest(format!("path {path} is outside {PROXY_PREFIX}")))?;
    let mut url = join_url(upstream, rest);
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    Ok(url)
}

/// Connection-scoped headers (RFC 9110 §7.6.1). They describe one hop and are
/// never forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Drop the hop-by-hop set plus any header the `connection` header names.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect();
    for name in HOP_BY_HOP.iter().copied().chain(named.iter().map(String::as_str)) {
        headers.remove(name);
    }
}

/// Response headers to hand back: everything the backend sent, with every
/// `set-cookie` value re-asserted individually.
pub fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter().filter(|(name, _)| **name != SET_COOKIE) {
        headers.append(name.clone(), value.clone());
    }
    for cookie in upstream.get_all(SET_COOKIE) {
        headers.append(SET_COOKIE, cookie.clone());
    }
    strip_hop_by_hop(&mut headers);
    headers
}

pub async fn relay(State(state): State<AppState>, req: Request) -> Result<Response, RelayError> {
    let (parts, body) = req.into_parts();
    let target = upstream_url(&state.upstream, parts.uri.path(), parts.uri.query())?;

    let mut headers = parts.headers;
    headers.remove(HOST);
    strip_hop_by_hop(&mut headers);

    tracing::debug!(method = %parts.method, %target, "relaying request");

    let mut outbound = state.client.request(parts.method, &target).headers(headers);
    if body.size_hint().exact() != Some(0) {
        outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }
    let upstream = outbound.send().await?;

    let status = upstream.status();
    let headers = relay_headers(upstream.headers());
    tracing::debug!(%target, status = status.as_u16(), "upstream responded");

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn upstream_url_strips_prefix_and_keeps_query() {
        let url = upstream_url("http://backend.test", "/api/cash/ledger", Some("locationId=3")).unwrap();
        assert_eq!(url, "http://backend.test/cash/ledger?locationId=3");
    }

    #[test]
    fn upstream_url_rejects_foreign_paths() {
        assert!(upstream_url("http://backend.test", "/apix/cash", None).is_err());
        assert!(upstream_url("http://backend.test", "/owner/overview", None).is_err());
    }

    #[test]
    fn every_set_cookie_survives() {
        let mut upstream = HeaderMap::new();
        upstream.insert("content-type", HeaderValue::from_static("application/json"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("session=abc; Path=/"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("last_login=now; Path=/"));
        upstream.append("vary", HeaderValue::from_static("origin"));
        upstream.append("vary", HeaderValue::from_static("cookie"));

        let headers = relay_headers(&upstream);
        let cookies: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["session=abc; Path=/", "last_login=now; Path=/"]);
        assert_eq!(headers.get_all("vary").iter().count(), 2);
        assert_eq!(headers["content-type"], "application/json");
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive, X-Hop"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("upgrade", HeaderValue::from_static("websocket"));
        headers.insert("x-hop", HeaderValue::from_static("1"));
        headers.insert("x-request-id", HeaderValue::from_static("r-1"));
        headers.insert("cookie", HeaderValue::from_static("session=abc"));

        strip_hop_by_hop(&mut headers);
        let names: Vec<&str> = headers.keys().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert_eq!(headers["x-request-id"], "r-1");
        assert_eq!(headers["cookie"], "session=abc");
    }

    #[test]
    fn relayed_response_drops_hop_by_hop() {
        let mut upstream = HeaderMap::new();
        upstream.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        upstream.insert(CONNECTION, HeaderValue::from_static("close"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("session=abc; Path=/"));

        let headers = relay_headers(&upstream);
        assert!(headers.get("transfer-encoding").is_none());
        assert!(headers.get(CONNECTION).is_none());
        assert_eq!(headers[SET_COOKIE], "session=abc; Path=/");
    }
}
