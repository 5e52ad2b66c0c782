//! Credential-forwarding API gateways for the owner console.
//!
//! # Overview
//! Two gateways reach the external backend. `ClientGateway` is used by
//! interactive callers and only ever talks to the same-origin relay under
//! `/api`, letting its cookie jar carry the session. `ServerGateway` is used
//! by server-rendered boundaries and calls the backend origin directly,
//! forwarding the inbound request's `cookie` header explicitly.
//!
//! # Design
//! - Each gateway splits a call into `build_request` (pure), a `Transport`
//!   round-trip, and `parse_response` (pure), so the I/O boundary is explicit.
//! - Bodies are a closed `RequestBody` enum; invalid JSON text fails before
//!   a request exists.
//! - Response bodies always decode: non-JSON text becomes `{"raw": text}`.
//! - The client gateway raises `ApiError::Http`; the server gateway returns
//!   `ServerResponse { ok, status, data }`. Both carry status and body.

pub mod body;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod options;
pub mod owner;
pub mod server;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use body::{FormPayload, RequestBody};
pub use client::{ClientGateway, PROXY_PREFIX};
pub use config::{resolve_base_url, DEFAULT_BASE_URL};
pub use decode::decode_body;
pub use error::{ApiError, ApiResult};
pub use http::{join_url, CachePolicy, Credentials, HttpMethod, HttpRequest, HttpResponse, Payload};
pub use options::CallOptions;
pub use owner::GlobalFilters;
pub use server::{Inbound, ServerGateway, ServerResponse};
pub use session::{check_session, SessionDecision, OWNER_ROLE};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Location, OwnerSummary, RecordId, SessionUser};
