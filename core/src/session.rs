//! Session guard for protected server-rendered boundaries.
//!
//! The guard fails closed: protected content is only allowed after the
//! identity endpoint positively confirms a user with the required role.

use serde_json::Value;

use crate::error::ApiError;
use crate::options::CallOptions;
use crate::server::{Inbound, ServerGateway, ServerResponse};
use crate::transport::Transport;
use crate::types::SessionUser;

pub const IDENTITY_PATH: &str = "/auth/me";
pub const OWNER_ROLE: &str = "owner";
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionDecision {
    /// Not authenticated. Terminal: send the browser to the login page.
    RedirectToLogin,
    /// Identity could not be confirmed (backend down, 5xx, bad payload).
    Unavailable { status: Option<u16> },
    /// Authenticated, but without the required role. Not retryable.
    AccessDenied { user: SessionUser },
    Allowed(SessionUser),
}

impl SessionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SessionDecision::Allowed(_))
    }
}

/// Decide from the outcome of the identity call.
pub fn decide(result: &Result<ServerResponse, ApiError>, required_role: &str) -> SessionDecision {
    let response = match result {
        Ok(response) => response,
        Err(_) => return SessionDecision::Unavailable { status: None },
    };
    if response.status == 401 {
        return SessionDecision::RedirectToLogin;
    }
    if !response.ok {
        return SessionDecision::Unavailable {
            status: Some(response.status),
        };
    }
    let user = match response.data.get("user") {
        Some(user @ Value::Object(_)) => user.clone(),
        _ => return SessionDecision::RedirectToLogin,
    };
    let user: SessionUser = match serde_json::from_value(user) {
        Ok(user) => user,
        Err(_) => {
            return SessionDecision::Unavailable {
                status: Some(response.status),
            }
        }
    };
    if !user.has_role(required_role) {
        return SessionDecision::AccessDenied { user };
    }
    SessionDecision::Allowed(user)
}

/// Call the identity endpoint with the inbound credentials and decide.
pub async fn check_session<T: Transport>(
    gateway: &ServerGateway<T>,
    inbound: &Inbound,
    required_role: &str,
) -> SessionDecision {
    let result = gateway.call(IDENTITY_PATH, inbound, CallOptions::get()).await;
    if let Err(e) = &result {
        tracing::warn!(error = %e, "identity check failed");
    }
    decide(&result, required_role)
}
