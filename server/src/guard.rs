//! Owner-only boundary for server-rendered routes.
//!
//! `OwnerSession` is an extractor: a handler that takes it only runs once the
//! backend has confirmed an owner identity for the inbound cookie. Every other
//! outcome short-circuits into a redirect or a placeholder page.

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};

use console_core::session::LOGIN_PATH;
use console_core::{check_session, Inbound, SessionDecision, SessionUser, OWNER_ROLE};

use crate::state::AppState;

/// Confirmed owner plus the credentials to make further calls on their behalf.
#[derive(Debug, Clone)]
pub struct OwnerSession {
    pub user: SessionUser,
    pub inbound: Inbound,
}

pub fn inbound_from(headers: &HeaderMap) -> Inbound {
    Inbound::from_cookie_values(headers.get_all(COOKIE).iter().filter_map(|v| v.to_str().ok()))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn unavailable_page() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(
            "<div><h1>Unable to load</h1>\
             <p>The owner console could not verify your session.</p></div>",
        ),
    )
        .into_response()
}

fn access_denied_page(user: &SessionUser) -> Response {
    let page = format!(
        "<div><h1>Access denied</h1>\
         <p>This application is restricted to the business owner.</p>\
         <p>Logged in as: {}</p></div>",
        escape_html(&user.email)
    );
    (StatusCode::FORBIDDEN, Html(page)).into_response()
}

/// Turn a guard decision into either the confirmed user or the response to
/// send instead.
pub fn enforce(decision: SessionDecision) -> Result<SessionUser, Response> {
    match decision {
        SessionDecision::Allowed(user) => Ok(user),
        SessionDecision::RedirectToLogin => Err(Redirect::to(LOGIN_PATH).into_response()),
        SessionDecision::Unavailable { status } => {
            tracing::warn!(?status, "session could not be confirmed, failing closed");
            Err(unavailable_page())
        }
        SessionDecision::AccessDenied { user } => {
            tracing::info!(email = %user.email, role = %user.role, "non-owner denied");
            Err(access_denied_page(&user))
        }
    }
}

impl FromRequestParts<AppState> for OwnerSession {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let inbound = inbound_from(&parts.headers);
        let decision = check_session(&*state.gateway, &inbound, OWNER_ROLE).await;
        let user = enforce(decision)?;
        Ok(OwnerSession { user, inbound })
    }
}
