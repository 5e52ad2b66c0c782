//! Server-side session flow against the live mock backend.
//!
//! # Design
//! Starts the mock backend on a random port and drives the server gateway
//! over real HTTP with `ReqwestTransport`: log in, forward the cookie, run
//! the session guard and the owner loaders.

use console_core::owner::{fetch_owner_summary, load_locations, GlobalFilters};
use console_core::session::check_session;
use console_core::{
    CallOptions, HttpRequest, Inbound, ReqwestTransport, RequestBody, ServerGateway, SessionDecision, Transport,
    OWNER_ROLE,
};
use serde_json::json;

async fn start_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

/// Log in directly and return the `session=...` pair from `set-cookie`.
async fn login(gateway: &ServerGateway<ReqwestTransport>, email: &str, password: &str) -> String {
    let request: HttpRequest = gateway
        .build_request(
            "/auth/login",
            &Inbound::anonymous(),
            CallOptions::post(RequestBody::Json(json!({ "email": email, "password": password }))),
        )
        .unwrap();
    let response = gateway.transport().execute(request).await.unwrap();
    assert_eq!(response.status, 200);
    response
        .headers
        .iter()
        .filter(|(k, _)| k == "set-cookie")
        .map(|(_, v)| v.as_str())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn owner_session_lifecycle() {
    let base = start_backend().await;
    let gateway = ServerGateway::new(ReqwestTransport::new(), &base);

    // Step 1: no cookie, guard redirects.
    let decision = check_session(&gateway, &Inbound::anonymous(), OWNER_ROLE).await;
    assert_eq!(decision, SessionDecision::RedirectToLogin);

    // Step 2: log in and forward the cookie.
    let cookie = login(&gateway, "owner@example.com", "owner-pass").await;
    let inbound = Inbound::with_cookie(&cookie);
    let user = match check_session(&gateway, &inbound, OWNER_ROLE).await {
        SessionDecision::Allowed(user) => user,
        other => panic!("expected owner, got {other:?}"),
    };
    assert_eq!(user.email, "owner@example.com");

    // Step 3: loaders see the owner's data.
    let locations = load_locations(&gateway, &inbound, &user).await;
    assert_eq!(locations.len(), 2);

    let filters = GlobalFilters::from_query("locationId=1");
    let report = fetch_owner_summary(&gateway, &inbound, &filters).await.unwrap();
    assert_eq!(report.used_path, "/owner/summary?locationId=1");
    let summary = report.summary().unwrap();
    assert_eq!(summary.products_count, 42.0);
    assert_eq!(summary.sales_total_amount, 1250.0);

    // Step 4: logout ends the session.
    let result = gateway
        .call("/auth/logout", &inbound, CallOptions::post(RequestBody::Absent))
        .await
        .unwrap();
    assert!(result.ok);
    let decision = check_session(&gateway, &inbound, OWNER_ROLE).await;
    assert_eq!(decision, SessionDecision::RedirectToLogin);
}

#[tokio::test]
async fn cashier_is_denied() {
    let base = start_backend().await;
    let gateway = ServerGateway::new(ReqwestTransport::new(), &base);
    let cookie = login(&gateway, "cashier@example.com", "cashier-pass").await;

    match check_session(&gateway, &Inbound::with_cookie(&cookie), OWNER_ROLE).await {
        SessionDecision::AccessDenied { user } => assert_eq!(user.role, "cashier"),
        other => panic!("expected AccessDenied, got {other:?}"),
    }

    // The backend refuses the summary with 403, which is not a fallback case.
    let report = fetch_owner_summary(&gateway, &Inbound::with_cookie(&cookie), &GlobalFilters::default())
        .await
        .unwrap();
    assert_eq!(report.result.status, 403);
    assert_eq!(report.primary_failed, None);
}

#[tokio::test]
async fn html_error_page_decodes_as_raw() {
    let base = start_backend().await;
    let gateway = ServerGateway::new(ReqwestTransport::new(), &base);
    let result = gateway
        .call("/html-error", &Inbound::anonymous(), CallOptions::get())
        .await
        .unwrap();
    assert!(!result.ok);
    assert_eq!(result.status, 502);
    assert!(result.data["raw"].as_str().unwrap().starts_with("<html>"));
}

#[tokio::test]
async fn unknown_route_is_a_plain_404_result() {
    let base = start_backend().await;
    let gateway = ServerGateway::new(ReqwestTransport::new(), &base);
    let result = gateway
        .call("/dashboard/owner/summary", &Inbound::anonymous(), CallOptions::get())
        .await
        .unwrap();
    assert_eq!(result.status, 404);
    assert_eq!(result.data, serde_json::Value::Null);
}
