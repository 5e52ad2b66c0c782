use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(http::header::COOKIE, cookie);
    }
    builder.body(String::new()).unwrap()
}

/// `name=value` of the session cookie issued by a login response.
fn session_cookie(response: &axum::response::Response) -> String {
    response
        .headers()
        .get_all(http::header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

// --- auth ---

#[tokio::test]
async fn login_with_bad_credentials_returns_401() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            r#"{"email":"owner@example.com","password":"wrong"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get(http::header::SET_COOKIE).is_none());
    let body = body_json(resp).await;
    assert_eq!(body["error"], "invalid credentials");
}

#[tokio::test]
async fn login_issues_two_cookies() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            r#"{"email":"owner@example.com","password":"owner-pass"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get_all(http::header::SET_COOKIE).iter().count(), 2);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "owner@example.com");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn me_without_cookie_returns_401() {
    let resp = app().oneshot(get("/auth/me", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn data_routes_require_a_session() {
    for uri in ["/owner/summary", "/owner/locations", "/cash/ledger", "/credits", "/credits/10", "/audit", "/customers/search?q=a"] {
        let resp = app().oneshot(get(uri, Some("session=unknown"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

// --- diagnostics ---

#[tokio::test]
async fn echo_reflects_method_headers_and_body() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/echo/some/path?x=1")
                .header("x-trace", "t1")
                .body("hello".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["method"], "PATCH");
    assert_eq!(body["path"], "/echo/some/path");
    assert_eq!(body["query"], "x=1");
    assert_eq!(body["headers"]["x-trace"][0], "t1");
    assert_eq!(body["body"], "hello");
}

#[tokio::test]
async fn redirect_is_see_other() {
    let resp = app().oneshot(get("/redirect", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[http::header::LOCATION], "/auth/login");
}

#[tokio::test]
async fn html_error_is_not_json() {
    let resp = app().oneshot(get("/html-error", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&body).is_err());
}

// --- full session lifecycle ---

#[tokio::test]
async fn session_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // login
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/auth/login",
            r#"{"email":"owner@example.com","password":"owner-pass"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = session_cookie(&resp);

    // me
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/auth/me", Some(&format!("theme=dark; {cookie}"))))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["role"], "owner");
    assert_eq!(body["user"]["locationId"], 1);

    // ledger filtered by location
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/cash/ledger?locationId=3", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["ledger"].as_array().unwrap().len(), 2);

    // summary echoes filters
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/owner/summary?locationId=1&from=2024-01-01", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["summary"]["productsCount"], 42);
    assert_eq!(body["filters"]["from"], "2024-01-01");

    // unknown credit
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/credits/999", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // customer search
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/customers/search?q=grace", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["customers"][0]["name"], "Grace Hopper");

    // logout clears the session
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(http::header::COOKIE, &cookie)
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // me after logout is 401
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cashier_cannot_read_summary() {
    use tower::Service;

    let mut app = app().into_service();
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/auth/login",
            r#"{"email":"cashier@example.com","password":"cashier-pass"}"#,
        ))
        .await
        .unwrap();
    let cookie = session_cookie(&resp);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/owner/summary", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// --- streaming ---

#[tokio::test]
async fn download_streams_requested_size() {
    let resp = app().oneshot(get("/download/3", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(http::header::CONTENT_LENGTH).is_none());

    let body = body_bytes(resp).await;
    let expected: Vec<u8> = (0..3).flat_map(mock_server::download_chunk).collect();
    assert_eq!(body.len(), 3 * mock_server::DOWNLOAD_CHUNK);
    assert_eq!(&body[..], &expected[..]);
}
