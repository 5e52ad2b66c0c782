use std::{collections::HashMap, sync::Arc};

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use futures_util::stream;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";
pub const DOWNLOAD_CHUNK: usize = 1024;
const MAX_DOWNLOAD_KB: usize = 4096;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub name: String,
    pub role: String,
    pub location_id: i64,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct Login {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone, Default)]
pub struct Backend {
    users: Arc<Vec<User>>,
    sessions: Arc<RwLock<HashMap<String, String>>>,
}

impl Backend {
    pub fn seeded() -> Self {
        Self {
            users: Arc::new(vec![
                User {
                    email: "owner@example.com".to_string(),
                    name: "Olive Owner".to_string(),
                    role: "owner".to_string(),
                    location_id: 1,
                    password: "owner-pass".to_string(),
                },
                User {
                    email: "cashier@example.com".to_string(),
                    name: "Cass Cashier".to_string(),
                    role: "cashier".to_string(),
                    location_id: 2,
                    password: "cashier-pass".to_string(),
                },
            ]),
            sessions: Arc::default(),
        }
    }

    async fn current_user(&self, headers: &HeaderMap) -> Option<User> {
        let token = session_token(headers)?;
        let email = self.sessions.read().await.get(&token).cloned()?;
        self.users.iter().find(|u| u.email == email).cloned()
    }
}

/// Value of the session cookie across every `cookie` header line.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn app() -> Router {
    app_with(Backend::seeded())
}

pub fn app_with(backend: Backend) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/logout", get(logout).post(logout))
        .route("/owner/summary", get(summary))
        .route("/owner/locations", get(locations))
        .route("/cash/ledger", get(ledger))
        .route("/credits", get(list_credits))
        .route("/credits/{id}", get(get_credit))
        .route("/audit", get(audit))
        .route("/customers/search", get(search_customers))
        .route("/echo", any(echo))
        .route("/echo/{*rest}", any(echo))
        .route("/download/{kb}", get(download))
        .route("/redirect", get(redirect))
        .route("/html-error", get(html_error))
        .with_state(backend)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response()
}

async fn login(State(backend): State<Backend>, Json(input): Json<Login>) -> Response {
    let Some(user) = backend
        .users
        .iter()
        .find(|u| u.email == input.email && u.password == input.password)
        .cloned()
    else {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid credentials"}))).into_response();
    };

    let token = Uuid::new_v4().to_string();
    backend.sessions.write().await.insert(token.clone(), user.email.clone());
    tracing::debug!(email = %user.email, "session issued");
    (
        AppendHeaders([
            (header::SET_COOKIE, format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")),
            (header::SET_COOKIE, "last_login=now; Path=/".to_string()),
        ]),
        Json(json!({ "user": user })),
    )
        .into_response()
}

async fn me(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    match backend.current_user(&headers).await {
        Some(user) => Json(json!({ "user": user })).into_response(),
        None => unauthorized(),
    }
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        backend.sessions.write().await.remove(&token);
    }
    (
        AppendHeaders([(header::SET_COOKIE, format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"))]),
        Json(json!({"ok": true})),
    )
        .into_response()
}

async fn summary(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(user) = backend.current_user(&headers).await else {
        return unauthorized();
    };
    if user.role != "owner" {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "owner only"}))).into_response();
    }
    Json(json!({
        "summary": {
            "usersCount": backend.users.len(),
            "productsCount": 42,
            "salesCount": 3,
            "salesTotalAmount": "1250.00",
            "paymentsCount": 2,
            "paymentsTotalAmount": 900,
        },
        "filters": params,
    }))
    .into_response()
}

async fn locations(State(backend): State<Backend>, headers: HeaderMap) -> Response {
    if backend.current_user(&headers).await.is_none() {
        return unauthorized();
    }
    Json(json!({"locations": [{"id": 1, "name": "Main Street"}, {"id": 2, "name": "Harbour"}]})).into_response()
}

fn ledger_rows() -> Vec<Value> {
    vec![
        json!({"id": 1, "locationId": 1, "direction": "IN", "type": "SALE_PAYMENT", "amount": 500}),
        json!({"id": 2, "locationId": 3, "direction": "IN", "type": "SALE_PAYMENT", "amount": "750.00"}),
        json!({"id": 3, "locationId": 3, "direction": "OUT", "type": "PETTY_CASH", "amount": 120}),
    ]
}

fn by_location(rows: Vec<Value>, params: &HashMap<String, String>) -> Vec<Value> {
    match params.get("locationId").and_then(|id| id.parse::<i64>().ok()) {
        Some(id) => rows.into_iter().filter(|r| r["locationId"] == id).collect(),
        None => rows,
    }
}

async fn ledger(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if backend.current_user(&headers).await.is_none() {
        return unauthorized();
    }
    Json(json!({ "ledger": by_location(ledger_rows(), &params) })).into_response()
}

fn credit_rows() -> Vec<Value> {
    vec![
        json!({"id": 10, "locationId": 1, "customer": "Ada", "amount": 300, "status": "OPEN"}),
        json!({"id": 11, "locationId": 2, "customer": "Grace", "amount": 80, "status": "SETTLED"}),
    ]
}

/// Narrow credits by `status` (any case), customer substring `q` and `limit`.
fn credit_query(rows: Vec<Value>, params: &HashMap<String, String>) -> Vec<Value> {
    let status = params.get("status").map(|s| s.to_uppercase()).unwrap_or_default();
    let q = params.get("q").map(|q| q.to_lowercase()).unwrap_or_default();
    let limit = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(usize::MAX);
    rows.into_iter()
        .filter(|c| status.is_empty() || c["status"] == status.as_str())
        .filter(|c| q.is_empty() || c["customer"].as_str().unwrap_or_default().to_lowercase().contains(&q))
        .take(limit)
        .collect()
}

async fn list_credits(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if backend.current_user(&headers).await.is_none() {
        return unauthorized();
    }
    let rows = credit_query(by_location(credit_rows(), &params), &params);
    Json(json!({ "credits": rows })).into_response()
}

async fn get_credit(State(backend): State<Backend>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if backend.current_user(&headers).await.is_none() {
        return unauthorized();
    }
    let found = credit_rows()
        .into_iter()
        .find(|c| c["id"].to_string() == id);
    match found {
        Some(credit) => Json(json!({ "credit": credit })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "credit not found"}))).into_response(),
    }
}

async fn audit(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if backend.current_user(&headers).await.is_none() {
        return unauthorized();
    }
    let rows = vec![
        json!({"id": "a1", "locationId": 1, "action": "SALE_CREATE", "entity": "sale", "entityId": 501, "userId": 2, "description": "Sale recorded"}),
        json!({"id": "a2", "locationId": 2, "action": "CREDIT_SETTLE", "entity": "credit", "entityId": 11, "userId": 1, "description": "Credit settled"}),
    ];
    Json(json!({ "audit": by_location(rows, &params) })).into_response()
}

async fn search_customers(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if backend.current_user(&headers).await.is_none() {
        return unauthorized();
    }
    let q = params.get("q").map(|q| q.to_lowercase()).unwrap_or_default();
    let customers: Vec<Value> = ["Ada Lovelace", "Grace Hopper", "Alan Turing"]
        .iter()
        .filter(|name| !q.is_empty() && name.to_lowercase().contains(&q))
        .map(|name| json!({ "name": name }))
        .collect();
    Json(json!({ "customers": customers })).into_response()
}

/// Reflect the request back so relay behavior can be inspected.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let mut seen: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers.iter() {
        seen.entry(name.as_str().to_string())
            .or_default()
            .push(value.to_str().unwrap_or_default().to_string());
    }
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": seen,
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Chunk `i` of a download: one KiB of a single letter, cycling `a..=z`.
pub fn download_chunk(i: usize) -> Vec<u8> {
    vec![b'a' + (i % 26) as u8; DOWNLOAD_CHUNK]
}

/// `kb` KiB streamed chunk by chunk, with no `content-length`.
async fn download(Path(kb): Path<usize>) -> Response {
    let chunks = (0..kb.min(MAX_DOWNLOAD_KB)).map(|i| Ok::<_, std::io::Error>(download_chunk(i)));
    Body::from_stream(stream::iter(chunks)).into_response()
}

async fn redirect() -> Redirect {
    Redirect::to("/auth/login")
}

async fn html_error() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::BAD_GATEWAY,
        Html("<html><body><h1>502 Bad Gateway</h1></body></html>"),
    )
}
