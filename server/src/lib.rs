//! HTTP surface of the owner console.
//!
//! # Overview
//! - `/api/{*path}`: reverse-proxy relay to the backend origin, for every
//!   method the console uses.
//! - `/owner/overview`: server-rendered overview model, guarded by
//!   `OwnerSession`.
//!
//! The backend origin comes from `Config` at startup; nothing here hardcodes
//! it.

pub mod config;
pub mod error;
pub mod guard;
pub mod relay;
pub mod state;
pub mod views;

use axum::{
    routing::{get, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::RelayError;
pub use guard::OwnerSession;
pub use state::AppState;

fn relay_routes() -> MethodRouter<AppState> {
    get(relay::relay)
        .post(relay::relay)
        .put(relay::relay)
        .patch(relay::relay)
        .delete(relay::relay)
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/{*path}", relay_routes())
        .route("/owner/overview", get(views::overview))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}
