use tokio::net::TcpListener;

/// Standalone mock backend for running the console against by hand.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt().with_target(false).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "4000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, users = "owner@example.com, cashier@example.com", "mock backend listening");
    mock_server::run(listener).await
}
