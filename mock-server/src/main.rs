use std::sync::Arc;

use mock_server::{sample_post, ServerState};
use tokio::{net::TcpListener, sync::RwLock};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;

    // a small seeded publication for manual poking
    let state = ServerState::new().seed(
        "blog.example.com",
        vec![
            sample_post("third-post", 5),
            sample_post("second-post", 12),
            sample_post("first-post", 3),
        ],
    );

    println!("listening on {addr}");
    mock_server::run_with(listener, Arc::new(RwLock::new(state))).await
}
