//! In-process telemetry collector standing in for the backend.
//!
//! Accepts the same POST the layer sends in production and can be
//! switched into an outage to exercise the queue.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;

pub struct Collector {
    accepting: AtomicBool,
    received: Mutex<Vec<serde_json::Value>>,
}

impl Collector {
    pub fn new() -> Self {
        Self {
            accepting: AtomicBool::new(true),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.received.lock().len()
    }

    /// Error messages in the order they arrived.
    pub fn received_messages(&self) -> Vec<String> {
        self.received
            .lock()
            .iter()
            .filter_map(|body| body["error"]["message"].as_str().map(str::to_string))
            .collect()
    }
}

/// Bind an ephemeral port and serve the ingest route in the background.
pub async fn serve(collector: Arc<Collector>) -> std::io::Result<SocketAddr> {
    let app = Router::new()
        .route("/api/errors", post(ingest))
        .with_state(collector);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "collector stopped");
        }
    });
    Ok(addr)
}

async fn ingest(
    State(collector): State<Arc<Collector>>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !collector.accepting.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({"status": "down"})),
        );
    }
    collector.received.lock().push(body);
    (
        StatusCode::OK,
        Json(serde_json::json!({"status": "logged"})),
    )
}
