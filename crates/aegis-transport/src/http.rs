//! HTTP delivery to the error-collection endpoint.

use std::time::Duration;

use async_trait::async_trait;

use aegis_core::{AegisError, AegisResult, ErrorRecord};

use crate::TelemetrySink;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// POSTs records as JSON to a fixed endpoint.
///
/// Status mapping: 2xx is delivered, 429 is the server pushing back
/// (expected under bursts, kept distinct in logs), anything else is a
/// delivery failure.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    /// Build a sink for the given endpoint URL.
    pub fn new(endpoint: impl Into<String>) -> AegisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AegisError::TransportError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Build a sink over an existing client (shared pools, custom TLS).
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// The endpoint this sink delivers to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TelemetrySink for HttpSink {
    async fn deliver(&self, record: &ErrorRecord) -> AegisResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| AegisError::TransportError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status.as_u16() == 429 {
            tracing::debug!("collection endpoint rate-limited the request");
            return Err(AegisError::ServerRateLimited);
        }
        Err(AegisError::UnexpectedStatus(status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use axum::extract::Json;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

    use aegis_core::{Capabilities, ErrorDetails, Timestamp};

    fn record() -> ErrorRecord {
        ErrorRecord {
            error: ErrorDetails::new("Error", "render failed"),
            context: serde_json::json!({"component": "scene"}),
            timestamp: Timestamp::from_secs(1).to_iso8601(),
            user_agent: "test-agent".into(),
            url: "https://example.test/xr".into(),
            capabilities: Some(Capabilities::none(Timestamp::from_secs(1))),
        }
    }

    async fn serve(status: StatusCode) -> SocketAddr {
        let app = Router::new().route(
            "/api/errors",
            post(move |Json(_body): Json<serde_json::Value>| async move {
                (status, Json(serde_json::json!({"status": "logged"})))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_delivers_on_200() {
        let addr = serve(StatusCode::OK).await;
        let sink = HttpSink::new(format!("http://{addr}/api/errors")).unwrap();
        assert!(sink.deliver(&record()).await.is_ok());
    }

    #[tokio::test]
    async fn test_429_maps_to_server_rate_limited() {
        let addr = serve(StatusCode::TOO_MANY_REQUESTS).await;
        let sink = HttpSink::new(format!("http://{addr}/api/errors")).unwrap();
        assert!(matches!(
            sink.deliver(&record()).await,
            Err(AegisError::ServerRateLimited)
        ));
    }

    #[tokio::test]
    async fn test_5xx_maps_to_unexpected_status() {
        let addr = serve(StatusCode::INTERNAL_SERVER_ERROR).await;
        let sink = HttpSink::new(format!("http://{addr}/api/errors")).unwrap();
        assert!(matches!(
            sink.deliver(&record()).await,
            Err(AegisError::UnexpectedStatus(500))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = HttpSink::new(format!("http://{addr}/api/errors")).unwrap();
        assert!(matches!(
            sink.deliver(&record()).await,
            Err(AegisError::TransportError(_))
        ));
    }
}
