//! Error taxonomy for the resilience layer.

use thiserror::Error;

/// Core AEGIS errors
#[derive(Error, Debug)]
pub enum AegisError {
    // Rendering failures (caught by the fallback boundary)
    #[error("Rendering context creation failed: {0}")]
    ContextCreation(String),

    #[error("Immersive session initialization failed: {0}")]
    SessionInit(String),

    #[error("Render failure: {0}")]
    RenderFailure(String),

    // Capability probing
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    // Delivery errors
    #[error("Offline")]
    Offline,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Server rate limited the request")]
    ServerRateLimited,

    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    #[error("Transport error: {0}")]
    TransportError(String),

    // Storage errors
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Corrupt stored payload: {0}")]
    CorruptPayload(String),
}

impl AegisError {
    /// Whether a failed delivery with this error should keep the record
    /// queued for replay. Client-side rate-limit drops are lossy and never
    /// re-queued; everything else that can fail a send is retryable.
    pub fn is_retryable_delivery(&self) -> bool {
        matches!(
            self,
            AegisError::Offline
                | AegisError::ServerRateLimited
                | AegisError::UnexpectedStatus(_)
                | AegisError::TransportError(_)
        )
    }
}

/// Result type for AEGIS operations
pub type AegisResult<T> = Result<T, AegisError>;
