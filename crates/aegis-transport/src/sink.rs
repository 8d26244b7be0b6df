//! The delivery sink trait.

use async_trait::async_trait;

use aegis_core::{AegisResult, ErrorRecord};

/// A destination that accepts telemetry records one at a time.
///
/// `deliver` returning `Err` means the record was not accepted; the queue
/// decides whether the error class warrants retention and replay.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn deliver(&self, record: &ErrorRecord) -> AegisResult<()>;
}
