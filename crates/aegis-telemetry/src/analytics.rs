//! Optional analytics fan-out.
//!
//! Mirrors the guarded-global pattern of host pages: an analytics
//! integration may or may not be present, and its absence or failure must
//! never affect error capture. Sinks are injected; the default set is
//! empty.

use async_trait::async_trait;

use aegis_core::{AegisResult, ErrorRecord};

/// One analytics destination for captured errors.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &str;

    /// Forward one record. Errors are logged at debug level by the
    /// dispatcher and otherwise ignored.
    async fn track_exception(&self, record: &ErrorRecord) -> AegisResult<()>;
}

/// Sink that accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

#[async_trait]
impl AnalyticsSink for NoopAnalytics {
    fn name(&self) -> &str {
        "noop"
    }

    async fn track_exception(&self, _record: &ErrorRecord) -> AegisResult<()> {
        Ok(())
    }
}

/// Sink shaped like a GA `gtag('event', 'exception', ...)` call.
///
/// Emits each record as a flat exception event over tracing; stands in
/// for a hosted analytics product in environments without one.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

#[async_trait]
impl AnalyticsSink for TracingAnalytics {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn track_exception(&self, record: &ErrorRecord) -> AegisResult<()> {
        tracing::info!(
            target: "aegis::analytics",
            name = %record.error.name,
            message = %record.error.message,
            component = record.component().unwrap_or("unknown"),
            fatal = false,
            "exception"
        );
        Ok(())
    }
}

/// Sink shaped like a Sentry `capture_exception(error, {tags, extra})`
/// call: the error with component and fallback-level tags, and the
/// sanitized context riding along as extra data.
#[derive(Debug, Default, Clone, Copy)]
pub struct SentryStyleAnalytics;

#[async_trait]
impl AnalyticsSink for SentryStyleAnalytics {
    fn name(&self) -> &str {
        "sentry-style"
    }

    async fn track_exception(&self, record: &ErrorRecord) -> AegisResult<()> {
        let fallback_level = record
            .context
            .get("fallbackLevel")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        tracing::info!(
            target: "aegis::analytics",
            name = %record.error.name,
            message = %record.error.message,
            tags.component = record.component().unwrap_or("unknown"),
            tags.fallback_level = fallback_level,
            extra = %record.context,
            "capture_exception"
        );
        Ok(())
    }
}
