//! Error capture entry point.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use aegis_capability::CapabilityProbe;
use aegis_core::{Clock, ErrorDetails, ErrorRecord, Timestamp};
use aegis_queue::ErrorQueue;
use aegis_sanitize::{
    sanitize_context, sanitize_error_message, sanitize_error_name, sanitize_stack, sanitize_url,
    sanitize_user_agent,
};

use crate::AnalyticsSink;

/// Dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Reported user agent. Sanitized before use.
    pub user_agent: String,
    /// Reported page or scene URL. Sanitized before use.
    pub page_url: String,
    /// Attach sanitized stack traces to records. Off in release builds
    /// by default; stacks stay local there.
    pub include_stack: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            user_agent: "unknown".into(),
            page_url: "unknown".into(),
            include_stack: cfg!(debug_assertions),
        }
    }
}

/// Read-only aggregate over everything captured so far.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatcherStats {
    pub total_errors: u64,
    pub errors_by_component: HashMap<String, u64>,
    pub last_error_at: Option<Timestamp>,
    pub queue_size: usize,
}

#[derive(Default)]
struct Aggregate {
    total_errors: u64,
    errors_by_component: HashMap<String, u64>,
    last_error_at: Option<Timestamp>,
}

/// Builds sanitized records out of caught errors and hands them to the
/// queue and any analytics sinks.
///
/// [`log_error`](Self::log_error) never fails its caller: every failure
/// mode inside the pipeline is absorbed after the local log line has
/// been written.
pub struct TelemetryDispatcher {
    queue: Arc<ErrorQueue>,
    probe: Arc<CapabilityProbe>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
    analytics: Vec<Arc<dyn AnalyticsSink>>,
    aggregate: Mutex<Aggregate>,
}

impl TelemetryDispatcher {
    pub fn new(
        queue: Arc<ErrorQueue>,
        probe: Arc<CapabilityProbe>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            queue,
            probe,
            clock,
            config,
            analytics: Vec::new(),
            aggregate: Mutex::new(Aggregate::default()),
        }
    }

    /// Add an analytics sink to the fan-out set.
    pub fn with_analytics(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics.push(sink);
        self
    }

    /// Capture one error.
    ///
    /// The local log line is written first, so a telemetry failure can
    /// never suppress local diagnostics. The sanitized record then goes
    /// to the queue and to each analytics sink in turn; the capability
    /// snapshot rides along when the probe has one cached, and its
    /// absence never blocks capture.
    pub async fn log_error(&self, error: ErrorDetails, context: Value) {
        tracing::error!(
            name = %error.name,
            message = %error.message,
            "captured error"
        );

        let record = self.build_record(error, &context);

        {
            let mut agg = self.aggregate.lock();
            agg.total_errors += 1;
            if let Some(component) = record.component() {
                *agg
                    .errors_by_component
                    .entry(component.to_owned())
                    .or_default() += 1;
            }
            agg.last_error_at = Some(self.clock.now());
        }

        self.queue.enqueue_or_send(record.clone()).await;

        for sink in &self.analytics {
            if let Err(e) = sink.track_exception(&record).await {
                tracing::debug!(
                    sink = sink.name(),
                    error = %e,
                    "analytics sink rejected record"
                );
            }
        }
    }

    fn build_record(&self, error: ErrorDetails, context: &Value) -> ErrorRecord {
        let stack = error
            .stack
            .as_deref()
            .filter(|_| self.config.include_stack)
            .map(sanitize_stack);

        ErrorRecord {
            error: ErrorDetails {
                name: sanitize_error_name(&error.name),
                message: sanitize_error_message(&error.message),
                stack,
            },
            context: sanitize_context(context),
            timestamp: self.clock.now().to_iso8601(),
            user_agent: sanitize_user_agent(&self.config.user_agent),
            url: sanitize_url(&self.config.page_url),
            capabilities: self.probe.cached(),
        }
    }

    /// Aggregate counters plus the current queue depth.
    pub fn stats(&self) -> DispatcherStats {
        let agg = self.aggregate.lock();
        DispatcherStats {
            total_errors: agg.total_errors,
            errors_by_component: agg.errors_by_component.clone(),
            last_error_at: agg.last_error_at,
            queue_size: self.queue.len(),
        }
    }

    pub fn queue(&self) -> &Arc<ErrorQueue> {
        &self.queue
    }

    pub fn probe(&self) -> &Arc<CapabilityProbe> {
        &self.probe
    }
}
