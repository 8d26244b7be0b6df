//! Full-stack rig for scenario tests.
//!
//! Wires a manual clock, an in-memory store, a fault-injecting sink, and
//! the capability probe into a dispatcher the way an embedding
//! application would, with every knob reachable from the test body.

use std::sync::Arc;
use std::time::Duration;

use aegis_capability::{CapabilityProbe, HostCapabilities, StaticHost};
use aegis_core::{Clock, ErrorDetails, ManualClock, Timestamp};
use aegis_fallback::{BoundaryConfig, FallbackBoundary};
use aegis_queue::{ErrorQueue, MemoryStore, QueueConfig};
use aegis_telemetry::{DispatcherConfig, TelemetryDispatcher};
use aegis_transport::Connectivity;

use crate::faults::FlakySink;

/// Everything a scenario needs, with shared handles kept open.
pub struct ResilienceRig {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<FlakySink>,
    pub connectivity: Connectivity,
    pub queue: Arc<ErrorQueue>,
    pub probe: Arc<CapabilityProbe>,
    pub dispatcher: Arc<TelemetryDispatcher>,
}

/// Rig construction knobs.
pub struct RigOptions {
    pub online: bool,
    pub queue: QueueConfig,
    pub dispatcher: DispatcherConfig,
}

impl Default for RigOptions {
    fn default() -> Self {
        Self {
            online: true,
            // Deterministic backoff under the manual clock.
            queue: QueueConfig {
                backoff_jitter_ms: 0,
                ..QueueConfig::default()
            },
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl ResilienceRig {
    pub fn new(
        options: RigOptions,
        sink: Arc<FlakySink>,
        host: Arc<dyn HostCapabilities>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1_000)));
        let store = Arc::new(MemoryStore::new());
        let connectivity = Connectivity::new(options.online);

        let queue = Arc::new(ErrorQueue::restore(
            Box::new(Arc::clone(&store)),
            Arc::clone(&sink) as Arc<dyn aegis_transport::TelemetrySink>,
            connectivity.clone(),
            Arc::clone(&clock) as Arc<dyn Clock>,
            options.queue,
        ));
        let probe = Arc::new(CapabilityProbe::new(
            host,
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let dispatcher = Arc::new(TelemetryDispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&probe),
            Arc::clone(&clock) as Arc<dyn Clock>,
            options.dispatcher,
        ));

        Self {
            clock,
            store,
            sink,
            connectivity,
            queue,
            probe,
            dispatcher,
        }
    }

    /// Reliable delivery, XR and WebGL both present.
    pub fn reliable(online: bool) -> Self {
        Self::new(
            RigOptions {
                online,
                ..RigOptions::default()
            },
            FlakySink::reliable(),
            Arc::new(StaticHost::new(true, true)),
        )
    }

    /// A boundary wired to this rig's dispatcher.
    pub fn boundary(&self, config: BoundaryConfig) -> FallbackBoundary {
        FallbackBoundary::new(config, Arc::clone(&self.dispatcher))
    }

    /// Log `count` errors named `prefix-0..`, each tagged with `prefix`
    /// as its component.
    pub async fn log_burst(&self, prefix: &str, count: usize) {
        for i in 0..count {
            self.dispatcher
                .log_error(
                    ErrorDetails::new("Error", format!("{prefix}-{i}")),
                    serde_json::json!({ "component": prefix }),
                )
                .await;
        }
    }

    pub fn go_offline(&self) {
        self.connectivity.set_online(false);
    }

    pub fn go_online(&self) {
        self.connectivity.set_online(true);
    }

    /// Flush repeatedly, advancing the clock past the backoff ceiling
    /// between passes, until the queue drains or `max_passes` is spent.
    pub async fn drain(&self, max_passes: usize) {
        let step = Duration::from_millis(self.queue.config().backoff_max_ms as u64 + 1);
        for _ in 0..max_passes {
            if self.queue.is_empty() {
                return;
            }
            self.queue.flush().await;
            self.clock.advance(step);
        }
    }

    /// Entry messages currently persisted in the store, oldest first.
    pub fn persisted_messages(&self) -> Vec<String> {
        let raw = match self.store.raw() {
            Some(raw) => raw,
            None => return Vec::new(),
        };
        let entries: Vec<aegis_core::QueueEntry> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        entries
            .into_iter()
            .map(|e| e.record.error.message)
            .collect()
    }
}
