//! Fault injection for delivery and capability probing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use aegis_capability::HostCapabilities;
use aegis_core::{AegisError, AegisResult, ErrorRecord};
use aegis_transport::TelemetrySink;

/// One scripted delivery outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFault {
    /// Accept the record.
    Accept,
    /// Refuse with a transport error.
    Drop,
    /// Refuse with the endpoint's rate-limit response.
    Throttle,
}

struct Chaos {
    rng: StdRng,
    loss_rate: f64,
}

/// Delivery sink with scriptable and random failures.
///
/// Consumes its fault script first, one entry per delivery. With the
/// script empty it falls back to the seeded chaos rate, and with no chaos
/// configured it accepts everything. Accepted records are kept in arrival
/// order.
pub struct FlakySink {
    delivered: Mutex<Vec<ErrorRecord>>,
    script: Mutex<VecDeque<DeliveryFault>>,
    chaos: Mutex<Option<Chaos>>,
}

impl FlakySink {
    /// Accept everything.
    pub fn reliable() -> Arc<Self> {
        Arc::new(Self {
            delivered: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            chaos: Mutex::new(None),
        })
    }

    /// Apply `faults` in order, then accept everything.
    pub fn scripted(faults: impl IntoIterator<Item = DeliveryFault>) -> Arc<Self> {
        let sink = Self::reliable();
        sink.push_faults(faults);
        sink
    }

    /// Refuse a `loss_rate` fraction of deliveries, reproducibly.
    pub fn chaotic(seed: u64, loss_rate: f64) -> Arc<Self> {
        Arc::new(Self {
            delivered: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            chaos: Mutex::new(Some(Chaos {
                rng: StdRng::seed_from_u64(seed),
                loss_rate,
            })),
        })
    }

    /// Append scripted faults.
    pub fn push_faults(&self, faults: impl IntoIterator<Item = DeliveryFault>) {
        self.script.lock().extend(faults);
    }

    pub fn delivered(&self) -> Vec<ErrorRecord> {
        self.delivered.lock().clone()
    }

    /// Messages of accepted records, in arrival order.
    pub fn delivered_messages(&self) -> Vec<String> {
        self.delivered
            .lock()
            .iter()
            .map(|r| r.error.message.clone())
            .collect()
    }

    pub fn delivery_count(&self) -> usize {
        self.delivered.lock().len()
    }
}

#[async_trait]
impl TelemetrySink for FlakySink {
    async fn deliver(&self, record: &ErrorRecord) -> AegisResult<()> {
        let fault = {
            let scripted = self.script.lock().pop_front();
            match scripted {
                Some(fault) => fault,
                None => {
                    let mut chaos = self.chaos.lock();
                    match chaos.as_mut() {
                        Some(chaos) => {
                            if chaos.rng.gen_bool(chaos.loss_rate) {
                                DeliveryFault::Drop
                            } else {
                                DeliveryFault::Accept
                            }
                        }
                        None => DeliveryFault::Accept,
                    }
                }
            }
        };

        match fault {
            DeliveryFault::Accept => {
                self.delivered.lock().push(record.clone());
                Ok(())
            }
            DeliveryFault::Drop => {
                Err(AegisError::TransportError("injected network fault".into()))
            }
            DeliveryFault::Throttle => Err(AegisError::ServerRateLimited),
        }
    }
}

/// Host whose XR support check rejects outright while WebGL stays
/// answerable.
#[derive(Debug, Clone, Copy)]
pub struct XrRejectingHost {
    webgl: bool,
}

impl XrRejectingHost {
    pub fn new(webgl: bool) -> Self {
        Self { webgl }
    }
}

#[async_trait]
impl HostCapabilities for XrRejectingHost {
    async fn xr_session_supported(&self) -> AegisResult<bool> {
        Err(AegisError::CapabilityUnavailable(
            "XR device enumeration rejected".into(),
        ))
    }

    async fn webgl_context_available(&self) -> AegisResult<bool> {
        Ok(self.webgl)
    }
}
