//! The capability probe: concurrent detection, caching, coalescing.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use aegis_core::{Capabilities, Clock};

use crate::HostCapabilities;

/// Caching front-end over [`HostCapabilities`].
///
/// The first `detect()` runs both host checks concurrently and caches the
/// snapshot for the probe's lifetime. Further calls return the cache.
/// Calls arriving while a probe is in flight await that probe's result
/// instead of starting a duplicate. `detect()` cannot fail.
pub struct CapabilityProbe {
    host: Arc<dyn HostCapabilities>,
    clock: Arc<dyn Clock>,
    slot: Mutex<ProbeSlot>,
}

#[derive(Default)]
struct ProbeSlot {
    cached: Option<Capabilities>,
    inflight: Option<watch::Receiver<Option<Capabilities>>>,
}

enum Role {
    Cached(Capabilities),
    Leader(watch::Sender<Option<Capabilities>>),
    Follower(watch::Receiver<Option<Capabilities>>),
}

impl CapabilityProbe {
    pub fn new(host: Arc<dyn HostCapabilities>, clock: Arc<dyn Clock>) -> Self {
        Self {
            host,
            clock,
            slot: Mutex::new(ProbeSlot::default()),
        }
    }

    /// The cached snapshot, if a probe has completed.
    ///
    /// Never suspends; the dispatcher uses this so a missing snapshot can
    /// never block error logging.
    pub fn cached(&self) -> Option<Capabilities> {
        self.slot.lock().cached
    }

    /// Detect device capabilities.
    pub async fn detect(&self) -> Capabilities {
        let role = {
            let mut slot = self.slot.lock();
            if let Some(caps) = slot.cached {
                Role::Cached(caps)
            } else if let Some(rx) = &slot.inflight {
                Role::Follower(rx.clone())
            } else {
                let (tx, rx) = watch::channel(None);
                slot.inflight = Some(rx);
                Role::Leader(tx)
            }
        };

        match role {
            Role::Cached(caps) => caps,
            Role::Leader(tx) => {
                let caps = self.run_probe().await;
                {
                    let mut slot = self.slot.lock();
                    slot.cached = Some(caps);
                    slot.inflight = None;
                }
                let _ = tx.send(Some(caps));
                caps
            }
            Role::Follower(mut rx) => {
                match rx.wait_for(|v| v.is_some()).await {
                    Ok(guard) => match *guard {
                        Some(caps) => caps,
                        None => self.run_probe().await,
                    },
                    // Leader vanished without publishing; probe directly.
                    Err(_) => self.run_probe().await,
                }
            }
        }
    }

    /// Drop the cached snapshot and detect again.
    ///
    /// A probe already in flight is joined, not raced: the fresh snapshot
    /// replaces the cache wholesale either way.
    pub async fn refresh(&self) -> Capabilities {
        {
            let mut slot = self.slot.lock();
            slot.cached = None;
        }
        self.detect().await
    }

    async fn run_probe(&self) -> Capabilities {
        let (xr, gl) = tokio::join!(
            self.host.xr_session_supported(),
            self.host.webgl_context_available()
        );

        if let Err(e) = &xr {
            tracing::debug!("XR support check failed, treating as unsupported: {}", e);
        }
        if let Err(e) = &gl {
            tracing::debug!("WebGL check failed, treating as unsupported: {}", e);
        }

        Capabilities {
            webxr_supported: xr.unwrap_or(false),
            webgl_supported: gl.unwrap_or(false),
            detected_at: self.clock.now(),
        }
    }
}
