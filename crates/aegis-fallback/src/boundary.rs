//! The side-effect shell around the state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use aegis_core::{ErrorDetails, FallbackLevel};
use aegis_quality::{QualityController, QualitySample, SpringConfig};
use aegis_sanitize::{sanitize_error_message, sanitize_error_name, sanitize_stack};
use aegis_telemetry::TelemetryDispatcher;

use crate::{FallbackEvent, FallbackState, Transition};

/// Boundary settings.
#[derive(Debug, Clone)]
pub struct BoundaryConfig {
    /// Component name reported in telemetry context.
    pub component: String,
    pub initial_level: FallbackLevel,
    /// Retries allowed per level before Retry becomes a no-op.
    pub max_retries: u32,
    /// Consecutive Reduced-quality observations before an automatic
    /// Degrade. Zero disables auto-degrade.
    pub auto_degrade_after: u32,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            component: "xr-scene".into(),
            initial_level: FallbackLevel::Immersive,
            max_retries: 3,
            auto_degrade_after: 5,
        }
    }
}

type ErrorCallback = Box<dyn Fn(&ErrorDetails) + Send + Sync>;

/// Wraps [`FallbackState`] with everything the pure machine refuses to
/// know about: telemetry, the caller's error callback, capability
/// clamping, and quality-driven auto-degrade.
///
/// All mutation goes through the transition function; the boundary only
/// decides when to fire it and what to do with the outcome. A dismounted
/// boundary ignores late results instead of mutating dead state.
pub struct FallbackBoundary {
    config: BoundaryConfig,
    dispatcher: Arc<TelemetryDispatcher>,
    state: Mutex<FallbackState>,
    last_error: Mutex<Option<ErrorDetails>>,
    quality: Mutex<QualityController>,
    alive: AtomicBool,
    on_error: Option<ErrorCallback>,
}

impl FallbackBoundary {
    pub fn new(config: BoundaryConfig, dispatcher: Arc<TelemetryDispatcher>) -> Self {
        let state = FallbackState::mount(config.initial_level);
        Self {
            config,
            dispatcher,
            state: Mutex::new(state),
            last_error: Mutex::new(None),
            quality: Mutex::new(QualityController::default()),
            alive: AtomicBool::new(true),
            on_error: None,
        }
    }

    /// Replace the default quality controller.
    pub fn with_quality(mut self, controller: QualityController) -> Self {
        self.quality = Mutex::new(controller);
        self
    }

    /// Called with the sanitized error after each catch.
    pub fn with_error_callback(
        mut self,
        callback: impl Fn(&ErrorDetails) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Handle a failure in the wrapped content.
    ///
    /// Marks the error state, stores the sanitized error for the error
    /// view, reports through telemetry with the boundary's component and
    /// level attached, then fires the caller's callback. The level never
    /// changes here; the embedding UI offers the explicit next-fallback
    /// action.
    pub async fn catch_error(&self, error: ErrorDetails) {
        if !self.alive.load(Ordering::SeqCst) {
            return;
        }

        let snapshot = {
            let mut state = self.state.lock();
            let (next, _) = state.apply(FallbackEvent::Catch, self.config.max_retries);
            *state = next;
            next
        };

        let sanitized = ErrorDetails {
            name: sanitize_error_name(&error.name),
            message: sanitize_error_message(&error.message),
            stack: error.stack.as_deref().map(sanitize_stack),
        };
        *self.last_error.lock() = Some(sanitized.clone());

        self.dispatcher
            .log_error(
                error,
                serde_json::json!({
                    "component": self.config.component,
                    "fallbackLevel": snapshot.level.name(),
                    "retryCount": snapshot.retry_count,
                }),
            )
            .await;

        if let Some(callback) = &self.on_error {
            callback(&sanitized);
        }
    }

    /// Move to the next stricter level. At the floor this is a no-op.
    pub fn degrade(&self) -> FallbackState {
        let (next, transition) = {
            let mut state = self.state.lock();
            let out = state.apply(FallbackEvent::Degrade, self.config.max_retries);
            *state = out.0;
            out
        };

        match transition {
            Transition::Applied => {
                // Fresh level, fresh frame-rate history.
                self.quality.lock().reset();
                *self.last_error.lock() = None;
                tracing::info!(level = next.level.name(), "degraded to stricter level");
            }
            Transition::AtFloor => {
                tracing::debug!("degrade requested at floor level");
            }
            Transition::RetriesExhausted => {}
        }
        next
    }

    /// Re-attempt the current level, bounded by the retry budget.
    pub fn retry(&self) -> FallbackState {
        let (next, transition) = {
            let mut state = self.state.lock();
            let out = state.apply(FallbackEvent::Retry, self.config.max_retries);
            *state = out.0;
            out
        };

        match transition {
            Transition::Applied => {
                *self.last_error.lock() = None;
                tracing::info!(
                    retry = next.retry_count,
                    max = self.config.max_retries,
                    "retrying current level"
                );
            }
            Transition::RetriesExhausted => {
                tracing::debug!("retries exhausted, error view stays");
            }
            Transition::AtFloor => {}
        }
        next
    }

    /// Observe one frame-timing sample.
    ///
    /// Returns the new state when sustained Reduced quality triggered an
    /// automatic degrade. Warm-up samples are skipped by the controller.
    pub fn observe_sample(&self, sample: QualitySample) -> Option<FallbackState> {
        if !self.alive.load(Ordering::SeqCst) {
            return None;
        }

        let should_degrade = {
            let mut quality = self.quality.lock();
            quality.observe(sample);
            self.config.auto_degrade_after > 0
                && quality.consecutive_reduced() >= self.config.auto_degrade_after
        };

        if !should_degrade {
            return None;
        }
        // At the floor there is nothing left to shed.
        if self.state.lock().level.is_floor() {
            return None;
        }

        Some(self.degrade())
    }

    /// Spring parameters for the wrapped content under current quality.
    pub fn spring(&self, preset: SpringConfig) -> SpringConfig {
        self.quality.lock().adaptive_spring(preset)
    }

    /// Align the level with what the device can actually do.
    ///
    /// Runs (or joins) the capability probe and clamps the level down to
    /// the best supported tier. A boundary dismounted while the probe was
    /// in flight ignores the late result.
    pub async fn align_to_capabilities(&self) -> FallbackState {
        let capabilities = self.dispatcher.probe().detect().await;

        let mut state = self.state.lock();
        if self.alive.load(Ordering::SeqCst) {
            let best = capabilities.best_level();
            if best.is_stricter_than(state.level) {
                tracing::info!(
                    from = state.level.name(),
                    to = best.name(),
                    "clamping level to device capabilities"
                );
                *state = FallbackState::mount(best);
            }
        }
        *state
    }

    pub fn state(&self) -> FallbackState {
        *self.state.lock()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.lock().is_terminal()
    }

    /// The sanitized error shown by the error view, if any.
    pub fn last_error(&self) -> Option<ErrorDetails> {
        self.last_error.lock().clone()
    }

    /// Stop reacting to late results and samples.
    pub fn dismount(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }
}
