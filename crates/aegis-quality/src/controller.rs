//! The quality controller: rolling FPS average and band classification.

use aegis_core::QualityLevel;

use crate::SpringConfig;

/// One frame-performance measurement from the render loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySample {
    pub fps: f64,
    pub frame_time_ms: f64,
    /// False during warm-up (first frames after mount or a tier switch),
    /// when frame timing is dominated by one-off work.
    pub is_stable: bool,
}

impl QualitySample {
    pub fn stable(fps: f64) -> Self {
        Self {
            fps,
            frame_time_ms: if fps > 0.0 { 1000.0 / fps } else { 0.0 },
            is_stable: true,
        }
    }

    pub fn warmup(fps: f64) -> Self {
        Self {
            is_stable: false,
            ..Self::stable(fps)
        }
    }
}

/// Tunables for [`QualityController`].
#[derive(Debug, Clone, Copy)]
pub struct QualityConfig {
    /// Inclusive lower FPS bound of the high band.
    pub high_fps: f64,
    /// Inclusive lower FPS bound of the normal band.
    pub normal_fps: f64,
    /// Smoothing factor for the rolling average (weight of the newest
    /// sample).
    pub ema_alpha: f64,
    /// Opacity below which consumers skip rendering entirely.
    pub hide_threshold: f64,
    /// Whether springs adapt when quality drops to reduced.
    pub adaptive_quality: bool,
    /// Tension multiplier applied in the reduced band.
    pub reduced_tension_scale: f64,
    /// Friction multiplier applied in the reduced band.
    pub reduced_friction_scale: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            high_fps: 50.0,
            normal_fps: 30.0,
            ema_alpha: 0.2,
            hide_threshold: 0.01,
            adaptive_quality: true,
            reduced_tension_scale: 1.5,
            reduced_friction_scale: 1.2,
        }
    }
}

impl QualityConfig {
    /// Adaptive behavior switched off: presets pass through untouched at
    /// every quality level.
    pub fn fixed() -> Self {
        Self {
            adaptive_quality: false,
            ..Self::default()
        }
    }
}

/// Rolling FPS classifier.
///
/// Keeps exactly one smoothed scalar; no sample history. The average seeds
/// from the first sample, then follows an exponential moving average like
/// the loss-rate estimators elsewhere in the stack.
#[derive(Debug)]
pub struct QualityController {
    config: QualityConfig,
    average_fps: Option<f64>,
    consecutive_reduced: u32,
}

impl QualityController {
    pub fn new(config: QualityConfig) -> Self {
        Self {
            config,
            average_fps: None,
            consecutive_reduced: 0,
        }
    }

    /// Record the latest FPS reading.
    pub fn update_sample(&mut self, fps: f64) {
        let fps = fps.max(0.0);
        let avg = match self.average_fps {
            None => fps,
            Some(avg) => avg * (1.0 - self.config.ema_alpha) + fps * self.config.ema_alpha,
        };
        self.average_fps = Some(avg);

        if self.classify(avg) == QualityLevel::Reduced {
            self.consecutive_reduced += 1;
        } else {
            self.consecutive_reduced = 0;
        }
    }

    /// Consume a full sample; warm-up frames are skipped.
    pub fn observe(&mut self, sample: QualitySample) {
        if sample.is_stable {
            self.update_sample(sample.fps);
        }
    }

    /// The rolling average, or `None` before the first stable sample.
    pub fn average_fps(&self) -> Option<f64> {
        self.average_fps
    }

    /// Current quality band. Normal until evidence arrives.
    pub fn quality_level(&self) -> QualityLevel {
        match self.average_fps {
            None => QualityLevel::Normal,
            Some(avg) => self.classify(avg),
        }
    }

    /// Band for a given FPS value. Lower bounds are inclusive: exactly 30
    /// is normal, exactly 50 is high.
    pub fn classify(&self, fps: f64) -> QualityLevel {
        if fps >= self.config.high_fps {
            QualityLevel::High
        } else if fps >= self.config.normal_fps {
            QualityLevel::Normal
        } else {
            QualityLevel::Reduced
        }
    }

    /// Spring parameters adapted to the current band.
    ///
    /// Unchanged at normal/high. In the reduced band the spring gets
    /// stiffer and more damped so it settles in fewer frames, unless
    /// adaptation is disabled.
    pub fn adaptive_spring(&self, preset: SpringConfig) -> SpringConfig {
        if !self.config.adaptive_quality {
            return preset;
        }
        match self.quality_level() {
            QualityLevel::Reduced => preset.scaled(
                self.config.reduced_tension_scale,
                self.config.reduced_friction_scale,
            ),
            QualityLevel::Normal | QualityLevel::High => preset,
        }
    }

    /// Whether a component at this opacity should skip rendering.
    pub fn should_hide(&self, opacity: f64) -> bool {
        opacity < self.config.hide_threshold
    }

    /// How many consecutive updates have classified as reduced.
    ///
    /// The fallback boundary reads this to decide when sustained poor
    /// performance warrants a tier downgrade.
    pub fn consecutive_reduced(&self) -> u32 {
        self.consecutive_reduced
    }

    /// Forget all history (used after a tier switch).
    pub fn reset(&mut self) {
        self.average_fps = None;
        self.consecutive_reduced = 0;
    }
}

impl Default for QualityController {
    fn default() -> Self {
        Self::new(QualityConfig::default())
    }
}
