//! Spring animation parameters shared with the renderer.

/// `{tension, friction}` pair for a spring animation.
///
/// Higher tension settles faster; higher friction damps harder. Both cost
/// less per frame than a loose, bouncy spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub tension: f64,
    pub friction: f64,
}

impl SpringConfig {
    pub fn new(tension: f64, friction: f64) -> Self {
        Self { tension, friction }
    }

    /// Soft entrance animations.
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0)
    }

    /// Playful overshoot.
    pub fn wobbly() -> Self {
        Self::new(180.0, 12.0)
    }

    /// Snappy UI response.
    pub fn stiff() -> Self {
        Self::new(210.0, 20.0)
    }

    /// Scale both parameters, keeping the result a valid spring.
    pub fn scaled(self, tension_scale: f64, friction_scale: f64) -> Self {
        Self {
            tension: self.tension * tension_scale,
            friction: self.friction * friction_scale,
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::new(170.0, 26.0)
    }
}
