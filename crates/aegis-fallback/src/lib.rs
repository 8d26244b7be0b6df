//! AEGIS Fallback - deciding what the user actually gets to see.
//!
//! Three tiers: the full immersive experience, a plain rendered 3D canvas,
//! and a static 2D view. A pure state machine owns the transition rules;
//! the [`FallbackBoundary`] wraps it with telemetry, capability clamping,
//! and quality-driven auto-degrade. Rendering failures land here and are
//! absorbed into a tier change or an error view, never a crash.

pub mod boundary;
pub mod machine;

pub use boundary::*;
pub use machine::*;
