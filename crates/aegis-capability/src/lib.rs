//! AEGIS Capability - what can this device actually render?
//!
//! Wraps the host's XR-session and WebGL-context checks behind a trait,
//! probes both concurrently, and caches the snapshot. The probe never
//! fails: an absent or throwing host API reads as "unsupported", not as an
//! error. Concurrent probes coalesce onto a single in-flight check.

pub mod host;
pub mod probe;

pub use host::*;
pub use probe::*;
