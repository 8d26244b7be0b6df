//! AEGIS Sanitize - scrubbing untrusted error text before it leaves the process
//!
//! Error names, messages, stacks, and context maps originate in the wild:
//! exception text can carry file-system paths, markup, injection attempts,
//! and credentials pasted into messages. Everything that reaches the
//! telemetry endpoint goes through this crate first.
//!
//! All functions are pure and total: they never panic and always return
//! output no longer than the caller-specified bound.

pub mod context;
pub mod scrub;

pub use context::*;
pub use scrub::*;
