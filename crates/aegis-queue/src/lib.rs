//! AEGIS Queue - the durable half of the telemetry pipeline.
//!
//! Records that cannot be delivered right now wait here: a bounded FIFO
//! that evicts its oldest entry rather than rejecting new ones, persisted
//! through a [`QueueStore`] so pending telemetry survives reloads and
//! offline periods. A wall-clock rate limiter bounds how much an error
//! burst can put on the wire, and replay backs off exponentially per entry.

pub mod limiter;
pub mod queue;
pub mod store;

pub use limiter::*;
pub use queue::*;
pub use store::*;
