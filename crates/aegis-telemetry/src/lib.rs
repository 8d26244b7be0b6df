//! AEGIS Telemetry - building and dispatching sanitized error reports.
//!
//! The dispatcher is the single entry point the rest of the layer calls
//! when something breaks. It owns the aggregate counters and fans each
//! sanitized record out to the durable queue and the optional analytics
//! sinks. Capture never fails the caller.

pub mod analytics;
pub mod dispatcher;

pub use analytics::*;
pub use dispatcher::*;
