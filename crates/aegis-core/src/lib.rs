//! AEGIS Core - Fundamental types for the resilience layer
//!
//! This crate defines the core types used throughout AEGIS:
//! - Fallback and quality levels (the degradation ladder)
//! - Time primitives (Timestamp, injectable clocks)
//! - Telemetry records (ErrorDetails, ErrorRecord, QueueEntry)
//! - Error taxonomy and result alias

pub mod error;
pub mod level;
pub mod record;
pub mod time;

pub use error::*;
pub use level::*;
pub use record::*;
pub use time::*;
