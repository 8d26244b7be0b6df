//! AEGIS Test Harness - fault injection and scenario validation
//!
//! This crate provides:
//! - Scriptable and chaotic delivery sinks
//! - Capability hosts that fail on demand
//! - A full-stack rig wiring store, queue, probe, dispatcher, and boundary
//! - A randomized driver for the fallback state machine
//! - End-to-end scenario tests, including real HTTP and durable files

pub mod faults;
pub mod harness;
pub mod integration;
pub mod state_fuzzer;

pub use faults::*;
pub use harness::*;
pub use integration::*;
pub use state_fuzzer::*;
