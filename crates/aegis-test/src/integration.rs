//! End-to-end scenario suite.
//!
//! Scenarios drive the stack the way an embedding application would:
//! through the dispatcher and boundary, with connectivity flapping,
//! delivery faults, and the clock under test control. One scenario runs
//! over a real HTTP endpoint and a real file to pin the wire and disk
//! contracts.

/// Messages a `log_burst` with this prefix produces, in order.
pub fn burst_messages(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}-{i}")).collect()
}
