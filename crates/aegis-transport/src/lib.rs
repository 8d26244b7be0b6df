//! AEGIS Transport - getting telemetry records off the device.
//!
//! A [`TelemetrySink`] is anywhere a record can be delivered; the shipped
//! implementation POSTs JSON to the collection endpoint. [`Connectivity`]
//! carries the online/offline signal the queue reacts to.

pub mod connectivity;
pub mod http;
pub mod sink;

pub use connectivity::*;
pub use http::*;
pub use sink::*;
