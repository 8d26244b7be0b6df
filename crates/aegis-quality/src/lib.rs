//! AEGIS Quality - rolling performance classification.
//!
//! A frame-timing source feeds FPS samples in; the controller keeps a
//! single exponentially-smoothed average and classifies it into
//! reduced/normal/high bands. Consumers read adaptive spring parameters and
//! the hide threshold from here instead of hard-coding their own.

pub mod controller;
pub mod spring;

pub use controller::*;
pub use spring::*;
