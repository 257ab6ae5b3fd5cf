//! Seams between the core and the firmware
//!
//! The publisher talks to its clock and its output channel through these
//! traits so it can run on the host against scripted implementations.

pub mod telemetry;

pub use telemetry::{SinkError, TelemetrySink, TickSource};
