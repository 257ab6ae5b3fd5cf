//! Telemetry publishing
//!
//! Samples the timing engine on a fixed cadence and hands an immutable
//! copy to the outbound channel.

pub mod publisher;
pub mod sample;

pub use publisher::{PublisherStats, TelemetryPublisher};
pub use sample::{StallDetector, TelemetrySample};
