//! Telemetry channel and tick source traits

use crate::telemetry::TelemetrySample;
use crate::timing::Micros;

/// Why a sample could not be handed off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    /// Channel has no free slot
    Full,
    /// Nobody is listening on the other side
    Disconnected,
}

/// Outbound telemetry channel
///
/// Implementations must never block: a sample that cannot be queued right
/// away is reported as an error and dropped by the caller.
pub trait TelemetrySink {
    /// Queue a sample without waiting
    fn try_send(&mut self, sample: TelemetrySample) -> Result<(), SinkError>;
}

/// Scheduled tick source
///
/// Each call resolves at the next scheduled tick and yields the current
/// time on the edge timestamp counter.
pub trait TickSource {
    /// Wait for the next tick
    fn next_tick(&mut self) -> impl core::future::Future<Output = Micros>;
}
