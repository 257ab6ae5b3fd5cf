//! Fixed-cadence telemetry publisher
//!
//! Every tick the publisher takes one consistent snapshot of the engine,
//! turns it into a [`TelemetrySample`] and offers it to the sink. Samples
//! are pushed whether or not they changed. A full or disconnected sink
//! drops the sample; the next tick is unaffected.

use super::sample::{StallDetector, TelemetrySample};
use crate::timing::{EngineSnapshot, Micros, SharedEngine};
use crate::traits::{SinkError, TelemetrySink, TickSource};

/// Publishing counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PublisherStats {
    /// Samples accepted by the sink
    pub published: u32,
    /// Samples dropped because the sink was full or gone
    pub dropped: u32,
}

/// Telemetry publisher state
pub struct TelemetryPublisher {
    stall: StallDetector,
    stats: PublisherStats,
}

impl TelemetryPublisher {
    /// Create a publisher that reports unknown readings once no pickup
    /// edge arrived for `stall_timeout_us`
    pub const fn new(stall_timeout_us: u32) -> Self {
        Self {
            stall: StallDetector::new(stall_timeout_us),
            stats: PublisherStats {
                published: 0,
                dropped: 0,
            },
        }
    }

    /// Build the sample for `snapshot` as seen at `now`
    pub fn sample(&mut self, now: Micros, snapshot: &EngineSnapshot) -> TelemetrySample {
        let stalled = self.stall.is_stalled(now, snapshot.last_pickup, snapshot.pickup_edges);
        TelemetrySample::from_snapshot(snapshot, stalled)
    }

    /// Publish one sample without waiting on the sink
    pub fn publish<S: TelemetrySink>(
        &mut self,
        now: Micros,
        snapshot: &EngineSnapshot,
        sink: &mut S,
    ) -> Result<TelemetrySample, SinkError> {
        let sample = self.sample(now, snapshot);
        match sink.try_send(sample) {
            Ok(()) => {
                self.stats.published = self.stats.published.wrapping_add(1);
                Ok(sample)
            }
            Err(e) => {
                self.stats.dropped = self.stats.dropped.wrapping_add(1);
                Err(e)
            }
        }
    }

    /// Wait for the next scheduled tick, then snapshot and publish
    pub async fn step<T: TickSource, S: TelemetrySink>(
        &mut self,
        ticks: &mut T,
        engine: &SharedEngine,
        sink: &mut S,
    ) -> Result<TelemetrySample, SinkError> {
        let now = ticks.next_tick().await;
        let snapshot = engine.snapshot();
        self.publish(now, &snapshot, sink)
    }

    /// Publishing counters
    pub fn stats(&self) -> PublisherStats {
        self.stats
    }
}
