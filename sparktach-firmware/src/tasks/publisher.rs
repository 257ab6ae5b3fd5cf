//! Telemetry publisher task
//!
//! Samples the engine on a fixed tick and queues the reading for the link.
//! Runs regardless of whether anything changed.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Instant, Ticker};

use sparktach_core::telemetry::{TelemetryPublisher, TelemetrySample};
use sparktach_core::timing::Micros;
use sparktach_core::traits::{SinkError, TelemetrySink, TickSource};

use crate::channels::{TELEMETRY_CHANNEL, TELEMETRY_CHANNEL_SIZE};
use crate::ENGINE;

/// Log diagnostics every this many ticks
const DIAGNOSTICS_EVERY: u32 = 250;

/// Publisher timing, taken from `engine.toml`
#[derive(Clone, Copy, Format)]
pub struct PublisherConfig {
    pub interval_us: u32,
    pub stall_timeout_us: u32,
}

/// Embassy ticker stamped with the uptime clock
struct TickerSource {
    ticker: Ticker,
}

impl TickSource for TickerSource {
    async fn next_tick(&mut self) -> Micros {
        self.ticker.next().await;
        Micros::from_uptime(Instant::now().as_micros())
    }
}

/// Non-blocking sink onto the telemetry channel
struct ChannelSink {
    sender: Sender<'static, CriticalSectionRawMutex, TelemetrySample, TELEMETRY_CHANNEL_SIZE>,
}

impl TelemetrySink for ChannelSink {
    fn try_send(&mut self, sample: TelemetrySample) -> Result<(), SinkError> {
        self.sender.try_send(sample).map_err(|_| SinkError::Full)
    }
}

#[embassy_executor::task]
pub async fn publisher_task(config: PublisherConfig) {
    info!(
        "Publisher task started ({}ms tick, {}ms stall timeout)",
        config.interval_us / 1000,
        config.stall_timeout_us / 1000
    );

    let mut ticks = TickerSource {
        ticker: Ticker::every(Duration::from_micros(config.interval_us as u64)),
    };
    let mut sink = ChannelSink {
        sender: TELEMETRY_CHANNEL.sender(),
    };
    let mut publisher = TelemetryPublisher::new(config.stall_timeout_us);
    let mut ticks_since_log = 0u32;

    loop {
        match publisher.step(&mut ticks, &ENGINE, &mut sink).await {
            Ok(sample) => trace!("Telemetry: {:?}", sample),
            Err(SinkError::Full) => trace!("Telemetry channel full, sample dropped"),
            Err(e) => warn!("Telemetry sink error: {:?}", e),
        }

        ticks_since_log += 1;
        if ticks_since_log >= DIAGNOSTICS_EVERY {
            ticks_since_log = 0;
            let snapshot = ENGINE.snapshot();
            let stats = publisher.stats();
            debug!(
                "Diagnostics: filtered pickups={}, filtered sparks={}, suppressed sparks={}, published={}, dropped={}",
                snapshot.filtered_pickups,
                snapshot.filtered_sparks,
                snapshot.suppressed_sparks,
                stats.published,
                stats.dropped
            );
        }
    }
}
