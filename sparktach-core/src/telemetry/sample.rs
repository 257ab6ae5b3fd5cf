//! Telemetry sample and stall detection

use crate::timing::{EngineSnapshot, Micros};

/// One telemetry reading
///
/// `None` means "unknown": no period measured yet, no advance computed
/// yet, or the engine has stalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetrySample {
    /// Rotational speed in RPM
    pub speed_rpm: Option<u32>,
    /// Spark advance in degrees
    pub advance_deg: Option<i32>,
}

impl TelemetrySample {
    /// Both values unknown
    pub const UNKNOWN: Self = Self {
        speed_rpm: None,
        advance_deg: None,
    };

    /// Build a sample from an engine snapshot
    pub fn from_snapshot(snapshot: &EngineSnapshot, stalled: bool) -> Self {
        if stalled {
            return Self::UNKNOWN;
        }
        Self {
            speed_rpm: snapshot.speed_rpm(),
            advance_deg: snapshot.computed_advance,
        }
    }
}

/// Detects a missing pickup signal
///
/// A stall is latched against the accepted pickup edge count, so it
/// persists past the counter wrap until pickup edges arrive again. The
/// first edge after a stall only restarts measurement; the stall clears
/// on the edge after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StallDetector {
    timeout_us: u32,
    /// Accepted pickup edge count when the stall latched
    stale_at: Option<u32>,
}

impl StallDetector {
    /// Detector that trips once the last pickup edge is older than
    /// `timeout_us`
    pub const fn new(timeout_us: u32) -> Self {
        Self {
            timeout_us,
            stale_at: None,
        }
    }

    /// Check the last pickup edge against the current time
    ///
    /// `pickup_edges` is the engine's running count of accepted pickup
    /// edges. With no pickup edge at all the engine counts as stalled.
    pub fn is_stalled(&mut self, now: Micros, last_pickup: Option<Micros>, pickup_edges: u32) -> bool {
        let Some(edge) = last_pickup else {
            return true;
        };

        if let Some(stale) = self.stale_at {
            if pickup_edges.wrapping_sub(stale) >= 2 {
                self.stale_at = None;
            }
        }

        // An edge stamped after `now` was read is fresh
        let elapsed = if edge.is_after(now) { 0 } else { now.since(edge) };
        if elapsed > self.timeout_us {
            self.stale_at = Some(pickup_edges);
            return true;
        }
        self.stale_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticAdvance;
    use crate::timing::Correlation;

    fn snapshot(period_us: u32, advance: Option<i32>) -> EngineSnapshot {
        EngineSnapshot {
            last_pickup: Some(Micros(0)),
            period_us,
            computed_advance: advance,
            static_advance: StaticAdvance::default(),
            correlation: Correlation::AwaitingPeriod,
            pickup_edges: 1,
            filtered_pickups: 0,
            filtered_sparks: 0,
            suppressed_sparks: 0,
        }
    }

    #[test]
    fn test_sample_from_snapshot() {
        let sample = TelemetrySample::from_snapshot(&snapshot(20_000, Some(18)), false);
        assert_eq!(sample.speed_rpm, Some(3_000));
        assert_eq!(sample.advance_deg, Some(18));
    }

    #[test]
    fn test_stalled_sample_is_unknown() {
        let sample = TelemetrySample::from_snapshot(&snapshot(20_000, Some(18)), true);
        assert_eq!(sample, TelemetrySample::UNKNOWN);
    }

    #[test]
    fn test_speed_known_before_advance() {
        let sample = TelemetrySample::from_snapshot(&snapshot(20_000, None), false);
        assert_eq!(sample.speed_rpm, Some(3_000));
        assert_eq!(sample.advance_deg, None);
    }

    #[test]
    fn test_stall_timeout() {
        let mut detector = StallDetector::new(1_500_000);
        let edge = Some(Micros(1_000));

        assert!(!detector.is_stalled(Micros(1_000), edge, 2));
        assert!(!detector.is_stalled(Micros(1_501_000), edge, 2));
        assert!(detector.is_stalled(Micros(1_501_001), edge, 2));
    }

    #[test]
    fn test_no_pickup_is_stalled() {
        let mut detector = StallDetector::new(1_500_000);
        assert!(detector.is_stalled(Micros(0), None, 0));
    }

    #[test]
    fn test_edge_after_now_is_fresh() {
        let mut detector = StallDetector::new(1_500_000);
        assert!(!detector.is_stalled(Micros(1_000), Some(Micros(1_010)), 1));
    }

    #[test]
    fn test_stall_latches_across_wrap() {
        let mut detector = StallDetector::new(1_500_000);
        let edge = Some(Micros(1_000));
        assert!(detector.is_stalled(Micros(2_000_000), edge, 5));

        // Far enough on that the stale edge looks like it is in the future
        assert!(detector.is_stalled(Micros(1_000 + (1 << 31) + 5), edge, 5));
        assert!(detector.is_stalled(Micros(500), edge, 5));

        // The first new pickup edge only restarts measurement
        assert!(detector.is_stalled(Micros(600), Some(Micros(550)), 6));
        assert!(detector.is_stalled(Micros(20_000), Some(Micros(550)), 6));

        // The second one clears the latch
        assert!(!detector.is_stalled(Micros(30_600), Some(Micros(30_550)), 7));
    }

    #[test]
    fn test_restart_edge_can_stall_again() {
        let mut detector = StallDetector::new(1_500_000);
        assert!(detector.is_stalled(Micros(2_000_000), Some(Micros(0)), 1));
        assert!(detector.is_stalled(Micros(2_100_000), Some(Micros(2_050_000)), 2));

        // No second edge: the restart edge itself times out
        assert!(detector.is_stalled(Micros(3_600_000), Some(Micros(2_050_000)), 2));
        assert!(detector.is_stalled(Micros(4_000_000), Some(Micros(3_900_000)), 3));
        assert!(!detector.is_stalled(Micros(4_000_000), Some(Micros(3_920_000)), 4));
    }

    #[test]
    fn test_edges_between_checks_clear_the_stall() {
        let mut detector = StallDetector::new(1_500_000);
        assert!(detector.is_stalled(Micros(2_000_000), Some(Micros(0)), 1));
        assert!(!detector.is_stalled(Micros(2_100_000), Some(Micros(2_090_000)), 3));
    }
}
