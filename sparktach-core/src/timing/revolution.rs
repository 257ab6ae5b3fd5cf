//! Revolution period and rotational speed from the pickup stream
//!
//! One accepted pickup edge per crankshaft revolution. The period is the
//! wrapping difference between two consecutive accepted edges; speed is
//! derived from it on read so there is a single mutation point.

use super::filter::{Bounce, EdgeFilter};
use super::timestamp::{Micros, MICROS_PER_MINUTE};

/// Result of feeding a pickup edge to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PickupOutcome {
    /// Edge rejected by the bounce filter, nothing changed
    Filtered,
    /// First edge after start or after a stall: timestamp recorded, period
    /// unknown until the next edge
    FirstEdge,
    /// A new revolution period was captured (µs)
    Period(u32),
}

/// Convert a revolution period into RPM
///
/// Returns `None` for a zero period instead of dividing by zero.
pub const fn rpm_from_period(period_us: u32) -> Option<u32> {
    if period_us == 0 {
        None
    } else {
        Some(MICROS_PER_MINUTE / period_us)
    }
}

/// Pickup edge consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RevolutionTracker {
    filter: EdgeFilter,
    /// Gaps longer than this are a stall, not a revolution
    stall_timeout_us: u32,
    /// Revolution period in µs, 0 = unknown
    period_us: u32,
    /// Edges accepted since start, wrapping
    accepted_edges: u32,
    /// Bounced edges seen since start
    filtered_edges: u32,
}

impl RevolutionTracker {
    /// Create a tracker with no edges seen
    pub const fn new(min_interval_us: u32, stall_timeout_us: u32) -> Self {
        Self {
            filter: EdgeFilter::new(min_interval_us),
            stall_timeout_us,
            period_us: 0,
            accepted_edges: 0,
            filtered_edges: 0,
        }
    }

    /// Handle a pickup edge
    ///
    /// Runs in interrupt context: bounded arithmetic only. An edge that
    /// follows a gap longer than the stall timeout restarts the measurement.
    pub fn on_pickup_edge(&mut self, timestamp: Micros) -> PickupOutcome {
        let previous = match self.filter.accept(timestamp) {
            Err(Bounce) => {
                self.filtered_edges = self.filtered_edges.wrapping_add(1);
                return PickupOutcome::Filtered;
            }
            Ok(previous) => previous,
        };
        self.accepted_edges = self.accepted_edges.wrapping_add(1);

        match previous {
            None => PickupOutcome::FirstEdge,
            Some(previous) => {
                let gap = timestamp.since(previous);
                if gap > self.stall_timeout_us {
                    self.period_us = 0;
                    return PickupOutcome::FirstEdge;
                }
                self.period_us = gap;
                PickupOutcome::Period(gap)
            }
        }
    }

    /// Timestamp of the last accepted pickup edge
    pub fn last_edge(&self) -> Option<Micros> {
        self.filter.last_accepted()
    }

    /// Last measured revolution period in µs (0 = unknown)
    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    /// Rotational speed, or `None` while the period is unknown
    pub fn speed_rpm(&self) -> Option<u32> {
        rpm_from_period(self.period_us)
    }

    /// Number of pickup edges accepted, wrapping
    pub fn accepted_edges(&self) -> u32 {
        self.accepted_edges
    }

    /// Number of pickup edges dropped by the bounce filter
    pub fn filtered_edges(&self) -> u32 {
        self.filtered_edges
    }
}
