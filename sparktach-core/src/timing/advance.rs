//! Spark advance from the spark stream
//!
//! A spark edge is correlated with the pickup edge that started the
//! current revolution. Assuming constant angular velocity over one
//! revolution, the crank has turned `360 * elapsed / period` degrees since
//! the pickup, and the spark fired `static - expected` degrees before the
//! static mark.
//!
//! The pairing is an explicit two-state machine: an accepted pickup edge
//! makes a period ready, and the first spark edge that passes the guards
//! consumes it.

use super::filter::{EdgeFilter, MIN_INTERVAL_US};
use super::timestamp::Micros;
use crate::config::{ConfigError, StaticAdvance};

/// Correlation machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Correlation {
    /// No fresh period since the last computed advance
    #[default]
    AwaitingPeriod,
    /// A new period was captured and not yet consumed by a spark edge
    PeriodReady,
}

/// Events driving the correlation machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CorrelationEvent {
    /// Pickup edge accepted with a new period
    PeriodCaptured,
    /// Spark edge passed all guards and an advance was computed
    AdvanceComputed,
    /// Pickup resumed after a stall; the old period no longer applies
    SignalLost,
}

impl Correlation {
    /// Process an event and return the next state
    pub fn transition(self, event: CorrelationEvent) -> Self {
        use Correlation::*;
        use CorrelationEvent::*;

        match (self, event) {
            (_, PeriodCaptured) => PeriodReady,
            (PeriodReady, AdvanceComputed) => AwaitingPeriod,
            (_, SignalLost) => AwaitingPeriod,
            // A computed advance without a ready period cannot happen;
            // stay put rather than invent a transition
            (AwaitingPeriod, AdvanceComputed) => AwaitingPeriod,
        }
    }

    /// Check whether a spark edge may compute an advance
    pub fn is_pending(&self) -> bool {
        matches!(self, Correlation::PeriodReady)
    }
}

/// Revolution data the spark handler reads from the pickup side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RevolutionView {
    /// Timestamp of the pickup edge that started this revolution
    pub last_pickup: Option<Micros>,
    /// Period of the last revolution in µs (0 = unknown)
    pub period_us: u32,
}

/// Why a spark edge did not produce an advance reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SparkSuppressed {
    /// Rejected by the spark stream bounce filter
    Filtered,
    /// No fresh period: the advance for this revolution was already taken
    NotPending,
    /// Period unknown or shorter than the minimum: engine stalled
    Stalled,
    /// Spark timestamp equals the pickup timestamp
    Degenerate,
}

/// Result of feeding a spark edge to the calculator
pub type SparkOutcome = Result<i32, SparkSuppressed>;

/// Expected crank angle (degrees) travelled `elapsed_us` into a revolution
/// of `period_us`, truncated
///
/// Returns `None` for a zero period.
pub const fn expected_degrees(elapsed_us: u32, period_us: u32) -> Option<u32> {
    if period_us == 0 {
        return None;
    }
    let degrees = (360 * elapsed_us as u64) / period_us as u64;
    if degrees > u32::MAX as u64 {
        Some(u32::MAX)
    } else {
        Some(degrees as u32)
    }
}

/// Spark edge consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvanceCalculator {
    filter: EdgeFilter,
    static_advance: StaticAdvance,
    computed_advance: Option<i32>,
    correlation: Correlation,
    /// Bounced spark edges seen since start
    filtered_edges: u32,
    /// Spark edges that passed the filter but failed a guard
    suppressed_sparks: u32,
}

impl AdvanceCalculator {
    /// Create a calculator with no reading yet
    pub const fn new(min_interval_us: u32, static_advance: StaticAdvance) -> Self {
        Self {
            filter: EdgeFilter::new(min_interval_us),
            static_advance,
            computed_advance: None,
            correlation: Correlation::AwaitingPeriod,
            filtered_edges: 0,
            suppressed_sparks: 0,
        }
    }

    /// Signal from the pickup side that a new period is available
    pub fn period_ready(&mut self) {
        self.correlation = self.correlation.transition(CorrelationEvent::PeriodCaptured);
    }

    /// Drop the reading when the pickup signal restarts
    ///
    /// The last advance belongs to the revolution before the stall and is
    /// reported as unknown until a spark correlates against a fresh period.
    pub fn signal_lost(&mut self) {
        self.computed_advance = None;
        self.correlation = self.correlation.transition(CorrelationEvent::SignalLost);
    }

    /// Handle a spark edge
    ///
    /// Runs in interrupt context: bounded arithmetic only. Any failed
    /// guard leaves the previous advance untouched.
    pub fn on_spark_edge(&mut self, timestamp: Micros, revolution: RevolutionView) -> SparkOutcome {
        if self.filter.accept(timestamp).is_err() {
            self.filtered_edges = self.filtered_edges.wrapping_add(1);
            return Err(SparkSuppressed::Filtered);
        }

        let result = self.correlate(timestamp, revolution);
        match result {
            Ok(advance) => {
                self.computed_advance = Some(advance);
                self.correlation = self.correlation.transition(CorrelationEvent::AdvanceComputed);
            }
            Err(_) => {
                self.suppressed_sparks = self.suppressed_sparks.wrapping_add(1);
            }
        }
        result
    }

    fn correlate(&self, timestamp: Micros, revolution: RevolutionView) -> SparkOutcome {
        if !self.correlation.is_pending() {
            return Err(SparkSuppressed::NotPending);
        }
        if revolution.period_us < MIN_INTERVAL_US {
            return Err(SparkSuppressed::Stalled);
        }
        let last_pickup = revolution.last_pickup.ok_or(SparkSuppressed::Stalled)?;
        if timestamp == last_pickup {
            return Err(SparkSuppressed::Degenerate);
        }

        let elapsed = timestamp.since(last_pickup);
        let expected = expected_degrees(elapsed, revolution.period_us).ok_or(SparkSuppressed::Stalled)?;
        let expected = expected.min(i32::MAX as u32) as i32;

        Ok((self.static_advance.degrees() as i32).saturating_sub(expected))
    }

    /// Replace the static advance
    ///
    /// Out-of-range values are rejected and the current setting is kept.
    pub fn set_static_advance(&mut self, degrees: i32) -> Result<StaticAdvance, ConfigError> {
        let advance = StaticAdvance::new(degrees)?;
        self.static_advance = advance;
        Ok(advance)
    }

    /// Current static advance
    pub fn static_advance(&self) -> StaticAdvance {
        self.static_advance
    }

    /// Last computed advance, `None` until the first correlation
    pub fn computed_advance(&self) -> Option<i32> {
        self.computed_advance
    }

    /// Correlation machine state
    pub fn correlation(&self) -> Correlation {
        self.correlation
    }

    /// Number of spark edges dropped by the bounce filter
    pub fn filtered_edges(&self) -> u32 {
        self.filtered_edges
    }

    /// Number of spark edges that failed a guard
    pub fn suppressed_sparks(&self) -> u32 {
        self.suppressed_sparks
    }
}
