//! Timing engine: shared state between the edge handlers and the main loop
//!
//! [`TimingEngine`] owns the revolution tracker and the advance calculator.
//! Field ownership follows the edge streams: the pickup path writes the
//! revolution fields and raises the correlation flag, the spark path
//! writes the advance fields. Nothing else mutates them apart from the
//! validated static-advance setter.
//!
//! [`SharedEngine`] puts the engine behind a critical-section mutex so it
//! can live in a `static`. Edge handlers run their update inside a
//! critical section, and readers copy out a complete [`EngineSnapshot`]
//! in one, so a multi-field read can never observe half an update.

use core::cell::RefCell;

use critical_section::Mutex;

use super::advance::{AdvanceCalculator, Correlation, RevolutionView, SparkOutcome};
use super::revolution::{rpm_from_period, PickupOutcome, RevolutionTracker};
use super::timestamp::Micros;
use crate::config::{ConfigError, EngineConfig, StaticAdvance};

/// Consistent copy of the engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineSnapshot {
    /// Last accepted pickup edge
    pub last_pickup: Option<Micros>,
    /// Revolution period in µs (0 = unknown)
    pub period_us: u32,
    /// Last computed advance in degrees
    pub computed_advance: Option<i32>,
    /// Static advance in effect
    pub static_advance: StaticAdvance,
    /// Correlation machine state
    pub correlation: Correlation,
    /// Pickup edges accepted since start, wrapping
    pub pickup_edges: u32,
    /// Pickup edges rejected by the bounce filter
    pub filtered_pickups: u32,
    /// Spark edges rejected by the bounce filter
    pub filtered_sparks: u32,
    /// Spark edges rejected by a guard
    pub suppressed_sparks: u32,
}

impl EngineSnapshot {
    /// Rotational speed derived from the period
    pub fn speed_rpm(&self) -> Option<u32> {
        rpm_from_period(self.period_us)
    }
}

/// Owned timing state, mutated only by the two edge handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingEngine {
    revolution: RevolutionTracker,
    advance: AdvanceCalculator,
}

impl TimingEngine {
    /// Create an engine with zero/sentinel state
    pub const fn new(
        pickup_interval_us: u32,
        spark_interval_us: u32,
        stall_timeout_us: u32,
        static_advance: StaticAdvance,
    ) -> Self {
        Self {
            revolution: RevolutionTracker::new(pickup_interval_us, stall_timeout_us),
            advance: AdvanceCalculator::new(spark_interval_us, static_advance),
        }
    }

    /// Create an engine from a loaded configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.pickup.min_interval_us,
            config.spark.min_interval_us,
            config.stall_timeout_us(),
            config.static_advance,
        )
    }

    /// Pickup edge handler
    pub fn on_pickup_edge(&mut self, timestamp: Micros) -> PickupOutcome {
        let outcome = self.revolution.on_pickup_edge(timestamp);
        match outcome {
            PickupOutcome::Period(_) => self.advance.period_ready(),
            PickupOutcome::FirstEdge => self.advance.signal_lost(),
            PickupOutcome::Filtered => {}
        }
        outcome
    }

    /// Spark edge handler
    pub fn on_spark_edge(&mut self, timestamp: Micros) -> SparkOutcome {
        let view = RevolutionView {
            last_pickup: self.revolution.last_edge(),
            period_us: self.revolution.period_us(),
        };
        self.advance.on_spark_edge(timestamp, view)
    }

    /// Validated static advance setter
    pub fn set_static_advance(&mut self, degrees: i32) -> Result<StaticAdvance, ConfigError> {
        self.advance.set_static_advance(degrees)
    }

    /// Copy out the current state
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            last_pickup: self.revolution.last_edge(),
            period_us: self.revolution.period_us(),
            computed_advance: self.advance.computed_advance(),
            static_advance: self.advance.static_advance(),
            correlation: self.advance.correlation(),
            pickup_edges: self.revolution.accepted_edges(),
            filtered_pickups: self.revolution.filtered_edges(),
            filtered_sparks: self.advance.filtered_edges(),
            suppressed_sparks: self.advance.suppressed_sparks(),
        }
    }
}

/// Interrupt-safe wrapper for a `static` engine
pub struct SharedEngine {
    inner: Mutex<RefCell<TimingEngine>>,
}

impl SharedEngine {
    /// Wrap an engine for sharing
    pub const fn new(engine: TimingEngine) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(engine)),
        }
    }

    /// Replace the whole engine (boot-time reconfiguration)
    pub fn reset(&self, engine: TimingEngine) {
        critical_section::with(|cs| {
            *self.inner.borrow_ref_mut(cs) = engine;
        });
    }

    /// Pickup edge entry point for interrupt context
    pub fn on_pickup_edge(&self, timestamp: Micros) -> PickupOutcome {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).on_pickup_edge(timestamp))
    }

    /// Spark edge entry point for interrupt context
    pub fn on_spark_edge(&self, timestamp: Micros) -> SparkOutcome {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).on_spark_edge(timestamp))
    }

    /// Validated static advance setter for the control path
    pub fn set_static_advance(&self, degrees: i32) -> Result<StaticAdvance, ConfigError> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).set_static_advance(degrees))
    }

    /// Tear-free copy of the whole state
    pub fn snapshot(&self) -> EngineSnapshot {
        critical_section::with(|cs| self.inner.borrow_ref(cs).snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::advance::SparkSuppressed;
    use crate::timing::filter::MIN_INTERVAL_US;

    fn engine() -> TimingEngine {
        TimingEngine::new(
            MIN_INTERVAL_US,
            MIN_INTERVAL_US,
            1_500_000,
            StaticAdvance::new(36).unwrap(),
        )
    }

    #[test]
    fn test_startup_state() {
        let snap = engine().snapshot();
        assert_eq!(snap.last_pickup, None);
        assert_eq!(snap.period_us, 0);
        assert_eq!(snap.speed_rpm(), None);
        assert_eq!(snap.computed_advance, None);
        assert_eq!(snap.correlation, Correlation::AwaitingPeriod);
    }

    #[test]
    fn test_full_revolution() {
        let mut engine = engine();
        engine.on_pickup_edge(Micros(80_000));
        assert_eq!(engine.snapshot().correlation, Correlation::AwaitingPeriod);

        engine.on_pickup_edge(Micros(100_000));
        assert_eq!(engine.snapshot().correlation, Correlation::PeriodReady);

        assert_eq!(engine.on_spark_edge(Micros(101_000)), Ok(18));
        let snap = engine.snapshot();
        assert_eq!(snap.speed_rpm(), Some(3_000));
        assert_eq!(snap.computed_advance, Some(18));
        assert_eq!(snap.correlation, Correlation::AwaitingPeriod);
    }

    #[test]
    fn test_one_advance_per_revolution() {
        let mut engine = engine();
        engine.on_pickup_edge(Micros(80_000));
        engine.on_pickup_edge(Micros(100_000));
        engine.on_spark_edge(Micros(101_000)).unwrap();

        assert_eq!(engine.on_spark_edge(Micros(104_000)), Err(SparkSuppressed::NotPending));
        assert_eq!(engine.snapshot().computed_advance, Some(18));

        // Next revolution re-arms the correlation
        engine.on_pickup_edge(Micros(120_000));
        assert_eq!(engine.on_spark_edge(Micros(122_000)), Ok(0));
    }

    #[test]
    fn test_bounced_pickup_does_not_rearm() {
        let mut engine = engine();
        engine.on_pickup_edge(Micros(80_000));
        engine.on_pickup_edge(Micros(100_000));
        engine.on_spark_edge(Micros(101_000)).unwrap();

        assert_eq!(engine.on_pickup_edge(Micros(100_300)), PickupOutcome::Filtered);
        assert_eq!(engine.snapshot().correlation, Correlation::AwaitingPeriod);
        assert_eq!(engine.snapshot().filtered_pickups, 1);
    }

    #[test]
    fn test_resume_after_stall_drops_old_readings() {
        let mut engine = engine();
        engine.on_pickup_edge(Micros(0));
        engine.on_pickup_edge(Micros(20_000));
        engine.on_spark_edge(Micros(21_000)).unwrap();

        // Single edge after a ten second stop: nothing from before survives
        assert_eq!(engine.on_pickup_edge(Micros(10_020_000)), PickupOutcome::FirstEdge);
        let snap = engine.snapshot();
        assert_eq!(snap.speed_rpm(), None);
        assert_eq!(snap.computed_advance, None);
        assert_eq!(snap.correlation, Correlation::AwaitingPeriod);

        // A spark before the second edge has no period to work with
        assert_eq!(engine.on_spark_edge(Micros(10_021_000)), Err(SparkSuppressed::NotPending));
        assert_eq!(engine.snapshot().computed_advance, None);

        engine.on_pickup_edge(Micros(10_040_000));
        assert_eq!(engine.on_spark_edge(Micros(10_041_000)), Ok(18));
        assert_eq!(engine.snapshot().speed_rpm(), Some(3_000));
    }

    #[test]
    fn test_shared_engine_round_trip() {
        let shared = SharedEngine::new(engine());
        shared.on_pickup_edge(Micros(0));
        shared.on_pickup_edge(Micros(20_000));
        assert_eq!(shared.on_spark_edge(Micros(21_000)), Ok(18));

        assert!(shared.set_static_advance(400).is_err());
        assert_eq!(shared.snapshot().static_advance.degrees(), 36);

        assert!(shared.set_static_advance(180).is_ok());
        shared.on_pickup_edge(Micros(40_000));
        assert_eq!(shared.on_spark_edge(Micros(41_000)), Ok(162));
    }

    #[test]
    fn test_reads_are_idempotent() {
        let shared = SharedEngine::new(engine());
        shared.on_pickup_edge(Micros(0));
        shared.on_pickup_edge(Micros(20_000));
        shared.on_spark_edge(Micros(21_000)).unwrap();

        let first = shared.snapshot();
        for _ in 0..10 {
            assert_eq!(shared.snapshot(), first);
        }
    }

    #[test]
    fn test_reset_replaces_state() {
        let shared = SharedEngine::new(engine());
        shared.on_pickup_edge(Micros(0));
        shared.on_pickup_edge(Micros(20_000));

        shared.reset(engine());
        assert_eq!(shared.snapshot().period_us, 0);
    }
}
