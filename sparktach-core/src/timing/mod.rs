//! Interrupt-driven timing engine
//!
//! Two asynchronous edge streams feed this module: the pickup stream (one
//! edge per crankshaft revolution) and the spark stream. Each stream has
//! its own bounce filter; the pickup side measures the revolution period,
//! the spark side correlates against it to compute advance.

pub mod advance;
pub mod engine;
pub mod filter;
pub mod revolution;
pub mod timestamp;

pub use advance::{
    expected_degrees, AdvanceCalculator, Correlation, CorrelationEvent, RevolutionView,
    SparkOutcome, SparkSuppressed,
};
pub use engine::{EngineSnapshot, SharedEngine, TimingEngine};
pub use filter::{Bounce, EdgeFilter, MIN_INTERVAL_US};
pub use revolution::{rpm_from_period, PickupOutcome, RevolutionTracker};
pub use timestamp::{Micros, MICROS_PER_MINUTE};
