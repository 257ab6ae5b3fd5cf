//! Minimum-interval edge filter
//!
//! Pickup coils and spark clamps ring after every transition. The filter
//! drops any edge that lands closer than `min_interval_us` to the last
//! accepted edge of the same stream. Rejection has no side effects.

use super::timestamp::Micros;

/// Default rejection window in microseconds
pub const MIN_INTERVAL_US: u32 = 500;

/// An edge closer than the rejection window to the last accepted edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bounce;

/// Per-stream bounce filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeFilter {
    min_interval_us: u32,
    last_accepted: Option<Micros>,
}

impl Default for EdgeFilter {
    fn default() -> Self {
        Self::new(MIN_INTERVAL_US)
    }
}

impl EdgeFilter {
    /// Create a filter that has not yet seen an edge
    pub const fn new(min_interval_us: u32) -> Self {
        Self {
            min_interval_us,
            last_accepted: None,
        }
    }

    /// The pure acceptance predicate
    ///
    /// Accepts when there is no previous edge, or when the candidate is at
    /// least `min_interval_us` away from it.
    pub const fn permits(candidate: Micros, previous: Option<Micros>, min_interval_us: u32) -> bool {
        match previous {
            None => true,
            Some(previous) => candidate.distance(previous) >= min_interval_us,
        }
    }

    /// Check a candidate without recording it
    pub fn accepts(&self, candidate: Micros) -> bool {
        Self::permits(candidate, self.last_accepted, self.min_interval_us)
    }

    /// Check a candidate and record it if accepted
    ///
    /// On acceptance returns the previously accepted timestamp, if any.
    pub fn accept(&mut self, candidate: Micros) -> Result<Option<Micros>, Bounce> {
        if !self.accepts(candidate) {
            return Err(Bounce);
        }
        Ok(self.last_accepted.replace(candidate))
    }

    /// Last accepted timestamp
    pub fn last_accepted(&self) -> Option<Micros> {
        self.last_accepted
    }
}
