//! Wrapping microsecond timestamps
//!
//! Edge timestamps come from a free-running 32 bit microsecond counter
//! that wraps every ~71.6 minutes. All differences are taken modulo 2^32,
//! so a measurement that spans the wrap point is still correct as long as
//! the true interval is shorter than the modulus.

/// Microseconds per minute, the numerator of the RPM conversion
pub const MICROS_PER_MINUTE: u32 = 60_000_000;

/// A point in time on the wrapping microsecond counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Micros(pub u32);

impl Micros {
    /// Truncate a 64 bit uptime (e.g. `embassy_time::Instant::as_micros`)
    /// onto the wrapping counter
    pub const fn from_uptime(us: u64) -> Self {
        Self(us as u32)
    }

    /// Raw counter value
    pub const fn ticks(self) -> u32 {
        self.0
    }

    /// Microseconds elapsed from `earlier` to `self`, modulo 2^32
    pub const fn since(self, earlier: Micros) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Shortest distance between two timestamps on the wrapping counter
    ///
    /// This is `|self - other|` with the wrap taken into account, so the
    /// result never exceeds 2^31.
    pub const fn distance(self, other: Micros) -> u32 {
        let forward = self.0.wrapping_sub(other.0);
        let backward = other.0.wrapping_sub(self.0);
        if forward < backward {
            forward
        } else {
            backward
        }
    }

    /// Check whether `self` lies after `other` within half the counter range
    pub const fn is_after(self, other: Micros) -> bool {
        let diff = self.0.wrapping_sub(other.0);
        diff != 0 && diff < (1 << 31)
    }

    /// Advance by `us` microseconds, wrapping
    pub const fn add_micros(self, us: u32) -> Self {
        Self(self.0.wrapping_add(us))
    }
}

impl From<u32> for Micros {
    fn from(ticks: u32) -> Self {
        Self(ticks)
    }
}

impl From<Micros> for u32 {
    fn from(stamp: Micros) -> Self {
        stamp.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_plain() {
        assert_eq!(Micros(25_000).since(Micros(5_000)), 20_000);
    }

    #[test]
    fn test_since_across_wrap() {
        let before = Micros(u32::MAX - 999);
        let after = Micros(19_000);
        assert_eq!(after.since(before), 20_000);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Micros(100);
        let b = Micros(700);
        assert_eq!(a.distance(b), 600);
        assert_eq!(b.distance(a), 600);

        // Across the wrap, the short way round wins
        let c = Micros(u32::MAX - 99);
        let d = Micros(200);
        assert_eq!(c.distance(d), 300);
        assert_eq!(d.distance(c), 300);
    }

    #[test]
    fn test_is_after() {
        assert!(Micros(10).is_after(Micros(5)));
        assert!(!Micros(5).is_after(Micros(10)));
        assert!(!Micros(5).is_after(Micros(5)));
        assert!(Micros(3).is_after(Micros(u32::MAX - 3)));
    }

    #[test]
    fn test_from_uptime_truncates() {
        let stamp = Micros::from_uptime((1u64 << 32) + 42);
        assert_eq!(stamp.ticks(), 42);
    }
}
