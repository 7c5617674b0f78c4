//! Timestamp key type.

use std::fmt;
use std::ops::{Add, Sub};

/// A point in time, in nanoseconds since the Unix epoch.
///
/// `Timestamp` is the crate's canonical key type for time-indexed
/// series. It is a plain newtype over `i64` so it stays a fixed-size
/// codec element; the codec gives it a dedicated delta encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from nanoseconds since the epoch.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Creates a timestamp from whole seconds since the epoch.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1_000_000_000)
    }

    /// Returns the raw nanosecond count.
    pub const fn nanos(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

impl From<i64> for Timestamp {
    fn from(nanos: i64) -> Self {
        Self(nanos)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> i64 {
        ts.0
    }
}

impl Add<i64> for Timestamp {
    type Output = Timestamp;

    fn add(self, nanos: i64) -> Timestamp {
        Timestamp(self.0.wrapping_add(nanos))
    }
}

impl Sub for Timestamp {
    type Output = i64;

    fn sub(self, other: Timestamp) -> i64 {
        self.0.wrapping_sub(other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_nanos() {
        assert!(Timestamp::from_nanos(1) < Timestamp::from_nanos(2));
        assert_eq!(Timestamp::from_secs(1), Timestamp::from_nanos(1_000_000_000));
    }

    #[test]
    fn test_arithmetic() {
        let ts = Timestamp::from_nanos(1000);
        assert_eq!(ts + 500, Timestamp::from_nanos(1500));
        assert_eq!(Timestamp::from_nanos(1500) - ts, 500);
    }
}
