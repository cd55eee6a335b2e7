//! Types for dealing with time and durations.

use std::fmt::Display;
use std::ops::{Add, Sub};

pub use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A duration in seconds precision.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct DurationSecs(pub u64);

impl From<std::time::Duration> for DurationSecs {
    fn from(duration_std: std::time::Duration) -> Self {
        DurationSecs(duration_std.as_secs())
    }
}

impl From<DurationSecs> for std::time::Duration {
    fn from(duration_secs: DurationSecs) -> Self {
        std::time::Duration::new(duration_secs.0, 0)
    }
}

impl Display for DurationSecs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp, serialized as RFC 3339.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct DateTimeUtc(pub DateTime<Utc>);

impl Display for DateTimeUtc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl DateTimeUtc {
    /// Returns a DateTimeUtc which corresponds to the current date.
    pub fn now() -> Self {
        Self(
            #[allow(clippy::disallowed_methods)]
            Utc::now(),
        )
    }

    /// Returns the unix timestamp associated with this [`DateTimeUtc`].
    #[inline]
    pub fn to_unix_timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns a [`DateTimeUtc`] corresponding to the provided Unix timestamp.
    #[inline]
    pub fn from_unix_timestamp(timestamp: i64) -> Option<Self> {
        Some(Self(DateTime::<Utc>::from_timestamp(timestamp, 0)?))
    }
}

impl Add<DurationSecs> for DateTimeUtc {
    type Output = DateTimeUtc;

    /// Saturates at the maximum representable time.
    fn add(self, duration: DurationSecs) -> Self::Output {
        let secs = i64::try_from(duration.0).unwrap_or(i64::MAX);
        Duration::try_seconds(secs)
            .and_then(|duration| self.0.checked_add_signed(duration))
            .map(DateTimeUtc)
            .unwrap_or(DateTimeUtc(DateTime::<Utc>::MAX_UTC))
    }
}

impl Sub<DurationSecs> for DateTimeUtc {
    type Output = DateTimeUtc;

    /// Saturates at the minimum representable time.
    fn sub(self, duration: DurationSecs) -> Self::Output {
        let secs = i64::try_from(duration.0).unwrap_or(i64::MAX);
        Duration::try_seconds(secs)
            .and_then(|duration| self.0.checked_sub_signed(duration))
            .map(DateTimeUtc)
            .unwrap_or(DateTimeUtc(DateTime::<Utc>::MIN_UTC))
    }
}

impl From<DateTime<Utc>> for DateTimeUtc {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// A source of the current time. Injected so that timelock checks can be
/// evaluated against a fixed instant in tests.
pub trait Clock {
    /// The current time
    fn now(&self) -> DateTimeUtc;
}

/// A [`Clock`] backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTimeUtc {
        DateTimeUtc::now()
    }
}

/// Helpers for testing with time.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use std::cell::Cell;

    use super::*;

    /// A clock that only moves when told to.
    #[derive(Debug)]
    pub struct FixedClock(Cell<DateTimeUtc>);

    impl FixedClock {
        /// Create a clock stopped at the given time
        pub fn new(now: DateTimeUtc) -> Self {
            Self(Cell::new(now))
        }

        /// Create a clock stopped at the given unix timestamp
        pub fn at_unix(timestamp: i64) -> Self {
            Self::new(
                DateTimeUtc::from_unix_timestamp(timestamp)
                    .expect("Test timestamp must be valid"),
            )
        }

        /// Move the clock forward
        pub fn advance(&self, duration: DurationSecs) {
            self.0.set(self.0.get() + duration);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTimeUtc {
            self.0.get()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FixedClock;
    use super::*;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::at_unix(10);
        clock.advance(DurationSecs(5));
        assert_eq!(clock.now().to_unix_timestamp(), 15);
        assert_eq!((clock.now() - DurationSecs(15)).to_unix_timestamp(), 0);
    }
}
