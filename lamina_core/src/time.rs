// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic host timestamps and the injectable time source.
//!
//! [`Timestamp`] represents a point on the host toolkit's monotonic timeline
//! in nanoseconds — the unit frame callbacks deliver on every platform Lamina
//! targets, so no timebase conversion is needed.
//!
//! [`TimeSource`] is the seam through which the synchronizer observes "now"
//! for budget accounting and context throttling. Production code uses
//! [`MonotonicClock`]; tests use [`ManualClock`] to make time deterministic.

use core::fmt;
use core::ops::{Add, Sub};
use std::cell::Cell;
use std::time::Instant;

/// A point in time expressed as nanoseconds on the host monotonic timeline.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns the duration between `self` and an earlier time, or zero if
    /// `earlier` is after `self`.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> DurationNs {
        DurationNs(self.0.saturating_sub(earlier.0))
    }

    /// Checked subtraction of a duration.
    #[inline]
    #[must_use]
    pub const fn checked_sub(self, duration: DurationNs) -> Option<Self> {
        match self.0.checked_sub(duration.0) {
            Some(t) => Some(Self(t)),
            None => None,
        }
    }
}

impl Add<DurationNs> for Timestamp {
    type Output = Self;

    #[inline]
    fn add(self, rhs: DurationNs) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Timestamp {
    type Output = DurationNs;

    #[inline]
    fn sub(self, rhs: Self) -> DurationNs {
        DurationNs(self.0 - rhs.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A span of time in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DurationNs(pub u64);

impl DurationNs {
    /// One millisecond.
    pub const MILLISECOND: Self = Self(1_000_000);

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms * 1_000_000)
    }

    /// Returns the raw nanosecond value.
    #[inline]
    #[must_use]
    pub const fn nanos(self) -> u64 {
        self.0
    }

    /// Returns this duration as fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1e6
    }
}

impl fmt::Debug for DurationNs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DurationNs({})", self.0)
    }
}

/// Source of "now" readings for budget accounting and throttling.
///
/// The synchronizer never calls platform clocks directly; everything flows
/// through this trait so tests can drive time by hand.
pub trait TimeSource {
    /// Returns the current time on the host monotonic timeline.
    fn now(&self) -> Timestamp;
}

/// [`TimeSource`] backed by [`std::time::Instant`].
///
/// The zero point is the moment this clock was created.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Creates a clock whose zero point is "now".
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "u64 nanoseconds covers ~584 years of uptime"
        )]
        Timestamp(self.origin.elapsed().as_nanos() as u64)
    }
}

/// Hand-driven [`TimeSource`] for tests.
///
/// Not `Sync`; intended for single-threaded test scenarios, which matches the
/// owner-thread model of the synchronizer.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    /// Creates a clock reading `start` nanoseconds.
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, nanos: u64) {
        self.now.set(nanos);
    }

    /// Advances the current reading.
    pub fn advance(&self, by: DurationNs) {
        self.now.set(self.now.get() + by.0);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_duration_never_underflows() {
        let a = Timestamp(100);
        let b = Timestamp(200);
        assert_eq!(a.saturating_duration_since(b), DurationNs(0));
        assert_eq!(b.saturating_duration_since(a), DurationNs(100));
    }

    #[test]
    fn millis_round_trip() {
        let d = DurationNs::from_millis(17);
        assert_eq!(d.nanos(), 17_000_000);
        assert!((d.as_millis_f64() - 17.0).abs() < 1e-9);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now(), Timestamp(1_000));
        clock.advance(DurationNs::from_millis(1));
        assert_eq!(clock.now(), Timestamp(1_001_000));
    }

    #[test]
    fn monotonic_clock_is_monotonic() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a, "monotonic clock went backwards");
    }
}
