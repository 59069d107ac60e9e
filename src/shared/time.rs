use std::ops::{Add, AddAssign, Sub, SubAssign};

use chrono::{DateTime, Utc};

/// A point in time, stored as whole seconds since the Unix epoch.
///
/// Connections carry `departureTime` in this unit; `Time` never wraps at
/// midnight the way a timetable-local clock would, so journeys spanning a
/// service-day boundary (or several days, for long horizons) compare correctly
/// with ordinary integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(u32);

/// Sentinel used to seed a frontier search: no connection can ever depart
/// this late, so any real arrival strictly improves on it.
pub const MAX: Time = Time(u32::MAX);
/// Sentinel used as the "nothing reached yet" arrival/departure bound.
pub const MIN: Time = Time(0);

impl Default for Time {
    fn default() -> Self {
        MIN
    }
}

impl From<u32> for Time {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0.saturating_sub(rhs.0))
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs.0)
    }
}

impl Sub<Duration> for Time {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Time {
    /// Sentinel used to seed a frontier search: no connection can ever depart
    /// this late, so any real arrival strictly improves on it.
    pub const MAX: Self = MAX;
    /// Sentinel used as the "nothing reached yet" arrival/departure bound.
    pub const MIN: Self = MIN;

    /// The current wall-clock time, truncated to whole seconds.
    pub fn now() -> Self {
        Self(Utc::now().timestamp().max(0) as u32)
    }

    pub const fn from_unix_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_unix_seconds(&self) -> u32 {
        self.0
    }

    /// Parses an RFC 3339 timestamp (e.g. `2018-12-04T09:30:00Z`) into a `Time`.
    ///
    /// Intended for building test fixtures and config files by hand; the hot
    /// ingest path always works with raw unix seconds.
    pub fn from_rfc3339(s: &str) -> Option<Self> {
        let parsed: DateTime<Utc> = DateTime::parse_from_rfc3339(s).ok()?.with_timezone(&Utc);
        let secs = parsed.timestamp();
        if secs < 0 {
            None
        } else {
            Some(Self(secs as u32))
        }
    }

    pub const fn saturating_add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub const fn saturating_sub(self, rhs: Duration) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

/// A span of whole seconds: travel time, delay, or walking time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(u32);

impl From<u32> for Duration {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Duration {
    pub const ZERO: Self = Self(0);

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes * 60)
    }

    pub const fn from_hours(hours: u32) -> Self {
        Self(hours * 60 * 60)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0)
    }
}

#[test]
fn rfc3339_roundtrip() {
    let t = Time::from_rfc3339("2018-12-04T09:30:00Z").unwrap();
    assert_eq!(t.as_unix_seconds(), 1543915800);
}

#[test]
fn time_plus_duration() {
    let t = Time::from_unix_seconds(1000);
    let d = Duration::from_seconds(600);
    assert_eq!((t + d).as_unix_seconds(), 1600);
}

#[test]
fn time_minus_time_yields_duration() {
    let a = Time::from_unix_seconds(1600);
    let b = Time::from_unix_seconds(1000);
    assert_eq!(a - b, Duration::from_seconds(600));
}

#[test]
fn duration_from_minutes_and_hours() {
    assert_eq!(Duration::from_minutes(10).as_seconds(), 600);
    assert_eq!(Duration::from_hours(2).as_seconds(), 7200);
}
