use std::{
    cmp,
    ops::{Add, AddAssign, Sub},
};

/// A walking/footpath distance, in meters.
///
/// Only arithmetic needed by the walking-distance metric dimension is provided;
/// geospatial lookups (tile grids, coordinate distance) belong to the stops
/// database, which is external to this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Distance(f32);

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Add for Distance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Distance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0
    }
}

impl Sub for Distance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Distance {
    pub const ZERO: Self = Self(0.0);

    pub const fn from_meters(distance: f32) -> Self {
        Self(distance)
    }

    pub const fn as_meters(&self) -> f32 {
        self.0
    }
}

#[test]
fn distance_eq_test() {
    let a = Distance::from_meters(1000.0);
    let b = Distance::from_meters(1000.0);
    assert_eq!(a, b)
}

#[test]
fn distance_cmp_test() {
    let a = Distance::from_meters(1000.0);
    let b = Distance::from_meters(500.0);
    assert!(a > b)
}

#[test]
fn distance_sum_test() {
    let mut total = Distance::ZERO;
    total += Distance::from_meters(120.0);
    total += Distance::from_meters(80.5);
    assert_eq!(total, Distance::from_meters(200.5));
}
