use std::fmt::Debug;

use crate::connections::record::Connection;
use crate::shared::{Distance, Duration};

/// The result of comparing two entries under a [`Comparator`]: a total order
/// would never return `Incomparable`, but the Pareto/profile comparators this
/// crate needs routinely do (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    Less,
    Greater,
    Equal,
    Incomparable,
}

impl Dominance {
    pub fn reverse(self) -> Self {
        match self {
            Dominance::Less => Dominance::Greater,
            Dominance::Greater => Dominance::Less,
            other => other,
        }
    }
}

/// A polymorphic journey cost accumulated one connection at a time (§4.7).
///
/// `add` takes the `special` bit set by the metric guesser when a step is a
/// synthesised teleport rather than a real boarding: implementations must not
/// count it as a vehicle change.
pub trait Metric: Clone + Copy + Debug + PartialEq {
    fn zero() -> Self;
    fn add(&self, connection: &Connection, special: bool) -> Self;
}

/// The canonical metric: vehicles taken, accumulated travel time, and
/// accumulated walking distance (§4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardMetric {
    pub vehicles: u32,
    pub travel_time: Duration,
    pub walking_distance: Distance,
}

impl Metric for StandardMetric {
    fn zero() -> Self {
        Self {
            vehicles: 0,
            travel_time: Duration::ZERO,
            walking_distance: Distance::ZERO,
        }
    }

    fn add(&self, connection: &Connection, special: bool) -> Self {
        Self {
            vehicles: self.vehicles + if special { 0 } else { 1 },
            travel_time: self.travel_time + connection.travel_time,
            walking_distance: self.walking_distance,
        }
    }
}

impl StandardMetric {
    /// Accumulates a walk leg of `distance`, without touching vehicle count
    /// or travel time (walk legs are timed separately by the transfer
    /// generator and folded into journey segment times, not this metric).
    pub fn add_walk(&self, distance: Distance) -> Self {
        Self {
            walking_distance: self.walking_distance + distance,
            ..*self
        }
    }
}

/// A dominance comparator over some value type (§4.7, §4.8).
pub trait Comparator<T> {
    fn compare(&self, a: &T, b: &T) -> Dominance;
}

/// Strict Pareto dominance on `(#vehicles, travelTime)`: `a` dominates `b`
/// iff `a` is `<=` in both dimensions and `<` in at least one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParetoComparator;

impl Comparator<StandardMetric> for ParetoComparator {
    fn compare(&self, a: &StandardMetric, b: &StandardMetric) -> Dominance {
        let a_le = a.vehicles <= b.vehicles && a.travel_time <= b.travel_time;
        let b_le = b.vehicles <= a.vehicles && b.travel_time <= a.travel_time;
        match (a_le, b_le) {
            (true, true) => Dominance::Equal,
            (true, false) => Dominance::Less,
            (false, true) => Dominance::Greater,
            (false, false) => Dominance::Incomparable,
        }
    }
}

/// A point in the `(#vehicles, departureTime, arrivalTime)` profile space
/// compared by [`ProfileComparator`] (§4.7).
#[derive(Debug, Clone, Copy)]
pub struct ProfilePoint {
    pub vehicles: u32,
    pub departure_time: crate::shared::Time,
    pub arrival_time: crate::shared::Time,
}

/// Profile dominance on `(#vehicles, departureTime, arrivalTime)`: later
/// departure and earlier arrival both count as "better", so this comparator
/// reports bidirectional betterness as `Incomparable` rather than `Equal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileComparator;

impl Comparator<ProfilePoint> for ProfileComparator {
    fn compare(&self, a: &ProfilePoint, b: &ProfilePoint) -> Dominance {
        let a_better = a.vehicles < b.vehicles || a.departure_time > b.departure_time || a.arrival_time < b.arrival_time;
        let b_better = b.vehicles < a.vehicles || b.departure_time > a.departure_time || b.arrival_time < a.arrival_time;
        match (a_better, b_better) {
            (true, true) => Dominance::Incomparable,
            (true, false) => Dominance::Less,
            (false, true) => Dominance::Greater,
            (false, false) => Dominance::Equal,
        }
    }
}

/// Lexicographic composition of two comparators: falls back to `second` only
/// when `first` reports `Equal` (§4.7). Used to build "minimize transfers,
/// then time" orderings.
pub struct ChainedComparator<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> ChainedComparator<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<T, A, B> Comparator<T> for ChainedComparator<A, B>
where
    A: Comparator<T>,
    B: Comparator<T>,
{
    fn compare(&self, a: &T, b: &T) -> Dominance {
        match self.first.compare(a, b) {
            Dominance::Equal => self.second.compare(a, b),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::record::{BoardingPolicy, Mode, StopId};
    use crate::shared::Time;

    fn conn(travel_seconds: u32) -> Connection {
        Connection {
            departure_stop: StopId::new(0, 0, 0),
            arrival_stop: StopId::new(0, 0, 1),
            departure_time: Time::from_unix_seconds(0),
            travel_time: Duration::from_seconds(travel_seconds),
            departure_delay: Duration::ZERO,
            arrival_delay: Duration::ZERO,
            mode: Mode::new(BoardingPolicy::Normal, false),
        }
    }

    #[test]
    fn zero_then_add_counts_one_vehicle() {
        let m = StandardMetric::zero().add(&conn(600), false);
        assert_eq!(m.vehicles, 1);
        assert_eq!(m.travel_time, Duration::from_seconds(600));
    }

    #[test]
    fn special_add_does_not_count_a_vehicle() {
        let m = StandardMetric::zero().add(&conn(0), true);
        assert_eq!(m.vehicles, 0);
    }

    #[test]
    fn pareto_strict_domination() {
        let cmp = ParetoComparator;
        let a = StandardMetric {
            vehicles: 1,
            travel_time: Duration::from_seconds(100),
            walking_distance: Distance::ZERO,
        };
        let b = StandardMetric {
            vehicles: 2,
            travel_time: Duration::from_seconds(200),
            walking_distance: Distance::ZERO,
        };
        assert_eq!(cmp.compare(&a, &b), Dominance::Less);
        assert_eq!(cmp.compare(&b, &a), Dominance::Greater);
    }

    #[test]
    fn pareto_incomparable_on_mixed_tradeoff() {
        let cmp = ParetoComparator;
        let a = StandardMetric {
            vehicles: 1,
            travel_time: Duration::from_seconds(300),
            walking_distance: Distance::ZERO,
        };
        let b = StandardMetric {
            vehicles: 2,
            travel_time: Duration::from_seconds(100),
            walking_distance: Distance::ZERO,
        };
        assert_eq!(cmp.compare(&a, &b), Dominance::Incomparable);
    }

    #[test]
    fn profile_bidirectional_betterness_is_incomparable() {
        let cmp = ProfileComparator;
        let a = ProfilePoint {
            vehicles: 0,
            departure_time: Time::from_unix_seconds(100),
            arrival_time: Time::from_unix_seconds(500),
        };
        let b = ProfilePoint {
            vehicles: 0,
            departure_time: Time::from_unix_seconds(50),
            arrival_time: Time::from_unix_seconds(400),
        };
        // a departs later (better), b arrives earlier (better): incomparable.
        assert_eq!(cmp.compare(&a, &b), Dominance::Incomparable);
    }

    #[test]
    fn chained_falls_back_on_equal() {
        let cmp = ChainedComparator::new(ParetoComparator, ParetoComparator);
        let a = StandardMetric {
            vehicles: 1,
            travel_time: Duration::from_seconds(100),
            walking_distance: Distance::ZERO,
        };
        assert_eq!(cmp.compare(&a, &a), Dominance::Equal);
    }
}
