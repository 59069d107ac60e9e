use crate::connections::record::StopId;
use crate::shared::{Distance, Duration};

/// Walk/transfer time between two stops that are not the same trip's next
/// stop (§6 "Transfer generator interface").
///
/// Implementations are pluggable "other-mode" strategies — this crate only
/// defines the trait boundary and a library-provided composite; concrete
/// street-routing generators are external collaborators (§1).
pub trait TransferGenerator {
    /// Walking time from `from` to `to`, or `None` if unreachable within
    /// this generator's range.
    fn time_between(&self, from: StopId, to: StopId) -> Option<Duration>;

    /// Leg-aware variant of [`time_between`](Self::time_between): tells a
    /// composite generator whether this walk touches the journey's true
    /// origin or destination, so it can apply a first/last-mile policy
    /// instead of the ordinary middle-transfer one (§1, §4.9). Generators
    /// that don't distinguish legs can ignore the flags and fall back to
    /// `time_between`.
    fn time_between_for_leg(&self, from: StopId, to: StopId, is_first_leg: bool, is_last_leg: bool) -> Option<Duration> {
        let _ = (is_first_leg, is_last_leg);
        self.time_between(from, to)
    }

    /// Walking time from `from` to every stop in `targets` that is reachable;
    /// unreachable targets are simply absent from the result.
    fn times_between(&self, from: StopId, targets: &[StopId]) -> Vec<(StopId, Duration)> {
        targets
            .iter()
            .filter_map(|&to| self.time_between(from, to).map(|d| (to, d)))
            .collect()
    }

    /// The maximum distance this generator considers reachable, used by
    /// spatial prefilters upstream of the scanner.
    fn range(&self) -> Distance;

    /// A short label identifying this generator in logs/config.
    fn identifier(&self) -> &str;
}

/// A single named leg of a [`CompositeTransferGenerator`]: e.g. "walking" for
/// in-network transfers, "first-mile"/"last-mile" for the origin/destination
/// legs a street-routing collaborator would otherwise own.
pub struct NamedGenerator {
    pub identifier: String,
    pub generator: Box<dyn TransferGenerator>,
}

/// The library-provided first/last-mile composite (§1, §4.9): dispatches to
/// a distinct generator for the trip-start leg, the trip-end leg, and
/// ordinary mid-journey transfers, falling through the list in order and
/// taking the first reachable result.
pub struct CompositeTransferGenerator {
    first_mile: Option<NamedGenerator>,
    last_mile: Option<NamedGenerator>,
    middle: Vec<NamedGenerator>,
}

impl CompositeTransferGenerator {
    pub fn new() -> Self {
        Self {
            first_mile: None,
            last_mile: None,
            middle: Vec::new(),
        }
    }

    pub fn with_first_mile(mut self, generator: NamedGenerator) -> Self {
        self.first_mile = Some(generator);
        self
    }

    pub fn with_last_mile(mut self, generator: NamedGenerator) -> Self {
        self.last_mile = Some(generator);
        self
    }

    pub fn with_middle(mut self, generator: NamedGenerator) -> Self {
        self.middle.push(generator);
        self
    }

    fn candidates(&self, is_first_leg: bool, is_last_leg: bool) -> impl Iterator<Item = &NamedGenerator> {
        let first = if is_first_leg { self.first_mile.as_ref() } else { None };
        let last = if is_last_leg { self.last_mile.as_ref() } else { None };
        first.into_iter().chain(last).chain(self.middle.iter())
    }
}

impl Default for CompositeTransferGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferGenerator for CompositeTransferGenerator {
    fn time_between(&self, from: StopId, to: StopId) -> Option<Duration> {
        self.time_between_for_leg(from, to, false, false)
    }

    fn time_between_for_leg(&self, from: StopId, to: StopId, is_first_leg: bool, is_last_leg: bool) -> Option<Duration> {
        self.candidates(is_first_leg, is_last_leg)
            .find_map(|g| g.generator.time_between(from, to))
    }

    fn range(&self) -> Distance {
        self.middle
            .iter()
            .chain(self.first_mile.iter())
            .chain(self.last_mile.iter())
            .map(|g| g.generator.range())
            .fold(Distance::ZERO, |acc, d| if d > acc { d } else { acc })
    }

    fn identifier(&self) -> &str {
        "composite"
    }
}

/// A trivial generator connecting stops within a fixed radius at a constant
/// walking speed; useful as a default middle-leg generator and in tests.
pub struct ConstantSpeedGenerator {
    pub speed_meters_per_second: f32,
    pub range: Distance,
    pub distance_between: Box<dyn Fn(StopId, StopId) -> Distance>,
}

impl TransferGenerator for ConstantSpeedGenerator {
    fn time_between(&self, from: StopId, to: StopId) -> Option<Duration> {
        let d = (self.distance_between)(from, to);
        if d > self.range {
            return None;
        }
        let seconds = (d.as_meters() / self.speed_meters_per_second).ceil().max(0.0);
        Some(Duration::from_seconds(seconds as u32))
    }

    fn range(&self) -> Distance {
        self.range
    }

    fn identifier(&self) -> &str {
        "constant-speed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(i: u32) -> StopId {
        StopId::new(0, 0, i)
    }

    #[test]
    fn constant_speed_generator_respects_range() {
        let gen = ConstantSpeedGenerator {
            speed_meters_per_second: 1.4,
            range: Distance::from_meters(500.0),
            distance_between: Box::new(|_, _| Distance::from_meters(100.0)),
        };
        assert!(gen.time_between(stop(0), stop(1)).is_some());

        let far = ConstantSpeedGenerator {
            speed_meters_per_second: 1.4,
            range: Distance::from_meters(500.0),
            distance_between: Box::new(|_, _| Distance::from_meters(600.0)),
        };
        assert!(far.time_between(stop(0), stop(1)).is_none());
    }

    #[test]
    fn composite_falls_through_to_middle_when_no_first_mile() {
        let composite = CompositeTransferGenerator::new().with_middle(NamedGenerator {
            identifier: "walk".into(),
            generator: Box::new(ConstantSpeedGenerator {
                speed_meters_per_second: 1.4,
                range: Distance::from_meters(500.0),
                distance_between: Box::new(|_, _| Distance::from_meters(50.0)),
            }),
        });
        assert!(composite.time_between(stop(0), stop(1)).is_some());
    }

    #[test]
    fn first_mile_generator_is_only_reachable_on_the_first_leg() {
        let composite = CompositeTransferGenerator::new().with_first_mile(NamedGenerator {
            identifier: "first-mile".into(),
            generator: Box::new(ConstantSpeedGenerator {
                speed_meters_per_second: 1.4,
                range: Distance::from_meters(500.0),
                distance_between: Box::new(|_, _| Distance::from_meters(50.0)),
            }),
        });

        assert!(composite.time_between_for_leg(stop(0), stop(1), true, false).is_some());
        assert!(composite.time_between_for_leg(stop(0), stop(1), false, false).is_none());
        assert!(composite.time_between(stop(0), stop(1)).is_none());
    }
}
