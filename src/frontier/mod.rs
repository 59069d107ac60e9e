use crate::journey::Journey;
use crate::metric::{Comparator, Dominance, Metric};
use crate::shared::Time;

/// One candidate in a [`StopFrontier`]: a departure time at the frontier's
/// stop, the metric accumulated so far, and the journey that achieved it.
#[derive(Debug, Clone)]
pub struct Entry<M: Metric> {
    pub pivot_time: Time,
    pub metric: M,
    pub journey: Journey<M>,
}

/// Outcome of [`StopFrontier::try_add`] (§4.8).
pub enum TryAddResult<M: Metric> {
    Added,
    DominatedByExisting,
    /// Carries the entries removed because the new one dominates them.
    DominatesExisting(Vec<Entry<M>>),
}

/// A per-stop Pareto set of (pivotTime, metric, journey) candidates, none of
/// which dominates another under the frontier's comparator (§4.8).
///
/// Implemented as a flat list: insertion is `O(|frontier|)`, scanning both
/// directions for domination. This mirrors the packed/flat-array texture the
/// rest of this crate's storage favors over tree-shaped indices.
pub struct StopFrontier<M: Metric, C> {
    entries: Vec<Entry<M>>,
    comparator: C,
}

impl<M: Metric, C> StopFrontier<M, C>
where
    C: Comparator<(Time, M)>,
{
    pub fn new(comparator: C) -> Self {
        Self {
            entries: Vec::new(),
            comparator,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<M>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(entry: &Entry<M>) -> (Time, M) {
        (entry.pivot_time, entry.metric)
    }

    /// Inserts `entry`, removing any existing entries it dominates. Entries
    /// that compare `Equal` to the incoming one are kept (first-inserted
    /// wins the tie, per §4.9's tie-breaking rule) and the new one is
    /// reported as dominated so the caller does not also keep it.
    pub fn try_add(&mut self, entry: Entry<M>) -> TryAddResult<M> {
        let incoming_key = Self::key(&entry);
        let mut removed = Vec::new();
        let mut dominated_by_existing = false;

        self.entries.retain(|existing| {
            match self.comparator.compare(&incoming_key, &Self::key(existing)) {
                Dominance::Greater => {
                    // existing dominates incoming (comparator orients "Less"
                    // as "better"); keep existing, drop the new candidate.
                    dominated_by_existing = true;
                    true
                }
                Dominance::Less => false,
                Dominance::Equal => {
                    dominated_by_existing = true;
                    true
                }
                Dominance::Incomparable => true,
            }
        });

        if dominated_by_existing {
            return TryAddResult::DominatedByExisting;
        }

        // second pass: collect anything the incoming entry strictly beats,
        // now that we know it survives.
        let mut kept = Vec::with_capacity(self.entries.len());
        for existing in self.entries.drain(..) {
            match self.comparator.compare(&incoming_key, &Self::key(&existing)) {
                Dominance::Less => removed.push(existing),
                _ => kept.push(existing),
            }
        }
        self.entries = kept;
        self.entries.push(entry);

        if removed.is_empty() {
            TryAddResult::Added
        } else {
            TryAddResult::DominatesExisting(removed)
        }
    }

    pub fn merge(&mut self, other: StopFrontier<M, C>) {
        for entry in other.entries {
            self.try_add(entry);
        }
    }

    /// Drops entries whose `lower_bound` (computed by a metric guesser) is
    /// already dominated by `best_known`, under `self`'s comparator.
    pub fn prune_by_lower_bound(&mut self, best_known: &(Time, M), lower_bounds: impl Fn(&Entry<M>) -> (Time, M)) {
        self.entries
            .retain(|e| !matches!(self.comparator.compare(best_known, &lower_bounds(e)), Dominance::Less));
    }
}

/// For a single trip id, the best known continuation from the current scan
/// position to the destination: one entry under the Pareto comparator over
/// the metric alone (§4.8) — unlike [`StopFrontier`], a trip's continuation
/// isn't indexed by pivot time, since a trip has exactly one onward vehicle
/// regardless of where along it a rider boards.
pub struct TripFrontier<M: Metric, C> {
    entries: Vec<Entry<M>>,
    comparator: C,
}

impl<M: Metric, C> TripFrontier<M, C>
where
    C: Comparator<M>,
{
    pub fn new(comparator: C) -> Self {
        Self {
            entries: Vec::new(),
            comparator,
        }
    }

    pub fn best(&self) -> Option<&Entry<M>> {
        self.entries.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<M>> {
        self.entries.iter()
    }

    pub fn try_add(&mut self, entry: Entry<M>) -> TryAddResult<M> {
        let mut removed = Vec::new();
        let mut dominated = false;

        self.entries.retain(|existing| {
            match self.comparator.compare(&entry.metric, &existing.metric) {
                Dominance::Greater | Dominance::Equal => {
                    dominated = true;
                    true
                }
                Dominance::Less => false,
                Dominance::Incomparable => true,
            }
        });

        if dominated {
            return TryAddResult::DominatedByExisting;
        }

        let mut kept = Vec::with_capacity(self.entries.len());
        for existing in self.entries.drain(..) {
            if self.comparator.compare(&entry.metric, &existing.metric) == Dominance::Less {
                removed.push(existing);
            } else {
                kept.push(existing);
            }
        }
        self.entries = kept;
        self.entries.push(entry);

        if removed.is_empty() {
            TryAddResult::Added
        } else {
            TryAddResult::DominatesExisting(removed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::record::StopId;
    use crate::journey::genesis;
    use crate::metric::{Dominance, ParetoComparator, StandardMetric};
    use crate::shared::Duration;

    struct TimeIgnoringPareto;
    impl Comparator<(Time, StandardMetric)> for TimeIgnoringPareto {
        fn compare(&self, a: &(Time, StandardMetric), b: &(Time, StandardMetric)) -> Dominance {
            ParetoComparator.compare(&a.1, &b.1)
        }
    }

    fn entry(vehicles: u32, travel: u32) -> Entry<StandardMetric> {
        Entry {
            pivot_time: Time::from_unix_seconds(0),
            metric: StandardMetric {
                vehicles,
                travel_time: Duration::from_seconds(travel),
                walking_distance: crate::shared::Distance::ZERO,
            },
            journey: genesis(StopId::new(0, 0, 0), Time::from_unix_seconds(0)),
        }
    }

    #[test]
    fn non_dominated_entries_both_survive() {
        let mut f = StopFrontier::new(TimeIgnoringPareto);
        assert!(matches!(f.try_add(entry(1, 300)), TryAddResult::Added));
        assert!(matches!(f.try_add(entry(2, 100)), TryAddResult::Added));
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn dominated_entry_is_rejected() {
        let mut f = StopFrontier::new(TimeIgnoringPareto);
        f.try_add(entry(1, 100));
        assert!(matches!(f.try_add(entry(2, 200)), TryAddResult::DominatedByExisting));
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn dominating_entry_evicts_existing() {
        let mut f = StopFrontier::new(TimeIgnoringPareto);
        f.try_add(entry(2, 200));
        match f.try_add(entry(1, 100)) {
            TryAddResult::DominatesExisting(removed) => assert_eq!(removed.len(), 1),
            _ => panic!("expected DominatesExisting"),
        }
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn trip_frontier_keeps_only_the_best() {
        let mut t = TripFrontier::new(ParetoComparator);
        t.try_add(entry(2, 200));
        t.try_add(entry(1, 100));
        assert_eq!(t.best().unwrap().metric.vehicles, 1);
    }
}
