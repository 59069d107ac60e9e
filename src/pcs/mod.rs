pub mod guesser;

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::connections::record::{Connection, ConnectionId, StopId, TripId};
use crate::connections::ConnectionsDb;
use crate::frontier::{Entry, StopFrontier, TripFrontier, TryAddResult};
use crate::journey::{self, Journey, StepKind};
use crate::metric::{Comparator, Dominance, Metric, ParetoComparator, StandardMetric};
use crate::shared::{Distance, Time};
use crate::transfer::TransferGenerator;

pub use guesser::MetricGuesser;

/// Comparator over `(pivotTime, metric)` pairs, specialized to
/// [`StandardMetric`] (§4.7's "profile" comparator): fewer vehicles, a later
/// pivot (departure) time, and less accumulated travel time are each a
/// one-sided improvement; a tradeoff between them is `Incomparable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardProfileComparator;

impl Comparator<(Time, StandardMetric)> for StandardProfileComparator {
    fn compare(&self, a: &(Time, StandardMetric), b: &(Time, StandardMetric)) -> Dominance {
        let (a_time, a_metric) = a;
        let (b_time, b_metric) = b;
        let a_better =
            a_metric.vehicles < b_metric.vehicles || *a_time > *b_time || a_metric.travel_time < b_metric.travel_time;
        let b_better =
            b_metric.vehicles < a_metric.vehicles || *b_time > *a_time || b_metric.travel_time < a_metric.travel_time;
        match (a_better, b_better) {
            (true, true) => Dominance::Incomparable,
            (true, false) => Dominance::Less,
            (false, true) => Dominance::Greater,
            (false, false) => Dominance::Equal,
        }
    }
}

/// Inputs to one PCS run (§4.9).
pub struct ScanSettings<'a, T: TransferGenerator> {
    pub origin: StopId,
    pub destination: StopId,
    pub window_start: Time,
    pub window_end: Time,
    pub transfer_generator: &'a T,
    pub max_transfers: u32,
    /// Meters-per-second used to price a walk leg's `walking_distance`
    /// metric dimension from the generator's reported `Duration` (§1's
    /// ambient "walking speed" config default).
    pub walking_speed_mps: f32,
    pub connection_filter: Option<&'a dyn Fn(&Connection) -> bool>,
    pub guesser: Option<&'a dyn MetricGuesser<StandardMetric>>,
    pub deadline: Option<&'a dyn Fn() -> bool>,
}

/// The result of a PCS run: the origin's frontier, and whether a deadline
/// cut the scan short (§5 "Cancellation/timeouts").
pub struct ScanOutcome {
    pub origin_frontier: Vec<Entry<StandardMetric>>,
    pub truncated: bool,
}

/// The backward-in-time journey solver (§2, §4.9).
///
/// Holds `S[stop]` (profile Pareto stop frontiers) and `T[trip]` (best known
/// trip continuations), and drives a [`DepartureEnumerator`](crate::connections::enumerator::DepartureEnumerator)
/// backward from `window_end`.
pub struct Pcs<'a, T: TransferGenerator> {
    db: &'a ConnectionsDb,
    settings: ScanSettings<'a, T>,
    stop_frontiers: HashMap<StopId, StopFrontier<StandardMetric, StandardProfileComparator>>,
    trip_frontiers: HashMap<TripId, TripFrontier<StandardMetric, ParetoComparator>>,
}

impl<'a, T: TransferGenerator> Pcs<'a, T> {
    pub fn new(db: &'a ConnectionsDb, settings: ScanSettings<'a, T>) -> Self {
        let mut stop_frontiers = HashMap::new();
        let seed_journey: Journey<StandardMetric> = journey::genesis(settings.destination, settings.window_end);
        let mut destination_frontier = StopFrontier::new(StandardProfileComparator);
        destination_frontier.try_add(Entry {
            pivot_time: settings.window_end,
            metric: StandardMetric::zero(),
            journey: seed_journey,
        });
        stop_frontiers.insert(settings.destination, destination_frontier);

        Self {
            db,
            settings,
            stop_frontiers,
            trip_frontiers: HashMap::new(),
        }
    }

    fn walk_distance(&self, seconds: u32) -> Distance {
        Distance::from_meters(seconds as f32 * self.settings.walking_speed_mps)
    }

    /// Runs the main reverse-time loop to completion (or until the deadline
    /// predicate fires), returning the origin's surviving frontier.
    pub fn run(&mut self) -> ScanOutcome {
        self.scan(false)
    }

    /// The EAS/LAS degenerate case (§4.9): stops as soon as the origin
    /// frontier gains its first non-dominated entry.
    pub fn run_until_first_origin_entry(&mut self) -> ScanOutcome {
        self.scan(true)
    }

    fn scan(&mut self, stop_at_first_origin_entry: bool) -> ScanOutcome {
        let mut enumerator = self.db.enumerate_backward();
        enumerator.move_to(self.settings.window_end);
        let mut truncated = false;

        loop {
            if let Some(deadline) = self.settings.deadline {
                if deadline() {
                    truncated = true;
                    break;
                }
            }

            let get_departure = |id| self.db.departure_time(id);
            let Some(internal) = enumerator.previous(get_departure) else {
                break;
            };

            let Some(record) = self.db.get(internal) else {
                continue;
            };
            let connection = record.connection;

            if connection.departure_time < self.settings.window_start {
                break;
            }

            if let Some(filter) = self.settings.connection_filter {
                if !filter(&connection) {
                    continue;
                }
            }

            let connection_id = ConnectionId {
                database: self.db.database(),
                internal,
            };

            self.process_connection(connection_id, &connection, record.trip);

            trace!(
                departure = connection.departure_time.as_unix_seconds(),
                stops = self.stop_frontiers.len(),
                "scan round"
            );

            if stop_at_first_origin_entry {
                if let Some(origin_frontier) = self.stop_frontiers.get(&self.settings.origin) {
                    if !origin_frontier.is_empty() {
                        break;
                    }
                }
            }
        }

        debug!(truncated, "scan complete");
        ScanOutcome {
            origin_frontier: self.collect_origin_frontier(),
            truncated,
        }
    }

    fn collect_origin_frontier(&self) -> Vec<Entry<StandardMetric>> {
        self.stop_frontiers
            .get(&self.settings.origin)
            .map(|f| {
                f.iter()
                    .filter(|e| e.pivot_time >= self.settings.window_start)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn process_connection(&mut self, connection_id: ConnectionId, connection: &Connection, trip: TripId) {
        let mut candidates: Vec<(Entry<StandardMetric>, bool)> = Vec::new();

        if connection.mode.can_board() {
            if let Some(best) = self.trip_frontiers.get(&trip).and_then(|f| f.best()) {
                let metric = best.metric.add(connection, false);
                let j = journey::chain(
                    &best.journey,
                    connection_id,
                    connection.departure_stop,
                    connection.departure_time,
                    trip,
                    metric,
                );
                candidates.push((
                    Entry {
                        pivot_time: connection.departure_time,
                        metric,
                        journey: j,
                    },
                    false,
                ));
            }
        }

        if connection.mode.can_board() && connection.arrival_stop == self.settings.destination {
            let metric = StandardMetric::zero().add(connection, false);
            let seed = self
                .stop_frontiers
                .get(&self.settings.destination)
                .and_then(|f| f.iter().next())
                .map(|e| e.journey.clone())
                .unwrap_or_else(|| journey::genesis(self.settings.destination, self.settings.window_end));
            let j = journey::chain(
                &seed,
                connection_id,
                connection.departure_stop,
                connection.departure_time,
                trip,
                metric,
            );
            candidates.push((
                Entry {
                    pivot_time: connection.departure_time,
                    metric,
                    journey: j,
                },
                false,
            ));
        }

        if connection.mode.can_board() && connection.mode.can_alight() {
            let is_first_leg = connection.arrival_stop == self.settings.origin;
            let reachable: Vec<(StopId, Entry<StandardMetric>, Distance)> = self
                .stop_frontiers
                .iter()
                .filter(|(&stop, _)| stop != connection.departure_stop)
                .filter_map(|(&stop, frontier)| {
                    let is_last_leg = stop == self.settings.destination;
                    let walk = self.settings.transfer_generator.time_between_for_leg(
                        connection.arrival_stop,
                        stop,
                        is_first_leg,
                        is_last_leg,
                    )?;
                    let arrival_with_walk = connection.arrival_time() + walk;
                    let distance = self.walk_distance(walk.as_seconds());
                    let entries: Vec<(StopId, Entry<StandardMetric>, Distance)> = frontier
                        .iter()
                        .filter(|e| e.pivot_time >= arrival_with_walk)
                        .map(|e| (stop, e.clone(), distance))
                        .collect();
                    Some(entries)
                })
                .flatten()
                .collect();

            for (stop, entry, distance) in reachable {
                let walk_metric = entry.metric.add_walk(distance);
                let walk_segment =
                    journey::chain_special(&entry.journey, StepKind::Walk, stop, entry.pivot_time, walk_metric);
                let ride_metric = walk_metric.add(connection, false);
                let j = journey::chain(
                    &walk_segment,
                    connection_id,
                    connection.departure_stop,
                    connection.departure_time,
                    trip,
                    ride_metric,
                );
                candidates.push((
                    Entry {
                        pivot_time: connection.departure_time,
                        metric: ride_metric,
                        journey: j,
                    },
                    true,
                ));
            }
        }

        let candidates = Self::reduce_non_dominated(candidates);

        for (entry, is_walk_transfer) in &candidates {
            if !is_walk_transfer {
                self.trip_frontiers
                    .entry(trip)
                    .or_insert_with(|| TripFrontier::new(ParetoComparator))
                    .try_add(entry.clone());
            }
        }

        // Read before the `.entry()` call below takes a mutable borrow of
        // `stop_frontiers` — the origin's current best is the only admissible
        // pruning baseline, and the borrow checker won't allow holding it
        // alongside a mutable entry on the same map.
        let best_known_at_origin = self
            .stop_frontiers
            .get(&self.settings.origin)
            .and_then(|f| f.iter().min_by_key(|e| e.pivot_time))
            .map(|e| (e.pivot_time, e.metric));

        for (entry, _) in candidates {
            let frontier = self
                .stop_frontiers
                .entry(connection.departure_stop)
                .or_insert_with(|| StopFrontier::new(StandardProfileComparator));
            let mutated = matches!(
                frontier.try_add(entry),
                TryAddResult::Added | TryAddResult::DominatesExisting(_)
            );

            if mutated {
                if let Some(guesser) = self.settings.guesser {
                    if let Some(best_known) = best_known_at_origin {
                        if guesser.should_be_checked(connection.departure_time) {
                            frontier.prune_by_lower_bound(&best_known, |e| {
                                (e.pivot_time, guesser.least_theoretical_continuation(e, connection.departure_time))
                            });
                        }
                    }
                }
            }
        }
    }

    /// Keeps only entries no other candidate in the same batch dominates
    /// (§4.9 step 3), preserving first-inserted order among ties.
    fn reduce_non_dominated(
        candidates: Vec<(Entry<StandardMetric>, bool)>,
    ) -> Vec<(Entry<StandardMetric>, bool)> {
        let cmp = StandardProfileComparator;
        let mut kept: Vec<(Entry<StandardMetric>, bool)> = Vec::new();
        'outer: for (entry, is_walk) in candidates {
            let key = (entry.pivot_time, entry.metric);
            let mut i = 0;
            while i < kept.len() {
                let existing_key = (kept[i].0.pivot_time, kept[i].0.metric);
                match cmp.compare(&key, &existing_key) {
                    Dominance::Greater | Dominance::Equal => continue 'outer,
                    Dominance::Less => {
                        kept.remove(i);
                    }
                    Dominance::Incomparable => i += 1,
                }
            }
            kept.push((entry, is_walk));
        }
        kept
    }
}
