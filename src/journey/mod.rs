use std::rc::Rc;

use crate::connections::record::{ConnectionId, StopId, TripId};
use crate::metric::Metric;
use crate::shared::Time;

/// What a [`Segment`] represents, beyond "ride this connection" (§3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// The seed of a backward scan: no connection taken yet.
    Genesis,
    /// Boarded `ConnectionId` at this segment.
    Ride(ConnectionId),
    /// A walk/transfer leg, not tied to a specific connection.
    Walk,
    /// A fan-out point: see `alternative_previous` on [`Segment`].
    Joined,
}

/// One link of a persistent journey chain, built backward from the
/// destination (or forward from the origin, symmetrically) (§3, §4.6).
///
/// Segments are immutable and reference-counted: sibling candidates that
/// share a tail share the same [`Rc`] nodes rather than copying them, and the
/// structure is a DAG (via `alternative_previous`), never a cycle, so no
/// arena is needed to break reference cycles.
#[derive(Debug)]
pub struct Segment<M: Metric> {
    pub location: StopId,
    pub time: Time,
    pub trip: Option<TripId>,
    pub kind: StepKind,
    pub metric: M,
    pub previous: Option<Journey<M>>,
    /// Set only on [`StepKind::Joined`] nodes: the second of two equivalent
    /// tails being fanned out without duplicating either.
    pub alternative_previous: Option<Journey<M>>,
}

/// A shared handle to a journey's tip; cloning is O(1) (an `Rc` bump).
pub type Journey<M> = Rc<Segment<M>>;

/// Seeds a new chain at `location`/`time` with the zero metric (§4.9's
/// destination-frontier seed, or an origin-forward seed symmetrically).
pub fn genesis<M: Metric>(location: StopId, time: Time) -> Journey<M> {
    Rc::new(Segment {
        location,
        time,
        trip: None,
        kind: StepKind::Genesis,
        metric: M::zero(),
        previous: None,
        alternative_previous: None,
    })
}

/// Extends `previous` by riding `connection_id`, landing at `location`/`time`
/// on `trip`, accumulating `metric` via [`Metric::add`] (the `special` bit is
/// threaded through by the caller, which already computed `metric`).
pub fn chain<M: Metric>(
    previous: &Journey<M>,
    connection_id: ConnectionId,
    location: StopId,
    time: Time,
    trip: TripId,
    metric: M,
) -> Journey<M> {
    Rc::new(Segment {
        location,
        time,
        trip: Some(trip),
        kind: StepKind::Ride(connection_id),
        metric,
        previous: Some(previous.clone()),
        alternative_previous: None,
    })
}

/// Extends `previous` with a non-riding step (walk/transfer), landing at
/// `location`/`time`.
pub fn chain_special<M: Metric>(
    previous: &Journey<M>,
    kind: StepKind,
    location: StopId,
    time: Time,
    metric: M,
) -> Journey<M> {
    debug_assert!(!matches!(kind, StepKind::Ride(_)));
    Rc::new(Segment {
        location,
        time,
        trip: None,
        kind,
        metric,
        previous: Some(previous.clone()),
        alternative_previous: None,
    })
}

/// Fans two equivalent tails (`a` and `b`) into one [`StepKind::Joined`] node
/// at `a`'s location/time/metric, without duplicating either tail.
pub fn join<M: Metric>(a: &Journey<M>, b: &Journey<M>) -> Journey<M> {
    Rc::new(Segment {
        location: a.location,
        time: a.time,
        trip: None,
        kind: StepKind::Joined,
        metric: a.metric,
        previous: Some(a.clone()),
        alternative_previous: Some(b.clone()),
    })
}

/// Flattens a single-chain journey (no `Joined` branches) from genesis to
/// tip, in travel order.
pub fn to_list<M: Metric>(tip: &Journey<M>) -> Vec<Journey<M>> {
    let mut out = Vec::new();
    let mut cursor = Some(tip.clone());
    while let Some(node) = cursor {
        cursor = node.previous.clone();
        out.push(node);
    }
    out.reverse();
    out
}

/// Rebuilds the itinerary in the opposite chain direction, returning one
/// list per branch: a `Joined` node duplicates the itinerary built so far
/// across both of its tails (§4.6).
pub fn reverse<M: Metric>(tip: &Journey<M>) -> Vec<Vec<Journey<M>>> {
    fn walk<M: Metric>(node: &Journey<M>, acc: &[Journey<M>], out: &mut Vec<Vec<Journey<M>>>) {
        let mut acc = acc.to_vec();
        acc.push(node.clone());
        match (&node.previous, &node.alternative_previous) {
            (Some(prev), Some(alt)) => {
                walk(prev, &acc, out);
                walk(alt, &acc, out);
            }
            (Some(prev), None) => walk(prev, &acc, out),
            (None, _) => out.push(acc),
        }
    }
    let mut out = Vec::new();
    walk(tip, &[], &mut out);
    out
}

/// Replays the chain under a different metric, preserving its structure
/// (used when a post-hoc metric differs from the one the scan ran under).
pub fn measure_with<M: Metric, N: Metric>(
    tip: &Journey<M>,
    step: impl Fn(&Segment<M>, Option<&Segment<N>>) -> N + Copy,
) -> Journey<N> {
    fn go<M: Metric, N: Metric>(
        node: &Journey<M>,
        step: impl Fn(&Segment<M>, Option<&Segment<N>>) -> N + Copy,
    ) -> Journey<N> {
        let previous = node.previous.as_ref().map(|p| go(p, step));
        let alternative_previous = node.alternative_previous.as_ref().map(|p| go(p, step));
        let metric = step(node, previous.as_deref());
        Rc::new(Segment {
            location: node.location,
            time: node.time,
            trip: node.trip,
            kind: node.kind,
            metric,
            previous,
            alternative_previous,
        })
    }
    go(tip, step)
}

/// A single ride spanning possibly several consecutive same-trip segments,
/// produced by [`summarize`].
#[derive(Debug, Clone, Copy)]
pub struct SummarizedConnection {
    pub trip: TripId,
    pub departure_stop: StopId,
    pub arrival_stop: StopId,
    pub first_departure_time: Time,
    pub last_arrival_time: Time,
}

/// Collapses consecutive same-trip ride segments into one
/// [`SummarizedConnection`] per uninterrupted ride, in travel order.
pub fn summarize<M: Metric>(tip: &Journey<M>) -> Vec<SummarizedConnection> {
    let legs = to_list(tip);
    let mut out = Vec::new();
    let mut current: Option<SummarizedConnection> = None;

    for window in legs.windows(2) {
        let (from, to) = (&window[0], &window[1]);
        if let (StepKind::Ride(_), Some(trip)) = (to.kind, to.trip) {
            match &mut current {
                Some(c) if c.trip.internal == trip.internal && c.trip.database == trip.database => {
                    c.last_arrival_time = to.time;
                    c.arrival_stop = to.location;
                }
                _ => {
                    if let Some(done) = current.take() {
                        out.push(done);
                    }
                    current = Some(SummarizedConnection {
                        trip,
                        departure_stop: from.location,
                        arrival_stop: to.location,
                        first_departure_time: from.time,
                        last_arrival_time: to.time,
                    });
                }
            }
        } else if let Some(done) = current.take() {
            out.push(done);
        }
    }
    if let Some(done) = current.take() {
        out.push(done);
    }
    out
}
