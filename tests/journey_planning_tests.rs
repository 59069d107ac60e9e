use connscan::connections::record::{BoardingPolicy, Connection, Mode, StopId};
use connscan::connections::ConnectionsDb;
use connscan::shared::{Distance, Duration, Time};
use connscan::transfer::{CompositeTransferGenerator, ConstantSpeedGenerator, NamedGenerator};
use connscan::QueryBuilder;

fn stop(local: u32) -> StopId {
    StopId::new(0, 0, local)
}

/// A minimum-transfer-time stand-in: free to move between the same physical
/// stop, unreachable otherwise. Stands in for the in-station transfer a real
/// street-routing generator would normally supply.
fn in_station_transfers() -> CompositeTransferGenerator {
    CompositeTransferGenerator::new().with_middle(NamedGenerator {
        identifier: "in-station".into(),
        generator: Box::new(ConstantSpeedGenerator {
            speed_meters_per_second: 1.0,
            range: Distance::ZERO,
            distance_between: Box::new(|from, to| {
                if from == to {
                    Distance::ZERO
                } else {
                    Distance::from_meters(f32::MAX)
                }
            }),
        }),
    })
}

fn insert(db: &mut ConnectionsDb, global_id: &str, trip: u32, conn: Connection) {
    db.add_or_update(global_id, trip, conn);
}

#[test]
fn two_leg_journey_is_found_through_a_connecting_stop() {
    let mut db = ConnectionsDb::new(0);
    insert(
        &mut db,
        "leg1",
        1,
        Connection {
            departure_stop: stop(0),
            arrival_stop: stop(1),
            departure_time: Time::from_unix_seconds(1_000),
            travel_time: Duration::from_seconds(300),
            departure_delay: Duration::ZERO,
            arrival_delay: Duration::ZERO,
            mode: Mode::new(BoardingPolicy::Normal, false),
        },
    );
    insert(
        &mut db,
        "leg2",
        2,
        Connection {
            departure_stop: stop(1),
            arrival_stop: stop(2),
            departure_time: Time::from_unix_seconds(1_400),
            travel_time: Duration::from_seconds(300),
            departure_delay: Duration::ZERO,
            arrival_delay: Duration::ZERO,
            mode: Mode::new(BoardingPolicy::Normal, false),
        },
    );

    let gen = in_station_transfers();
    let outcome = QueryBuilder::new(&db, &gen)
        .select_stops(stop(0), stop(2))
        .select_time_frame(Time::from_unix_seconds(0), Time::from_unix_seconds(2_000))
        .calculate_all_journeys()
        .unwrap();

    assert_eq!(outcome.origin_frontier.len(), 1);
    assert_eq!(outcome.origin_frontier[0].metric.vehicles, 2);
}

#[test]
fn cancelled_connection_is_excluded_by_a_filter() {
    let mut db = ConnectionsDb::new(0);
    insert(
        &mut db,
        "cancelled",
        1,
        Connection {
            departure_stop: stop(0),
            arrival_stop: stop(1),
            departure_time: Time::from_unix_seconds(1_000),
            travel_time: Duration::from_seconds(300),
            departure_delay: Duration::ZERO,
            arrival_delay: Duration::ZERO,
            mode: Mode::new(BoardingPolicy::Normal, true),
        },
    );

    let gen = CompositeTransferGenerator::new();
    let reject_cancelled = |c: &Connection| !c.mode.is_cancelled();
    let outcome = QueryBuilder::new(&db, &gen)
        .select_stops(stop(0), stop(1))
        .select_time_frame(Time::from_unix_seconds(0), Time::from_unix_seconds(2_000))
        .with_connection_filter(&reject_cancelled)
        .calculate_all_journeys()
        .unwrap();

    assert!(outcome.origin_frontier.is_empty());
}

#[test]
fn database_survives_a_wire_format_roundtrip_and_still_answers_queries() {
    let mut db = ConnectionsDb::new(0);
    insert(
        &mut db,
        "only",
        1,
        Connection {
            departure_stop: stop(0),
            arrival_stop: stop(1),
            departure_time: Time::from_unix_seconds(500),
            travel_time: Duration::from_seconds(120),
            departure_delay: Duration::ZERO,
            arrival_delay: Duration::ZERO,
            mode: Mode::new(BoardingPolicy::Normal, false),
        },
    );

    let bytes = db.to_bytes();
    let restored = ConnectionsDb::from_bytes(0, &bytes).unwrap();

    let gen = CompositeTransferGenerator::new();
    let outcome = QueryBuilder::new(&restored, &gen)
        .select_stops(stop(0), stop(1))
        .select_time_frame(Time::from_unix_seconds(0), Time::from_unix_seconds(1_000))
        .calculate_all_journeys()
        .unwrap();

    assert_eq!(outcome.origin_frontier.len(), 1);
}
