use crate::config::Config;
use crate::connections::record::{Connection, StopId};
use crate::connections::ConnectionsDb;
use crate::error::ConfigError;
use crate::metric::StandardMetric;
use crate::pcs::{MetricGuesser, Pcs, ScanOutcome, ScanSettings};
use crate::shared::Time;
use crate::transfer::TransferGenerator;

/// Default walking speed (§1's ambient config surface) used when a query
/// doesn't override it: a brisk 1.4 m/s.
pub const DEFAULT_WALKING_SPEED_MPS: f32 = 1.4;

/// A fluent builder assembling [`ScanSettings`] and validating them before a
/// scan runs, so a caller never pays for a doomed scan (§7).
pub struct QueryBuilder<'a, T: TransferGenerator> {
    db: &'a ConnectionsDb,
    transfer_generator: &'a T,
    walking_speed_mps: f32,
    max_transfers: u32,
    origin: Option<StopId>,
    destination: Option<StopId>,
    window_start: Option<Time>,
    window_end: Option<Time>,
    guesser: Option<&'a dyn MetricGuesser<StandardMetric>>,
    connection_filter: Option<&'a dyn Fn(&Connection) -> bool>,
    deadline: Option<&'a dyn Fn() -> bool>,
    stop_exists: Option<&'a dyn Fn(StopId) -> bool>,
}

impl<'a, T: TransferGenerator> QueryBuilder<'a, T> {
    pub fn new(db: &'a ConnectionsDb, transfer_generator: &'a T) -> Self {
        Self::with_config(db, transfer_generator, &Config::default())
    }

    /// Builds a query seeded with `config`'s profile defaults (§1's ambient
    /// config surface) instead of the crate's hardcoded ones.
    pub fn with_config(db: &'a ConnectionsDb, transfer_generator: &'a T, config: &Config) -> Self {
        Self {
            db,
            transfer_generator,
            walking_speed_mps: config.walking_speed_mps,
            max_transfers: config.max_transfers,
            origin: None,
            destination: None,
            window_start: None,
            window_end: None,
            guesser: None,
            connection_filter: None,
            deadline: None,
            stop_exists: None,
        }
    }

    /// Overrides the transfer/profile parameters (walking speed and the
    /// maximum number of transfers per journey).
    pub fn select_profile(mut self, walking_speed_mps: f32, max_transfers: u32) -> Self {
        self.walking_speed_mps = walking_speed_mps;
        self.max_transfers = max_transfers;
        self
    }

    pub fn select_stops(mut self, origin: StopId, destination: StopId) -> Self {
        self.origin = Some(origin);
        self.destination = Some(destination);
        self
    }

    pub fn select_time_frame(mut self, window_start: Time, window_end: Time) -> Self {
        self.window_start = Some(window_start);
        self.window_end = Some(window_end);
        self
    }

    pub fn with_guesser(mut self, guesser: &'a dyn MetricGuesser<StandardMetric>) -> Self {
        self.guesser = Some(guesser);
        self
    }

    pub fn with_connection_filter(mut self, filter: &'a dyn Fn(&Connection) -> bool) -> Self {
        self.connection_filter = Some(filter);
        self
    }

    pub fn with_deadline(mut self, deadline: &'a dyn Fn() -> bool) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Lets a caller with its own stop directory reject unknown ids up
    /// front; without this, stop existence is not checked here (§1's stops
    /// database is an external collaborator).
    pub fn with_stop_validator(mut self, validator: &'a dyn Fn(StopId) -> bool) -> Self {
        self.stop_exists = Some(validator);
        self
    }

    fn build_settings(&self) -> Result<ScanSettings<'a, T>, ConfigError> {
        let origin = self.origin.ok_or(ConfigError::UnknownStop)?;
        let destination = self.destination.ok_or(ConfigError::UnknownStop)?;
        let window_start = self.window_start.unwrap_or(crate::shared::time::MIN);
        let window_end = self.window_end.unwrap_or(self.db.latest_date());

        if origin == destination {
            return Err(ConfigError::OriginEqualsDestination);
        }
        if window_end < window_start {
            return Err(ConfigError::InvalidTimeWindow {
                window_start,
                window_end,
            });
        }
        if let Some(exists) = self.stop_exists {
            if !exists(origin) || !exists(destination) {
                return Err(ConfigError::UnknownStop);
            }
        }

        Ok(ScanSettings {
            origin,
            destination,
            window_start,
            window_end,
            transfer_generator: self.transfer_generator,
            max_transfers: self.max_transfers,
            walking_speed_mps: self.walking_speed_mps,
            connection_filter: self.connection_filter,
            guesser: self.guesser,
            deadline: self.deadline,
        })
    }

    /// Runs a full PCS scan, returning every Pareto-optimal journey.
    pub fn calculate_all_journeys(&self) -> Result<ScanOutcome, ConfigError> {
        let settings = self.build_settings()?;
        Ok(Pcs::new(self.db, settings).run())
    }

    /// Runs the EAS degenerate case: stops as soon as the origin frontier
    /// gains its first non-dominated entry (§4.9).
    pub fn calculate_earliest_arrival(&self) -> Result<ScanOutcome, ConfigError> {
        let settings = self.build_settings()?;
        Ok(Pcs::new(self.db, settings).run_until_first_origin_entry())
    }

    /// Runs the LAS degenerate case, symmetric to
    /// [`calculate_earliest_arrival`](Self::calculate_earliest_arrival):
    /// the backward scan naturally finds the latest departure first, so this
    /// shares the same early-exit scan.
    pub fn calculate_latest_departure(&self) -> Result<ScanOutcome, ConfigError> {
        let settings = self.build_settings()?;
        Ok(Pcs::new(self.db, settings).run_until_first_origin_entry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::record::{BoardingPolicy, Mode};
    use crate::shared::Duration;
    use crate::transfer::CompositeTransferGenerator;

    fn stop(i: u32) -> StopId {
        StopId::new(0, 0, i)
    }

    #[test]
    fn rejects_equal_origin_and_destination() {
        let db = ConnectionsDb::new(0);
        let gen = CompositeTransferGenerator::new();
        let err = QueryBuilder::new(&db, &gen)
            .select_stops(stop(0), stop(0))
            .calculate_all_journeys()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OriginEqualsDestination));
    }

    #[test]
    fn rejects_inverted_time_window() {
        let db = ConnectionsDb::new(0);
        let gen = CompositeTransferGenerator::new();
        let err = QueryBuilder::new(&db, &gen)
            .select_stops(stop(0), stop(1))
            .select_time_frame(Time::from_unix_seconds(200), Time::from_unix_seconds(100))
            .calculate_all_journeys()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeWindow { .. }));
    }

    #[test]
    fn valid_settings_run_a_scan() {
        let mut db = ConnectionsDb::new(0);
        db.add_or_update(
            "c1",
            1,
            Connection {
                departure_stop: stop(0),
                arrival_stop: stop(1),
                departure_time: Time::from_unix_seconds(1_000),
                travel_time: Duration::from_seconds(600),
                departure_delay: Duration::ZERO,
                arrival_delay: Duration::ZERO,
                mode: Mode::new(BoardingPolicy::Normal, false),
            },
        );
        let gen = CompositeTransferGenerator::new();
        let outcome = QueryBuilder::new(&db, &gen)
            .select_stops(stop(0), stop(1))
            .select_time_frame(Time::from_unix_seconds(0), Time::from_unix_seconds(2_000))
            .calculate_all_journeys()
            .unwrap();
        assert_eq!(outcome.origin_frontier.len(), 1);
    }
}
