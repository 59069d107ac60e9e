//! A multi-criteria connection-scan journey planner for public-transport
//! networks.
//!
//! [`connections::ConnectionsDb`] is a mutable, append/update-friendly store
//! of connections with fast in-order departure enumeration; [`pcs::Pcs`] is
//! the backward-in-time Profiled Connection Scan solver that reads it,
//! producing Pareto-optimal journeys between an origin and a destination.
//! [`query::QueryBuilder`] ties the two together behind a validated,
//! fluent entry point.

pub mod config;
pub mod connections;
pub mod error;
pub mod frontier;
pub mod journey;
pub mod metric;
pub mod pcs;
pub mod query;
pub mod shared;
pub mod transfer;

pub use config::Config;
pub use connections::ConnectionsDb;
pub use error::{ConfigError, StorageError};
pub use metric::{Metric, StandardMetric};
pub use pcs::{Pcs, ScanSettings};
pub use query::QueryBuilder;
