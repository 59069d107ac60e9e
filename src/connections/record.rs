use std::sync::Arc;

use crate::shared::{Duration, Time};

/// Tags which federated [`ConnectionsDb`](crate::connections::ConnectionsDb) a
/// stop/trip/connection id belongs to.
///
/// Never persisted in the wire format (§6): it is assigned per-load, so that
/// loading the same file twice into two databases yields distinct, non-colliding
/// ids.
pub type DatabaseId = u32;

/// Index of a record inside a single database. Stable for the lifetime of the
/// session; may be reused across sessions (the wire format renumbers on load).
pub type InternalId = u32;

/// A connection, identified within a specific database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    pub database: DatabaseId,
    pub internal: InternalId,
}

/// A trip, identified within a specific database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TripId {
    pub database: DatabaseId,
    pub internal: InternalId,
}

/// A stop, identified within a specific database.
///
/// The tile/local split lets an external stops database cluster stops
/// spatially (e.g. all stops within a geohash cell share a tile); this crate
/// treats the split as opaque and never interprets `tile` or `local` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StopId {
    pub database: DatabaseId,
    pub tile: u32,
    pub local: u32,
}

impl StopId {
    pub const fn new(database: DatabaseId, tile: u32, local: u32) -> Self {
        Self {
            database,
            tile,
            local,
        }
    }
}

/// An opaque upstream identifier (e.g. a GTFS `trip_id` suffixed with a stop
/// sequence), used only to resolve [`InternalId`]s through the global-id index.
pub type GlobalId = Arc<str>;

/// Low two bits of [`Mode`]: who may board/alight at the departure/arrival end
/// of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardingPolicy {
    Normal,
    BoardOnly,
    AlightOnly,
    Neither,
}

impl BoardingPolicy {
    const fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0b00 => Self::Normal,
            0b01 => Self::BoardOnly,
            0b10 => Self::AlightOnly,
            _ => Self::Neither,
        }
    }

    const fn to_bits(self) -> u16 {
        match self {
            Self::Normal => 0b00,
            Self::BoardOnly => 0b01,
            Self::AlightOnly => 0b10,
            Self::Neither => 0b11,
        }
    }
}

/// Packed boarding/cancellation flags for a connection.
///
/// Storage is content-neutral: a cancelled or unboardable connection is still
/// stored and enumerated. Enforcement lives at the PCS connection filter
/// (§4.9, §9), not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mode(u16);

const CANCELLED_BIT: u16 = 0b100;

impl Mode {
    pub const NORMAL: Self = Self(0);

    pub const fn from_raw(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn new(policy: BoardingPolicy, cancelled: bool) -> Self {
        let mut bits = policy.to_bits();
        if cancelled {
            bits |= CANCELLED_BIT;
        }
        Self(bits)
    }

    pub const fn boarding_policy(self) -> BoardingPolicy {
        BoardingPolicy::from_bits(self.0)
    }

    pub const fn is_cancelled(self) -> bool {
        self.0 & CANCELLED_BIT != 0
    }

    pub const fn can_board(self) -> bool {
        matches!(
            self.boarding_policy(),
            BoardingPolicy::Normal | BoardingPolicy::BoardOnly
        )
    }

    pub const fn can_alight(self) -> bool {
        matches!(
            self.boarding_policy(),
            BoardingPolicy::Normal | BoardingPolicy::AlightOnly
        )
    }
}

/// A single scheduled vehicle movement: departs `departure_stop` at
/// `departure_time`, arrives at `arrival_stop` `travel_time` later.
///
/// This is the logical, unpacked shape exchanged with callers; [`PackedStore`]
/// (crate::connections::packed) holds the 28-byte wire-equivalent layout, and
/// `global_id`/`trip` live in the parallel arrays owned by
/// [`ConnectionsDb`](crate::connections::ConnectionsDb) rather than on this
/// struct, matching §3's "per internalId" side arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub departure_stop: StopId,
    pub arrival_stop: StopId,
    pub departure_time: Time,
    pub travel_time: Duration,
    pub departure_delay: Duration,
    pub arrival_delay: Duration,
    pub mode: Mode,
}

impl Connection {
    pub fn arrival_time(&self) -> Time {
        self.departure_time + self.travel_time
    }
}
