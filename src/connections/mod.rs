pub mod enumerator;
pub mod global_index;
pub mod packed;
pub mod record;
pub mod window_index;

use tracing::{trace, warn};

use crate::config::Config;
use crate::error::StorageError;
use crate::shared::{Duration, Time};

use self::enumerator::DepartureEnumerator;
use self::global_index::GlobalIdIndex;
use self::packed::PackedStore;
use self::record::{Connection, DatabaseId, GlobalId, InternalId, StopId, TripId};
use self::window_index::WindowedDepartureIndex;

/// Wire format version this build reads and writes (§6).
const WIRE_VERSION: u8 = 2;

/// Default window width and count, matching the defaults a query builder
/// falls back to when no config overrides them (§4.4, §7 config surface).
pub const DEFAULT_WINDOW_SECONDS: u32 = 60;
pub const DEFAULT_NUM_WINDOWS: u32 = 24 * 60;

/// A connection joined with the side-array fields the packed layout doesn't
/// carry (§4.4 `get`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub connection: Connection,
    pub global_id: GlobalId,
    pub trip: TripId,
}

/// The mutable, append/update-friendly store of connections (§2, §4.4).
///
/// Ties together the fixed-width packed store, the globalId hash index and
/// the windowed departure index behind a single façade. All mutation goes
/// through [`add_or_update`](Self::add_or_update); reads go through
/// [`get`](Self::get) or a [`DepartureEnumerator`] obtained from
/// [`enumerate_forward`](Self::enumerate_forward) /
/// [`enumerate_backward`](Self::enumerate_backward).
#[derive(Clone)]
pub struct ConnectionsDb {
    database: DatabaseId,
    data: PackedStore,
    global_ids: Vec<GlobalId>,
    trip_ids: Vec<u32>,
    global_index: GlobalIdIndex,
    departures: WindowedDepartureIndex,
    next_internal_id: u32,
    earliest_date: Time,
    latest_date: Time,
}

impl ConnectionsDb {
    pub fn new(database: DatabaseId) -> Self {
        Self::from_config(database, &Config::default())
    }

    /// Builds a store using the window sizing from `config` (§1's ambient
    /// config surface), rather than the crate's hardcoded defaults.
    pub fn from_config(database: DatabaseId, config: &Config) -> Self {
        Self::with_window_params(database, config.window_seconds, config.num_windows)
    }

    pub fn with_window_params(database: DatabaseId, window_seconds: u32, num_windows: u32) -> Self {
        Self {
            database,
            data: PackedStore::new(),
            global_ids: Vec::new(),
            trip_ids: Vec::new(),
            global_index: GlobalIdIndex::new(),
            departures: WindowedDepartureIndex::new(window_seconds, num_windows),
            next_internal_id: 0,
            earliest_date: Time::MAX,
            latest_date: Time::MIN,
        }
    }

    pub fn database(&self) -> DatabaseId {
        self.database
    }

    pub fn earliest_date(&self) -> Time {
        self.earliest_date
    }

    pub fn latest_date(&self) -> Time {
        self.latest_date
    }

    pub fn len(&self) -> usize {
        self.global_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global_ids.is_empty()
    }

    fn departure_of(&self, internal: InternalId) -> Time {
        self.data
            .get(internal)
            .map(|c| c.departure_time)
            .unwrap_or(Time::MAX)
    }

    /// Inserts a new connection, or updates an existing one under the same
    /// `global_id`, adjusting the departure index only when the departure
    /// second actually moved (§4.4).
    pub fn add_or_update(
        &mut self,
        global_id: &str,
        trip_internal: u32,
        connection: Connection,
    ) -> InternalId {
        let resolve = |i: InternalId| self.global_ids[i as usize].clone();
        let existing = self.global_index.lookup(global_id, resolve);

        let internal = match existing {
            Some(internal) => internal,
            None => {
                let internal = self.next_internal_id;
                self.next_internal_id += 1;
                self.global_ids.push(GlobalId::from(global_id));
                self.trip_ids.push(trip_internal);
                self.global_index.insert(global_id, internal);
                internal
            }
        };

        let old_departure = self.data.get(internal).map(|c| c.departure_time);
        self.data.put(internal, &connection);

        self.earliest_date = self.earliest_date.min(connection.departure_time);
        self.latest_date = self.latest_date.max(connection.departure_time);

        let data = &self.data;
        let get_departure = |i: InternalId| {
            data.get(i).map(|c| c.departure_time).unwrap_or(Time::MAX)
        };
        match old_departure {
            Some(old) if old != connection.departure_time => {
                self.departures.remove(internal, old);
                self.departures.add(internal, get_departure);
            }
            None => self.departures.add(internal, get_departure),
            Some(_) => {}
        }

        self.trip_ids[internal as usize] = trip_internal;

        trace!(global_id, internal, "connection added or updated");
        internal
    }

    /// Reads a connection by internal id, joined with its side-array fields.
    /// Returns `None` for an id past the end of the store, matching storage's
    /// content-neutral "bad record" handling rather than panicking.
    pub fn get(&self, id: InternalId) -> Option<ConnectionRecord> {
        let connection = self.data.get(id)?;
        let connection = Connection {
            departure_stop: StopId::new(self.database, connection.departure_stop.tile, connection.departure_stop.local),
            arrival_stop: StopId::new(self.database, connection.arrival_stop.tile, connection.arrival_stop.local),
            ..connection
        };
        Some(ConnectionRecord {
            connection,
            global_id: self.global_ids.get(id as usize)?.clone(),
            trip: TripId {
                database: self.database,
                internal: *self.trip_ids.get(id as usize)?,
            },
        })
    }

    pub fn resolve(&self, global_id: &str) -> Option<InternalId> {
        let resolve = |i: InternalId| self.global_ids[i as usize].clone();
        self.global_index.lookup(global_id, resolve)
    }

    /// A forward cursor anchored by a subsequent `move_to`.
    pub fn enumerate_forward(&self) -> DepartureEnumerator<'_> {
        DepartureEnumerator::forward(&self.departures)
    }

    /// A backward cursor anchored by a subsequent `move_to`.
    pub fn enumerate_backward(&self) -> DepartureEnumerator<'_> {
        DepartureEnumerator::backward(&self.departures)
    }

    pub fn departure_time(&self, id: InternalId) -> Time {
        self.departure_of(id)
    }

    /// A deep in-memory snapshot safe to hand to a reader while the live
    /// instance continues mutating (§5 shared-resource policy).
    pub fn clone_snapshot(&self) -> Self {
        self.clone()
    }

    /// Serializes the db to the versioned wire format of §6.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![WIRE_VERSION];
        write_blob(&mut out, self.data.as_bytes());
        write_blob(&mut out, &encode_global_ids(&self.global_ids));
        write_blob(&mut out, &encode_trip_ids(&self.trip_ids));
        write_blob(&mut out, &self.global_index.bucket_heads_bytes());
        write_blob(&mut out, &self.global_index.pool_bytes());
        out.extend(self.global_index.pool_len().to_le_bytes());
        write_blob(&mut out, &self.departures.window_meta_bytes());
        write_blob(&mut out, &self.departures.body_bytes());
        out.extend(self.departures.next_pointer().to_le_bytes());
        out.extend(self.departures.window_seconds().to_le_bytes());
        out.extend(self.departures.num_windows().to_le_bytes());
        out.extend(self.next_internal_id.to_le_bytes());
        out.extend((self.earliest_date.as_unix_seconds() as u64).to_le_bytes());
        out.extend((self.latest_date.as_unix_seconds() as u64).to_le_bytes());
        out
    }

    /// Loads a db previously written by [`to_bytes`](Self::to_bytes).
    /// `database` is assigned fresh, per §6 ("DatabaseId is not serialized").
    pub fn from_bytes(database: DatabaseId, bytes: &[u8]) -> Result<Self, StorageError> {
        let mut cur = Cursor::new(bytes);

        let version = cur.read_u8()?;
        if version != WIRE_VERSION {
            warn!(expected = WIRE_VERSION, found = version, "wire format version mismatch");
            return Err(StorageError::IncompatibleVersion {
                expected: WIRE_VERSION,
                found: version,
            });
        }

        let data = PackedStore::from_bytes(cur.read_blob()?.to_vec());
        let global_ids = decode_global_ids(cur.read_blob()?);
        let trip_ids = decode_trip_ids(cur.read_blob()?);
        let bucket_heads = cur.read_blob()?.to_vec();
        let pool_bytes = cur.read_blob()?.to_vec();
        let pool_len = cur.read_u32()?;
        let global_index = GlobalIdIndex::from_parts(&bucket_heads, &pool_bytes, pool_len);
        let window_meta = cur.read_blob()?.to_vec();
        let body_bytes = cur.read_blob()?.to_vec();
        let next_pointer = cur.read_u32()?;
        let window_seconds = cur.read_u32()?;
        let num_windows = cur.read_u32()?;
        let departures = WindowedDepartureIndex::from_parts(
            window_seconds,
            num_windows,
            &window_meta,
            &body_bytes,
            next_pointer,
        );
        let next_internal_id = cur.read_u32()?;
        let earliest_date = Time::from_unix_seconds(cur.read_u64()? as u32);
        let latest_date = Time::from_unix_seconds(cur.read_u64()? as u32);

        Ok(Self {
            database,
            data,
            global_ids,
            trip_ids,
            global_index,
            departures,
            next_internal_id,
            earliest_date,
            latest_date,
        })
    }
}

fn write_blob(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend((bytes.len() as u64).to_le_bytes());
    out.extend(bytes);
}

fn encode_global_ids(ids: &[GlobalId]) -> Vec<u8> {
    let mut out = Vec::new();
    for id in ids {
        let bytes = id.as_bytes();
        out.extend((bytes.len() as u32).to_le_bytes());
        out.extend(bytes);
    }
    out
}

fn decode_global_ids(bytes: &[u8]) -> Vec<GlobalId> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + 4 <= bytes.len() {
        let len = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;
        let s = std::str::from_utf8(&bytes[pos..pos + len]).unwrap_or("");
        out.push(GlobalId::from(s));
        pos += len;
    }
    out
}

fn encode_trip_ids(ids: &[u32]) -> Vec<u8> {
    ids.iter().flat_map(|i| i.to_le_bytes()).collect()
}

fn decode_trip_ids(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
        .collect()
}

/// A minimal byte-slice reader for the `sized_blob`-framed wire format,
/// tracking its own truncation errors instead of panicking on a short read.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], StorageError> {
        if self.pos + n > self.bytes.len() {
            return Err(StorageError::Truncated {
                expected: n as u64,
                found: (self.bytes.len() - self.pos) as u64,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, StorageError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, StorageError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn read_u64(&mut self) -> Result<u64, StorageError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn read_blob(&mut self) -> Result<&'a [u8], StorageError> {
        let len = self.read_u64()? as usize;
        self.take(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::record::{BoardingPolicy, Mode};

    fn sample(i: u32) -> Connection {
        Connection {
            departure_stop: StopId::new(0, 1, i),
            arrival_stop: StopId::new(0, 2, i),
            departure_time: Time::from_unix_seconds(1_000 + i * 60),
            travel_time: Duration::from_seconds(300),
            departure_delay: Duration::ZERO,
            arrival_delay: Duration::ZERO,
            mode: Mode::new(BoardingPolicy::Normal, false),
        }
    }

    #[test]
    fn add_then_get_roundtrips() {
        let mut db = ConnectionsDb::new(0);
        let id = db.add_or_update("trip:1:0", 0, sample(0));
        let got = db.get(id).unwrap();
        assert_eq!(got.connection.departure_time, sample(0).departure_time);
        assert_eq!(&*got.global_id, "trip:1:0");
    }

    #[test]
    fn update_same_global_id_reuses_internal_id() {
        let mut db = ConnectionsDb::new(0);
        let first = db.add_or_update("trip:1:0", 0, sample(0));
        let mut updated = sample(0);
        updated.departure_time = Time::from_unix_seconds(5_000);
        let second = db.add_or_update("trip:1:0", 0, updated);
        assert_eq!(first, second);
        assert_eq!(db.len(), 1);
        assert_eq!(db.get(first).unwrap().connection.departure_time.as_unix_seconds(), 5_000);
    }

    #[test]
    fn wire_format_roundtrip() {
        let mut db = ConnectionsDb::new(0);
        for i in 0..10 {
            db.add_or_update(&format!("trip:1:{i}"), 0, sample(i));
        }
        let bytes = db.to_bytes();
        let loaded = ConnectionsDb::from_bytes(7, &bytes).unwrap();
        assert_eq!(loaded.database(), 7);
        assert_eq!(loaded.len(), db.len());
        for i in 0..10 {
            let original = db.get(i).unwrap();
            let reloaded = loaded.get(i).unwrap();
            assert_eq!(original.connection.departure_time, reloaded.connection.departure_time);
            assert_eq!(original.global_id, reloaded.global_id);
        }
    }

    #[test]
    fn incompatible_version_is_rejected() {
        let db = ConnectionsDb::new(0);
        let mut bytes = db.to_bytes();
        bytes[0] = 99;
        let err = ConnectionsDb::from_bytes(0, &bytes).unwrap_err();
        assert!(matches!(err, StorageError::IncompatibleVersion { .. }));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let db = ConnectionsDb::new(0);
        let bytes = db.to_bytes();
        let err = ConnectionsDb::from_bytes(0, &bytes[..bytes.len() - 20]).unwrap_err();
        assert!(matches!(err, StorageError::Truncated { .. }));
    }
}
