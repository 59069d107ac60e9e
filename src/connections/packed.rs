use crate::connections::record::{Connection, Mode, StopId};
use crate::shared::{Duration, Time};

/// Byte width of one packed [`Connection`] record (§3): two 8-byte stop refs,
/// a 4-byte departure time, and three 2-byte fields plus the mode word.
pub const RECORD_LEN: usize = 28;

/// Marks a slot that was allocated by growth but never written.
const UNWRITTEN_TILE: u32 = 0xFFFF_FFFF;

/// A fixed-width record store over a growable byte buffer.
///
/// `put`/`get` are the only two operations; the store does not interpret the
/// bytes beyond locating the sentinel used to detect an unwritten slot. Growth
/// is double-and-copy, matching the flat `Box<[T]>`-style arrays the rest of
/// this crate's teacher lineage favors for its data tables, except here the
/// element is raw bytes rather than a typed struct, because the layout is a
/// hand-specified wire format (§6), not something `derive`d.
#[derive(Debug, Default, Clone)]
pub struct PackedStore {
    bytes: Vec<u8>,
}

impl PackedStore {
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub fn capacity_records(&self) -> usize {
        self.bytes.len() / RECORD_LEN
    }

    /// Writes `record` at slot `i`, growing the backing buffer if needed.
    pub fn put(&mut self, i: u32, record: &Connection) {
        self.ensure_capacity(i);
        let offset = i as usize * RECORD_LEN;
        let slot = &mut self.bytes[offset..offset + RECORD_LEN];
        encode(record, slot);
    }

    /// Reads slot `i`. Returns `None` for a slot past the end of the store or
    /// one that was allocated by growth but never written (the all-`0xFF`
    /// sentinel) — storage never panics on a missing record.
    pub fn get(&self, i: u32) -> Option<Connection> {
        let offset = i as usize * RECORD_LEN;
        let slot = self.bytes.get(offset..offset + RECORD_LEN)?;
        decode(slot)
    }

    fn ensure_capacity(&mut self, i: u32) {
        let needed = (i as usize + 1) * RECORD_LEN;
        if needed <= self.bytes.len() {
            return;
        }
        let mut new_len = self.bytes.len().max(RECORD_LEN * 64);
        while new_len < needed {
            new_len *= 2;
        }
        self.bytes.resize(new_len, 0xFF);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

fn encode(record: &Connection, out: &mut [u8]) {
    out[0..4].copy_from_slice(&record.departure_stop.tile.to_le_bytes());
    out[4..8].copy_from_slice(&record.departure_stop.local.to_le_bytes());
    out[8..12].copy_from_slice(&record.arrival_stop.tile.to_le_bytes());
    out[12..16].copy_from_slice(&record.arrival_stop.local.to_le_bytes());
    out[16..20].copy_from_slice(&record.departure_time.as_unix_seconds().to_le_bytes());
    out[20..22].copy_from_slice(&(record.travel_time.as_seconds() as u16).to_le_bytes());
    out[22..24].copy_from_slice(&(record.departure_delay.as_seconds() as u16).to_le_bytes());
    out[24..26].copy_from_slice(&(record.arrival_delay.as_seconds() as u16).to_le_bytes());
    out[26..28].copy_from_slice(&record.mode.raw().to_le_bytes());
}

fn decode(slot: &[u8]) -> Option<Connection> {
    let departure_tile = u32::from_le_bytes(slot[0..4].try_into().unwrap());
    if departure_tile == UNWRITTEN_TILE {
        return None;
    }
    let departure_local = u32::from_le_bytes(slot[4..8].try_into().unwrap());
    let arrival_tile = u32::from_le_bytes(slot[8..12].try_into().unwrap());
    let arrival_local = u32::from_le_bytes(slot[12..16].try_into().unwrap());
    let departure_time = u32::from_le_bytes(slot[16..20].try_into().unwrap());
    let travel_time = u16::from_le_bytes(slot[20..22].try_into().unwrap());
    let departure_delay = u16::from_le_bytes(slot[22..24].try_into().unwrap());
    let arrival_delay = u16::from_le_bytes(slot[24..26].try_into().unwrap());
    let mode = u16::from_le_bytes(slot[26..28].try_into().unwrap());

    // database id is not part of the packed layout; callers that need a
    // fully-qualified StopId attach their own database tag.
    Some(Connection {
        departure_stop: StopId::new(0, departure_tile, departure_local),
        arrival_stop: StopId::new(0, arrival_tile, arrival_local),
        departure_time: Time::from_unix_seconds(departure_time),
        travel_time: Duration::from_seconds(travel_time as u32),
        departure_delay: Duration::from_seconds(departure_delay as u32),
        arrival_delay: Duration::from_seconds(arrival_delay as u32),
        mode: Mode::from_raw(mode),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connections::record::BoardingPolicy;

    fn sample() -> Connection {
        Connection {
            departure_stop: StopId::new(0, 1, 2),
            arrival_stop: StopId::new(0, 3, 4),
            departure_time: Time::from_unix_seconds(1_543_915_800),
            travel_time: Duration::from_seconds(600),
            departure_delay: Duration::from_seconds(0),
            arrival_delay: Duration::from_seconds(30),
            mode: Mode::new(BoardingPolicy::Normal, false),
        }
    }

    #[test]
    fn roundtrip() {
        let mut store = PackedStore::new();
        store.put(0, &sample());
        let got = store.get(0).unwrap();
        assert_eq!(got, sample());
    }

    #[test]
    fn unwritten_slot_is_none() {
        let mut store = PackedStore::new();
        store.put(5, &sample());
        assert!(store.get(0).is_none());
        assert!(store.get(4).is_none());
        assert!(store.get(5).is_some());
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut store = PackedStore::new();
        for i in 0..200u32 {
            let mut c = sample();
            c.departure_time = Time::from_unix_seconds(i);
            store.put(i, &c);
        }
        for i in 0..200u32 {
            assert_eq!(store.get(i).unwrap().departure_time.as_unix_seconds(), i);
        }
    }

    #[test]
    fn out_of_bounds_read_is_none() {
        let store = PackedStore::new();
        assert!(store.get(0).is_none());
    }
}
