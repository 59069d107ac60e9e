use crate::connections::record::InternalId;
use crate::shared::Time;

/// Per-window metadata: a pointer into the flat body store plus the window's
/// current occupied size. Capacity is always a power of two and is recovered
/// from the gap between `size` and the region's allocated length only
/// implicitly, by the doubling policy in [`WindowedDepartureIndex::add`].
#[derive(Debug, Clone, Copy, Default)]
struct WindowSlot {
    pointer: u32,
    size: u32,
    /// Allocated capacity of the region at `pointer` (always a power of two,
    /// or zero before the window's first insert).
    capacity: u32,
}

/// The windowed departure index (§3, §4.3): `numberOfWindows` fixed-length
/// buckets on the modular time axis, each holding the internal ids whose
/// departure time falls in that bucket, sorted ascending by departure time.
///
/// The global body store only ever grows: when a window outgrows its current
/// capacity, its contents are copied to a fresh, larger region at the tail and
/// the old region is abandoned (never reclaimed), trading memory for a simple,
/// allocation-free steady state once a timetable's window sizes stabilize.
#[derive(Clone)]
pub struct WindowedDepartureIndex {
    window_seconds: u32,
    num_windows: u32,
    windows: Vec<WindowSlot>,
    body: Vec<InternalId>,
}

impl WindowedDepartureIndex {
    pub fn new(window_seconds: u32, num_windows: u32) -> Self {
        Self {
            window_seconds,
            num_windows,
            windows: vec![WindowSlot::default(); num_windows as usize],
            body: Vec::new(),
        }
    }

    pub fn window_seconds(&self) -> u32 {
        self.window_seconds
    }

    pub fn num_windows(&self) -> u32 {
        self.num_windows
    }

    /// `window(τ) = ⌊τ/W⌋ mod N`.
    pub fn window_of(&self, t: Time) -> u32 {
        (t.as_unix_seconds() / self.window_seconds) % self.num_windows
    }

    pub fn window_slice(&self, w: u32) -> &[InternalId] {
        let slot = self.windows[w as usize];
        &self.body[slot.pointer as usize..(slot.pointer + slot.size) as usize]
    }

    /// Inserts `id`, departing at `get_departure(id)`, into its window's
    /// sorted body, growing the window's region if it's full.
    pub fn add(&mut self, id: InternalId, get_departure: impl Fn(InternalId) -> Time) {
        let w = self.window_of(get_departure(id));
        let slot = self.windows[w as usize];

        if slot.capacity == 0 {
            // first insert into this window: allocate a 1-slot region.
            let pointer = self.body.len() as u32;
            self.body.push(id);
            self.windows[w as usize] = WindowSlot {
                pointer,
                size: 1,
                capacity: 1,
            };
            return;
        }

        if slot.size == slot.capacity {
            // region is full: copy to a fresh, doubled region at the tail.
            let new_capacity = slot.capacity * 2;
            let new_pointer = self.body.len() as u32;
            let old_region: Vec<InternalId> =
                self.body[slot.pointer as usize..(slot.pointer + slot.size) as usize].to_vec();
            self.body.extend(old_region);
            self.body.push(id);
            self.body
                .resize(self.body.len() + (new_capacity as usize - slot.size as usize - 1), 0);
            self.windows[w as usize] = WindowSlot {
                pointer: new_pointer,
                size: slot.size + 1,
                capacity: new_capacity,
            };
        } else {
            let insert_at = (slot.pointer + slot.size) as usize;
            self.body[insert_at] = id;
            self.windows[w as usize].size += 1;
        }

        self.sort_window(w, &get_departure);
    }

    /// Removes `id` (whose departure time is `old_time`, used to locate its
    /// window) by a linear scan and left-shift within the window body.
    pub fn remove(&mut self, id: InternalId, old_time: Time) {
        let w = self.window_of(old_time);
        let slot = self.windows[w as usize];
        let start = slot.pointer as usize;
        let end = (slot.pointer + slot.size) as usize;
        if let Some(pos) = self.body[start..end].iter().position(|&x| x == id) {
            self.body.copy_within(start + pos + 1..end, start + pos);
            self.windows[w as usize].size -= 1;
        }
    }

    /// In-place quicksort of window `w`'s body, keyed by departure time.
    ///
    /// This sort is **not stable**: among connections departing at the same
    /// second, the resulting relative order is unspecified. Callers (and
    /// tests) must not depend on intra-window order among equal departures.
    pub fn sort_window(&mut self, w: u32, get_departure: &impl Fn(InternalId) -> Time) {
        let slot = self.windows[w as usize];
        let start = slot.pointer as usize;
        let end = (slot.pointer + slot.size) as usize;
        quicksort_by_key(&mut self.body[start..end], get_departure);
    }
}

impl WindowedDepartureIndex {
    /// `departureWindowMeta` (§6): `(pointer, size)` pairs, little-endian,
    /// one per window. `capacity` is not persisted — it is re-derived on load
    /// as the next power of two at or above `size`, since only relative
    /// growth behavior (not exact old capacities) matters after a reload.
    pub fn window_meta_bytes(&self) -> Vec<u8> {
        self.windows
            .iter()
            .flat_map(|w| {
                let mut out = w.pointer.to_le_bytes().to_vec();
                out.extend(w.size.to_le_bytes());
                out
            })
            .collect()
    }

    /// `departurePointers` (§6): the flat body store, little-endian u32 per slot.
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body.iter().flat_map(|id| id.to_le_bytes()).collect()
    }

    pub fn next_pointer(&self) -> u32 {
        self.body.len() as u32
    }

    /// Rebuilds an index from its wire-format parts (§6).
    pub fn from_parts(
        window_seconds: u32,
        num_windows: u32,
        meta_bytes: &[u8],
        body_bytes: &[u8],
        next_pointer: u32,
    ) -> Self {
        let windows: Vec<WindowSlot> = meta_bytes
            .chunks_exact(8)
            .map(|c| {
                let pointer = u32::from_le_bytes(c[0..4].try_into().unwrap());
                let size = u32::from_le_bytes(c[4..8].try_into().unwrap());
                WindowSlot {
                    pointer,
                    size,
                    capacity: size.next_power_of_two().max(1),
                }
            })
            .collect();
        let mut body: Vec<InternalId> = body_bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        body.resize(next_pointer as usize, 0);
        Self {
            window_seconds,
            num_windows,
            windows,
            body,
        }
    }
}

fn quicksort_by_key(slice: &mut [InternalId], key: &impl Fn(InternalId) -> Time) {
    if slice.len() <= 1 {
        return;
    }
    let pivot = key(slice[slice.len() / 2]);
    let (mut lo, mut hi) = (0usize, slice.len() - 1);
    loop {
        while key(slice[lo]) < pivot {
            lo += 1;
        }
        while key(slice[hi]) > pivot {
            hi -= 1;
        }
        if lo >= hi {
            break;
        }
        slice.swap(lo, hi);
        lo += 1;
        if hi == 0 {
            break;
        }
        hi -= 1;
    }
    let (left, right) = slice.split_at_mut(lo.max(1));
    quicksort_by_key(left, key);
    quicksort_by_key(right, key);
}
