use crate::connections::record::InternalId;
use crate::connections::window_index::WindowedDepartureIndex;
use crate::shared::Time;

/// A resumable cursor over a [`WindowedDepartureIndex`], walking departures
/// forward or backward in time one modular window at a time (§4.5).
///
/// Each window keeps its own `already_used` cursor so that, when the
/// enumerator revisits the same window residue on a later cycle, it resumes
/// from roughly where it left off instead of rescanning the whole window.
/// The first position reached after [`move_to`](Self::move_to) is always
/// located by binary search (`index_in_window == MAX`); every later
/// transition across a window boundary restores the resume cursor instead.
pub struct DepartureEnumerator<'a> {
    index: &'a WindowedDepartureIndex,
    direction: Direction,
    current_time: Time,
    current_window: u32,
    index_in_window: u32,
    already_used: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Sentinel meaning "locate by binary search on first use of this window".
const NEEDS_SEARCH: u32 = u32::MAX;

impl<'a> DepartureEnumerator<'a> {
    fn new(index: &'a WindowedDepartureIndex, direction: Direction) -> Self {
        let num_windows = index.num_windows() as usize;
        Self {
            index,
            direction,
            current_time: Time::MIN,
            current_window: 0,
            index_in_window: NEEDS_SEARCH,
            already_used: vec![0; num_windows],
        }
    }

    pub fn forward(index: &'a WindowedDepartureIndex) -> Self {
        Self::new(index, Direction::Forward)
    }

    pub fn backward(index: &'a WindowedDepartureIndex) -> Self {
        Self::new(index, Direction::Backward)
    }

    /// Repositions the cursor at `t`. The next call to [`next`](Self::next)
    /// or [`previous`](Self::previous) locates its starting position in the
    /// target window by binary search.
    pub fn move_to(&mut self, t: Time) {
        self.current_time = t;
        self.current_window = self.index.window_of(t);
        self.index_in_window = NEEDS_SEARCH;
    }

    /// Returns the next connection departing at or after the cursor's
    /// current time, or `None` if the enumerator has wrapped a full cycle
    /// without finding one (an empty timetable).
    pub fn next(&mut self, get_departure: impl Fn(InternalId) -> Time) -> Option<InternalId> {
        debug_assert_eq!(self.direction, Direction::Forward);
        let num_windows = self.index.num_windows();
        let window_seconds = self.index.window_seconds() as u64;

        for _ in 0..=num_windows {
            let slice = self.index.window_slice(self.current_window);

            if self.index_in_window == NEEDS_SEARCH {
                self.index_in_window =
                    lower_bound(slice, self.current_time, &get_departure) as u32;
            }

            while (self.index_in_window as usize) < slice.len() {
                let id = slice[self.index_in_window as usize];
                let dep = get_departure(id);

                if dep < self.current_time {
                    // stale resume position from an earlier cycle; skip.
                    self.index_in_window += 1;
                    continue;
                }

                let elapsed = dep.as_unix_seconds().wrapping_sub(self.current_time.as_unix_seconds()) as u64;
                if elapsed > window_seconds {
                    // this residue's slice reaches past one window width
                    // ahead of us: back off and treat it as belonging to a
                    // later cycle through this window.
                    if self.index_in_window > 0 {
                        self.index_in_window -= 1;
                    }
                    break;
                }

                self.index_in_window += 1;
                self.already_used[self.current_window as usize] = self.index_in_window;
                return Some(id);
            }

            self.already_used[self.current_window as usize] = self.index_in_window.min(slice.len() as u32);
            self.current_window = (self.current_window + 1) % num_windows;
            self.current_time = Time::from_unix_seconds(
                (self.current_window as u64 * window_seconds) as u32,
            );
            self.index_in_window = self.already_used[self.current_window as usize];
        }

        None
    }

    /// The symmetric dual of [`next`](Self::next): returns the previous
    /// connection departing at or before the cursor's current time.
    pub fn previous(&mut self, get_departure: impl Fn(InternalId) -> Time) -> Option<InternalId> {
        debug_assert_eq!(self.direction, Direction::Backward);
        let num_windows = self.index.num_windows();
        let window_seconds = self.index.window_seconds() as u64;

        for _ in 0..=num_windows {
            let slice = self.index.window_slice(self.current_window);

            if self.index_in_window == NEEDS_SEARCH {
                self.index_in_window = upper_bound(slice, self.current_time, &get_departure) as u32;
            }

            while self.index_in_window > 0 && slice.len() > 0 {
                let pos = (self.index_in_window - 1) as usize;
                if pos >= slice.len() {
                    self.index_in_window = slice.len() as u32;
                    continue;
                }
                let id = slice[pos];
                let dep = get_departure(id);

                if dep > self.current_time {
                    self.index_in_window -= 1;
                    continue;
                }

                let elapsed = self.current_time.as_unix_seconds().wrapping_sub(dep.as_unix_seconds()) as u64;
                if elapsed > window_seconds {
                    self.index_in_window += 1;
                    break;
                }

                self.index_in_window -= 1;
                self.already_used[self.current_window as usize] = self.index_in_window;
                return Some(id);
            }

            self.already_used[self.current_window as usize] = self.index_in_window;
            self.current_window = if self.current_window == 0 {
                num_windows - 1
            } else {
                self.current_window - 1
            };
            if self.current_time.as_unix_seconds() < window_seconds as u32 {
                // guard against underflow at the very start of the epoch.
                self.current_time = Time::MIN;
            } else {
                self.current_time = self
                    .current_time
                    .saturating_sub(crate::shared::Duration::from_seconds(window_seconds as u32));
            }
            self.index_in_window = self.already_used[self.current_window as usize];
        }

        None
    }
}

fn lower_bound(slice: &[InternalId], t: Time, key: &impl Fn(InternalId) -> Time) -> usize {
    let mut lo = 0usize;
    let mut hi = slice.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if key(slice[mid]) < t {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

fn upper_bound(slice: &[InternalId], t: Time, key: &impl Fn(InternalId) -> Time) -> usize {
    let mut lo = 0usize;
    let mut hi = slice.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if key(slice[mid]) <= t {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn build(deps: &[u32]) -> (WindowedDepartureIndex, HashMap<InternalId, Time>) {
        let mut idx = WindowedDepartureIndex::new(60, 24 * 60);
        let mut times = HashMap::new();
        for (i, &d) in deps.iter().enumerate() {
            times.insert(i as u32, Time::from_unix_seconds(d));
            idx.add(i as u32, |id| times[&id]);
        }
        (idx, times)
    }

    #[test]
    fn forward_enumerates_in_order() {
        let (idx, times) = build(&[100, 200, 300, 400]);
        let mut e = DepartureEnumerator::forward(&idx);
        e.move_to(Time::from_unix_seconds(150));
        let get = |id: InternalId| times[&id];
        let first = e.next(get).map(|id| times[&id].as_unix_seconds());
        assert_eq!(first, Some(200));
    }

    #[test]
    fn forward_skips_earlier_departures() {
        let (idx, times) = build(&[60, 120, 180]);
        let mut e = DepartureEnumerator::forward(&idx);
        e.move_to(Time::from_unix_seconds(0));
        let get = |id: InternalId| times[&id];
        assert_eq!(e.next(get).map(|id| times[&id].as_unix_seconds()), Some(60));
        assert_eq!(e.next(get).map(|id| times[&id].as_unix_seconds()), Some(120));
        assert_eq!(e.next(get).map(|id| times[&id].as_unix_seconds()), Some(180));
    }

    #[test]
    fn backward_enumerates_in_reverse_order() {
        let (idx, times) = build(&[100, 200, 300]);
        let mut e = DepartureEnumerator::backward(&idx);
        e.move_to(Time::from_unix_seconds(250));
        let get = |id: InternalId| times[&id];
        assert_eq!(e.previous(get).map(|id| times[&id].as_unix_seconds()), Some(200));
        assert_eq!(e.previous(get).map(|id| times[&id].as_unix_seconds()), Some(100));
    }

    #[test]
    fn empty_timetable_yields_none() {
        let idx = WindowedDepartureIndex::new(60, 24 * 60);
        let mut e = DepartureEnumerator::forward(&idx);
        e.move_to(Time::from_unix_seconds(0));
        assert_eq!(e.next(|_: InternalId| Time::MIN), None);
    }
}
