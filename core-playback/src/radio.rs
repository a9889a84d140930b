//! Random track selection for radio mode.
//!
//! Picks are uniform over the whole device library and made with
//! replacement: the same track may come up twice in a row.

use core_library::Track;
use rand::Rng;

/// Chooses an index into a non-empty list.
pub trait TrackPicker: Send + Sync {
    /// Return an index in `0..len`. Only called with `len > 0`.
    fn pick_index(&self, len: usize) -> usize;
}

/// Uniform picker backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl TrackPicker for RandomPicker {
    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Pick one track, or `None` for an empty library.
pub fn pick_track(picker: &dyn TrackPicker, tracks: &[Track]) -> Option<Track> {
    if tracks.is_empty() {
        return None;
    }

    // Clamp so a misbehaving picker cannot index out of bounds.
    let index = picker.pick_index(tracks.len()).min(tracks.len() - 1);
    tracks.get(index).cloned()
}
