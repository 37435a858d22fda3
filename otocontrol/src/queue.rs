//! In-memory playback queue for the player.
//!
//! The queue is the simplest possible structure:
//!   - a `Vec<TrackRef>` in play order,
//!   - plus an optional `cursor`.
//!
//! It is rebuilt wholesale when playback starts from a playlist view,
//! grown by next-in-line insertion, and never shrunk otherwise. All
//! operations are pure structural mutations on in-memory data; the queue
//! never starts playback (transport control is handled by
//! [`PlayerControl`](crate::PlayerControl)).

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::TrackRef;

/// Ordered playback queue with a current-position cursor.
///
/// Invariant: `cursor` is `Some(i)` with `i < items.len()` whenever the
/// queue is active, and `None` when it is empty/inactive. Duplicates are
/// permitted; insertion order is meaningful.
#[derive(Clone, Debug, Default)]
pub struct PlayQueue {
    items: Vec<TrackRef>,
    cursor: Option<usize>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[TrackRef] {
        &self.items
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Track the cursor currently points at.
    pub fn current(&self) -> Option<&TrackRef> {
        self.cursor.and_then(|idx| self.items.get(idx))
    }

    pub fn get(&self, index: usize) -> Option<&TrackRef> {
        self.items.get(index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
    }

    /// Replace the whole queue. The cursor is clamped to `None` when it
    /// falls outside the new items.
    pub fn replace(&mut self, items: Vec<TrackRef>, cursor: Option<usize>) {
        self.items = items;
        self.cursor = cursor.filter(|&idx| idx < self.items.len());
    }

    /// Insert `track` immediately after the cursor.
    ///
    /// The cursor itself never moves; playback of the current track is
    /// unaffected. With no cursor set the track lands at the front.
    pub fn insert_next(&mut self, track: TrackRef) {
        let insert_at = match self.cursor {
            Some(idx) => (idx + 1).min(self.items.len()),
            None => 0,
        };
        self.items.insert(insert_at, track);
    }

    /// Move the cursor one entry forward and return the new index, or
    /// `None` when already on the last entry (or the queue is empty).
    pub fn step_forward(&mut self) -> Option<usize> {
        let idx = self.cursor?;
        let next = idx + 1;
        if next >= self.items.len() {
            return None;
        }
        self.cursor = Some(next);
        Some(next)
    }

    /// Move the cursor one entry back and return the new index, or `None`
    /// when already on the first entry (or the queue is empty).
    pub fn step_back(&mut self) -> Option<usize> {
        let idx = self.cursor?;
        if idx == 0 {
            return None;
        }
        let prev = idx - 1;
        self.cursor = Some(prev);
        Some(prev)
    }

    /// Serializable view of the queue for the UI surface.
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            items: self.items.clone(),
            cursor: self.cursor,
        }
    }
}

/// Logical snapshot of the queue, independent of how it is stored.
#[derive(Clone, Debug, Serialize)]
pub struct QueueSnapshot {
    /// All tracks currently queued, in play order.
    pub items: Vec<TrackRef>,
    /// Index (0-based) of the current track in `items`, or `None` if no
    /// track is currently selected.
    pub cursor: Option<usize>,
}

impl QueueSnapshot {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Build the queue for a playlist-context start: the clicked track first,
/// then the rest of the visible playlist in uniformly random order
/// (Fisher–Yates via [`SliceRandom::shuffle`]).
///
/// Only the first occurrence of `lead` is removed from the pool; remaining
/// duplicates shuffle like any other entry. If `lead` was not part of the
/// pool at all, it is still placed first and nothing is removed.
pub fn shuffle_behind<R: Rng + ?Sized>(
    lead: TrackRef,
    mut pool: Vec<TrackRef>,
    rng: &mut R,
) -> Vec<TrackRef> {
    if let Some(pos) = pool.iter().position(|track| *track == lead) {
        pool.remove(pos);
    }
    pool.shuffle(rng);

    let mut queue = Vec::with_capacity(pool.len() + 1);
    queue.push(lead);
    queue.extend(pool);
    queue
}
