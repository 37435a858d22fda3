use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Serialize;

use crate::TrackRef;

/// Playback notifications emitted by [`PlayerControl`](crate::PlayerControl).
///
/// These are what the embedding UI layer listens to: showing the resume
/// affordance, surfacing playback failures, reacting to queue edges.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// A load/play request was issued for `track`. `seq` is the controller's
    /// monotonically increasing load sequence number; when requests overlap,
    /// the highest sequence is the one the sink ends up playing.
    TrackStarted { track: TrackRef, seq: u64 },
    /// The sink refused to load or play `track`. Queue state is unaffected.
    PlaybackFailed { track: TrackRef, reason: String },
    /// `advance()` was called with the cursor already on the last entry.
    EndOfQueue,
    /// `retreat()` was called with the cursor already on the first entry.
    StartOfQueue,
    /// A persisted session was restored into the sink. Playback is parked
    /// until a user gesture triggers `resume()`.
    ResumeAvailable { track: TrackRef, position: f64 },
    /// The pending resume was activated and playback started.
    ResumeConsumed { track: TrackRef },
}

/// Fan-out bus for [`PlayerEvent`]s.
///
/// Every subscriber gets its own unbounded receiver; subscribers whose
/// receiving end was dropped are pruned on the next broadcast.
#[derive(Clone, Default)]
pub struct PlayerEventBus {
    subscribers: Arc<Mutex<Vec<Sender<PlayerEvent>>>>,
}

impl PlayerEventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        let (tx, rx) = unbounded::<PlayerEvent>();
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers.push(tx);
        }
        rx
    }

    pub(crate) fn broadcast(&self, event: PlayerEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
