//! Playback controller.
//!
//! `PlayerControl` is the single owner of the queue/cursor state and the
//! only place that talks to the media sink. All operations run on the
//! caller's thread in response to discrete UI events and never block on
//! playback actually starting: transport failures are logged and
//! broadcast, they never propagate to the caller and never corrupt queue
//! state. A missing sink turns every operation into a warn-and-return
//! no-op (the player page may simply not be rendered).

use crossbeam_channel::Receiver;
use tracing::{debug, warn};

use crate::events::{PlayerEvent, PlayerEventBus};
use crate::queue::{self, PlayQueue, QueueSnapshot};
use crate::session::SessionKeys;
use crate::sink::MediaSink;
use crate::store::SessionStore;
use crate::{PlaylistView, TrackRef};

/// Where a start-playback request originates.
pub enum PlayContext<'a> {
    /// A track was started on its own (search result, single-song page).
    Standalone,
    /// A track was started from a rendered playlist; the rest of the view
    /// is shuffled in behind it.
    FromPlaylist(&'a dyn PlaylistView),
}

/// Outcome of a cursor move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The cursor moved and playback of the new track was requested.
    Moved,
    /// `advance()` was already on the last entry; nothing changed.
    AtEnd,
    /// `retreat()` was already on the first entry; nothing changed.
    AtStart,
    /// No media sink is attached; nothing changed.
    Skipped,
}

/// Owner of the playback queue, its cursor, and the sink binding.
pub struct PlayerControl {
    queue: PlayQueue,
    sink: Option<Box<dyn MediaSink>>,
    store: Box<dyn SessionStore>,
    events: PlayerEventBus,
    pending_resume: Option<TrackRef>,
    load_seq: u64,
}

impl PlayerControl {
    /// Create a controller with no sink attached yet.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self {
            queue: PlayQueue::new(),
            sink: None,
            store,
            events: PlayerEventBus::new(),
            pending_resume: None,
            load_seq: 0,
        }
    }

    /// Bind the playback device. Replaces any previously attached sink.
    pub fn attach_sink(&mut self, sink: Box<dyn MediaSink>) {
        self.sink = Some(sink);
    }

    /// Drop the sink binding; subsequent operations degrade to no-ops.
    pub fn detach_sink(&mut self) {
        self.sink = None;
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Track the cursor currently points at.
    pub fn current_track(&self) -> Option<TrackRef> {
        self.queue.current().cloned()
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    /// Whether a restored session is parked waiting for a user gesture.
    pub fn resume_pending(&self) -> bool {
        self.pending_resume.is_some()
    }

    /// Subscribe to playback events. Each subscriber receives all future
    /// events independently.
    pub fn subscribe_events(&self) -> Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Start playback of `track`, rebuilding the queue.
    ///
    /// Standalone context yields the one-element queue `[track]`. Playlist
    /// context queries the view, removes the clicked track, shuffles the
    /// remainder, and queues the clicked track first. Either way the
    /// cursor lands on 0 and a load-or-restart is issued.
    pub fn start_track(&mut self, track: TrackRef, context: PlayContext<'_>) {
        if self.sink.is_none() {
            warn!(
                track = track.as_str(),
                "Media sink unavailable; start request dropped"
            );
            return;
        }

        let items = match context {
            PlayContext::Standalone => vec![track.clone()],
            PlayContext::FromPlaylist(view) => {
                let visible = view.visible_tracks();
                debug!(
                    track = track.as_str(),
                    playlist_len = visible.len(),
                    "Shuffling playlist view behind clicked track"
                );
                queue::shuffle_behind(track.clone(), visible, &mut rand::rng())
            }
        };

        let queue_len = items.len();
        self.queue.replace(items, Some(0));
        debug!(track = track.as_str(), queue_len, "Queue rebuilt");
        self.load_and_play(&track);
    }

    /// Insert `track` right after the current one without touching the
    /// cursor or the running playback. On an empty queue this falls back
    /// to a standalone start.
    pub fn enqueue_next(&mut self, track: TrackRef) {
        if self.queue.is_empty() {
            debug!(
                track = track.as_str(),
                "Queue empty; enqueue-next falls back to standalone start"
            );
            self.start_track(track, PlayContext::Standalone);
            return;
        }

        self.queue.insert_next(track);
        debug!(queue_len = self.queue.len(), "Track queued next-in-line");
    }

    /// Move to the next queued track, if any.
    pub fn advance(&mut self) -> Step {
        if self.sink.is_none() {
            warn!("Media sink unavailable; advance request dropped");
            return Step::Skipped;
        }

        match self.queue.step_forward() {
            Some(index) => {
                if let Some(track) = self.queue.get(index).cloned() {
                    debug!(
                        track = track.as_str(),
                        index,
                        "Advanced to next queued track"
                    );
                    self.load_and_play(&track);
                }
                Step::Moved
            }
            None => {
                debug!(queue_len = self.queue.len(), "Advance past end of queue");
                self.events.broadcast(PlayerEvent::EndOfQueue);
                Step::AtEnd
            }
        }
    }

    /// Move back to the previous queued track, if any.
    pub fn retreat(&mut self) -> Step {
        if self.sink.is_none() {
            warn!("Media sink unavailable; retreat request dropped");
            return Step::Skipped;
        }

        match self.queue.step_back() {
            Some(index) => {
                if let Some(track) = self.queue.get(index).cloned() {
                    debug!(
                        track = track.as_str(),
                        index,
                        "Retreated to previous queued track"
                    );
                    self.load_and_play(&track);
                }
                Step::Moved
            }
            None => {
                debug!("Retreat past start of queue");
                self.events.broadcast(PlayerEvent::StartOfQueue);
                Step::AtStart
            }
        }
    }

    /// Persist the sink's loaded track and position under `identity`'s
    /// keys. Safe on a partially initialized sink: with nothing loaded,
    /// nothing is written.
    pub fn persist_session(&self, identity: Option<&str>) {
        let Some(sink) = self.sink.as_deref() else {
            warn!("Media sink unavailable; session not persisted");
            return;
        };
        let Some(track) = sink.loaded_track() else {
            debug!("No track loaded; nothing to persist");
            return;
        };
        let position = match sink.position() {
            Ok(seconds) => seconds,
            Err(err) => {
                warn!(
                    track = track.as_str(),
                    error = %err,
                    "Could not read playback position; session not persisted"
                );
                return;
            }
        };

        let keys = SessionKeys::for_identity(identity);
        keys.write(self.store.as_ref(), &track, position);
        debug!(track = track.as_str(), position, "Session persisted");
    }

    /// Restore `identity`'s stored session into the sink: load the track
    /// and seek to the stored position, but do NOT start playback —
    /// browsers refuse unsolicited audio. Instead the resume affordance
    /// is armed and a [`PlayerEvent::ResumeAvailable`] broadcast; the
    /// actual play happens in [`resume`](Self::resume) on a genuine user
    /// gesture.
    ///
    /// Returns the restored track, or `None` when nothing was stored (or
    /// the sink could not take it).
    pub fn restore_session(&mut self, identity: Option<&str>) -> Option<TrackRef> {
        let keys = SessionKeys::for_identity(identity);
        let track = keys.read_track(self.store.as_ref())?;

        let Some(sink) = self.sink.as_deref() else {
            warn!(
                track = track.as_str(),
                "Media sink unavailable; stored session not restored"
            );
            return None;
        };
        if let Err(err) = sink.load(&track) {
            warn!(
                track = track.as_str(),
                error = %err,
                "Failed to load stored track into sink"
            );
            return None;
        }

        let position = keys.read_position(self.store.as_ref());
        if let Some(seconds) = position {
            if let Err(err) = sink.seek(seconds) {
                warn!(
                    track = track.as_str(),
                    seconds,
                    error = %err,
                    "Failed to seek to stored position"
                );
            }
        }

        if otoconfig::get_config().get_resume_enabled() {
            self.pending_resume = Some(track.clone());
            self.events.broadcast(PlayerEvent::ResumeAvailable {
                track: track.clone(),
                position: position.unwrap_or(0.0),
            });
            debug!(track = track.as_str(), "Session restored; resume armed");
        } else {
            debug!(
                track = track.as_str(),
                "Session restored; resume affordance disabled by configuration"
            );
        }

        Some(track)
    }

    /// Second phase of session restore, to be called from a genuine user
    /// gesture: play the parked track. The affordance is consumed on
    /// first activation whether or not the sink accepts the play.
    ///
    /// Returns `true` when playback actually started.
    pub fn resume(&mut self) -> bool {
        let Some(track) = self.pending_resume.take() else {
            return false;
        };
        let Some(sink) = self.sink.as_deref() else {
            warn!(track = track.as_str(), "Media sink unavailable; resume dropped");
            return false;
        };

        match sink.play() {
            Ok(()) => {
                debug!(track = track.as_str(), "Resumed playback after user gesture");
                self.events.broadcast(PlayerEvent::ResumeConsumed { track });
                true
            }
            Err(err) => {
                warn!(
                    track = track.as_str(),
                    error = %err,
                    "Resume rejected by sink"
                );
                self.events.broadcast(PlayerEvent::PlaybackFailed {
                    track,
                    reason: err.to_string(),
                });
                false
            }
        }
    }

    /// Shared load-vs-restart primitive: same track already loaded means
    /// rewind to 0 and play; a different track means load then play. Each
    /// request gets the next load sequence number so overlapping requests
    /// stay ordered ("last request wins" at the sink).
    fn load_and_play(&mut self, track: &TrackRef) {
        let Some(sink) = self.sink.as_deref() else {
            warn!(
                track = track.as_str(),
                "Media sink unavailable; playback request dropped"
            );
            return;
        };

        self.load_seq += 1;
        let seq = self.load_seq;

        if sink.loaded_track().as_ref() == Some(track) {
            if let Err(err) = sink.seek(0.0) {
                warn!(
                    track = track.as_str(),
                    seq,
                    error = %err,
                    "Failed to rewind already-loaded track"
                );
            }
        } else if let Err(err) = sink.load(track) {
            warn!(
                track = track.as_str(),
                seq,
                error = %err,
                "Failed to load track into sink"
            );
            self.events.broadcast(PlayerEvent::PlaybackFailed {
                track: track.clone(),
                reason: err.to_string(),
            });
            return;
        }

        match sink.play() {
            Ok(()) => {
                debug!(track = track.as_str(), seq, "Playback requested");
                self.events.broadcast(PlayerEvent::TrackStarted {
                    track: track.clone(),
                    seq,
                });
            }
            Err(err) => {
                warn!(
                    track = track.as_str(),
                    seq,
                    error = %err,
                    "Sink rejected play request"
                );
                self.events.broadcast(PlayerEvent::PlaybackFailed {
                    track: track.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SinkError;
    use crate::store::MemoryStore;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    enum SinkCall {
        Load(String),
        Seek(f64),
        Play,
    }

    #[derive(Default)]
    struct RecordingState {
        loaded: Option<TrackRef>,
        position: f64,
        calls: Vec<SinkCall>,
        reject_play: bool,
    }

    /// Sink double recording every transport call; clones share state.
    #[derive(Clone, Default)]
    struct RecordingSink {
        state: Arc<Mutex<RecordingState>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self::default()
        }

        fn rejecting() -> Self {
            let sink = Self::default();
            sink.state.lock().unwrap().reject_play = true;
            sink
        }

        fn calls(&self) -> Vec<SinkCall> {
            self.state.lock().unwrap().calls.clone()
        }

        fn last_loaded(&self) -> Option<String> {
            self.state
                .lock()
                .unwrap()
                .loaded
                .as_ref()
                .map(|t| t.0.clone())
        }

        fn play_count(&self) -> usize {
            self.calls().iter().filter(|c| **c == SinkCall::Play).count()
        }

        fn set_position(&self, seconds: f64) {
            self.state.lock().unwrap().position = seconds;
        }
    }

    impl MediaSink for RecordingSink {
        fn loaded_track(&self) -> Option<TrackRef> {
            self.state.lock().unwrap().loaded.clone()
        }

        fn load(&self, track: &TrackRef) -> Result<(), SinkError> {
            let mut state = self.state.lock().unwrap();
            state.loaded = Some(track.clone());
            state.position = 0.0;
            state.calls.push(SinkCall::Load(track.0.clone()));
            Ok(())
        }

        fn play(&self) -> Result<(), SinkError> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(SinkCall::Play);
            if state.reject_play {
                return Err(SinkError::rejected("user gesture required"));
            }
            Ok(())
        }

        fn position(&self) -> Result<f64, SinkError> {
            Ok(self.state.lock().unwrap().position)
        }

        fn seek(&self, seconds: f64) -> Result<(), SinkError> {
            let mut state = self.state.lock().unwrap();
            state.position = seconds;
            state.calls.push(SinkCall::Seek(seconds));
            Ok(())
        }
    }

    fn track(name: &str) -> TrackRef {
        TrackRef::from(name)
    }

    fn player_with_sink() -> (PlayerControl, RecordingSink) {
        let sink = RecordingSink::new();
        let mut player = PlayerControl::new(Box::new(MemoryStore::new()));
        player.attach_sink(Box::new(sink.clone()));
        (player, sink)
    }

    #[test]
    fn standalone_start_builds_single_entry_queue() {
        let (mut player, sink) = player_with_sink();

        player.start_track(track("a.mp3"), PlayContext::Standalone);

        let snapshot = player.queue_snapshot();
        assert_eq!(snapshot.items, vec![track("a.mp3")]);
        assert_eq!(snapshot.cursor, Some(0));
        assert_eq!(sink.last_loaded().as_deref(), Some("a.mp3"));
        assert_eq!(sink.play_count(), 1);
    }

    #[test]
    fn repeated_standalone_start_restarts_without_duplicating() {
        let (mut player, sink) = player_with_sink();

        player.start_track(track("a.mp3"), PlayContext::Standalone);
        sink.set_position(30.0);
        player.start_track(track("a.mp3"), PlayContext::Standalone);

        assert_eq!(player.queue_snapshot().len(), 1);
        // Second start must rewind, not reload.
        assert_eq!(
            sink.calls(),
            vec![
                SinkCall::Load("a.mp3".into()),
                SinkCall::Play,
                SinkCall::Seek(0.0),
                SinkCall::Play,
            ]
        );
    }

    #[test]
    fn playlist_start_shuffles_the_rest_behind_the_clicked_track() {
        let (mut player, sink) = player_with_sink();
        let playlist: Vec<TrackRef> =
            ["a", "b", "c", "d"].iter().map(|n| track(n)).collect();

        player.start_track(track("c"), PlayContext::FromPlaylist(&playlist));

        let snapshot = player.queue_snapshot();
        assert_eq!(snapshot.len(), playlist.len());
        assert_eq!(snapshot.items[0], track("c"));
        assert_eq!(snapshot.cursor, Some(0));

        let mut rest: Vec<&str> = snapshot.items[1..].iter().map(|t| t.as_str()).collect();
        rest.sort_unstable();
        assert_eq!(rest, vec!["a", "b", "d"]);
        assert_eq!(sink.last_loaded().as_deref(), Some("c"));
    }

    #[test]
    fn advance_enqueue_next_scenario() {
        let (mut player, sink) = player_with_sink();
        player.queue.replace(
            ["a", "b", "c"].iter().map(|n| track(n)).collect(),
            Some(0),
        );

        assert_eq!(player.advance(), Step::Moved);
        assert_eq!(player.queue_snapshot().cursor, Some(1));
        assert_eq!(sink.last_loaded().as_deref(), Some("b"));

        player.enqueue_next(track("d"));
        let snapshot = player.queue_snapshot();
        assert_eq!(
            snapshot.items,
            vec![track("a"), track("b"), track("d"), track("c")]
        );
        assert_eq!(snapshot.cursor, Some(1));

        assert_eq!(player.advance(), Step::Moved);
        assert_eq!(player.queue_snapshot().cursor, Some(2));
        assert_eq!(sink.last_loaded().as_deref(), Some("d"));
    }

    #[test]
    fn advance_at_end_reports_boundary_without_moving() {
        let (mut player, _sink) = player_with_sink();
        let events = player.subscribe_events();
        player
            .queue
            .replace(["a", "b"].iter().map(|n| track(n)).collect(), Some(1));

        assert_eq!(player.advance(), Step::AtEnd);
        assert_eq!(player.queue_snapshot().cursor, Some(1));
        assert!(
            events
                .try_iter()
                .any(|e| matches!(e, PlayerEvent::EndOfQueue))
        );
    }

    #[test]
    fn retreat_at_start_reports_boundary_without_moving() {
        let (mut player, _sink) = player_with_sink();
        player
            .queue
            .replace(["a", "b"].iter().map(|n| track(n)).collect(), Some(0));

        assert_eq!(player.retreat(), Step::AtStart);
        assert_eq!(player.queue_snapshot().cursor, Some(0));
    }

    #[test]
    fn enqueue_next_on_empty_queue_starts_standalone() {
        let (mut player, sink) = player_with_sink();

        player.enqueue_next(track("a.mp3"));

        let snapshot = player.queue_snapshot();
        assert_eq!(snapshot.items, vec![track("a.mp3")]);
        assert_eq!(snapshot.cursor, Some(0));
        assert_eq!(sink.play_count(), 1);
    }

    #[test]
    fn operations_without_sink_are_inert() {
        let mut player = PlayerControl::new(Box::new(MemoryStore::new()));

        player.start_track(track("a.mp3"), PlayContext::Standalone);
        assert!(player.queue_snapshot().is_empty());
        assert_eq!(player.advance(), Step::Skipped);
        assert_eq!(player.retreat(), Step::Skipped);
        player.persist_session(Some("alice"));
        assert!(!player.resume());
    }

    #[test]
    fn rejected_play_keeps_queue_state_and_emits_failure() {
        let sink = RecordingSink::rejecting();
        let mut player = PlayerControl::new(Box::new(MemoryStore::new()));
        player.attach_sink(Box::new(sink.clone()));
        let events = player.subscribe_events();

        player.start_track(track("a.mp3"), PlayContext::Standalone);

        let snapshot = player.queue_snapshot();
        assert_eq!(snapshot.items, vec![track("a.mp3")]);
        assert_eq!(snapshot.cursor, Some(0));
        assert!(events.try_iter().any(|e| matches!(
            e,
            PlayerEvent::PlaybackFailed { .. }
        )));
    }

    #[test]
    fn persist_with_nothing_loaded_writes_nothing() {
        let store = MemoryStore::new();
        let mut player = PlayerControl::new(Box::new(store.clone()));
        player.attach_sink(Box::new(RecordingSink::new()));

        player.persist_session(Some("alice"));

        assert!(store.is_empty());
    }

    #[test]
    fn persist_restore_round_trip_defers_playback() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let mut player = PlayerControl::new(Box::new(store.clone()));
        player.attach_sink(Box::new(sink.clone()));

        player.start_track(track("song1.mp3"), PlayContext::Standalone);
        sink.set_position(42.5);
        player.persist_session(Some("alice"));

        // Fresh page: new controller, same store.
        let sink2 = RecordingSink::new();
        let mut revived = PlayerControl::new(Box::new(store));
        revived.attach_sink(Box::new(sink2.clone()));
        let events = revived.subscribe_events();

        let restored = revived.restore_session(Some("alice"));
        assert_eq!(restored, Some(track("song1.mp3")));
        assert_eq!(sink2.last_loaded().as_deref(), Some("song1.mp3"));
        assert_eq!(
            sink2.calls(),
            vec![SinkCall::Load("song1.mp3".into()), SinkCall::Seek(42.5)]
        );
        assert_eq!(sink2.play_count(), 0);
        assert!(revived.resume_pending());
        assert!(events.try_iter().any(|e| matches!(
            e,
            PlayerEvent::ResumeAvailable { .. }
        )));

        // First user gesture plays exactly once and dismisses the affordance.
        assert!(revived.resume());
        assert_eq!(sink2.play_count(), 1);
        assert!(!revived.resume_pending());
        assert!(!revived.resume());
        assert_eq!(sink2.play_count(), 1);
    }

    #[test]
    fn restore_without_stored_session_is_a_no_op() {
        let (mut player, sink) = player_with_sink();
        assert_eq!(player.restore_session(Some("nobody")), None);
        assert!(sink.calls().is_empty());
        assert!(!player.resume_pending());
    }

    #[test]
    fn garbage_stored_position_restores_without_seek() {
        let store = MemoryStore::new();
        store.set("alice_currentTrackSrc", "song1.mp3");
        store.set("alice_currentTrackTime", "garbage");

        let sink = RecordingSink::new();
        let mut player = PlayerControl::new(Box::new(store));
        player.attach_sink(Box::new(sink.clone()));

        assert_eq!(
            player.restore_session(Some("alice")),
            Some(track("song1.mp3"))
        );
        assert_eq!(sink.calls(), vec![SinkCall::Load("song1.mp3".into())]);
    }

    #[test]
    fn load_sequence_numbers_increase_per_request() {
        let (mut player, _sink) = player_with_sink();
        let events = player.subscribe_events();

        player.start_track(track("a"), PlayContext::Standalone);
        player.enqueue_next(track("b"));
        player.advance();

        let seqs: Vec<u64> = events
            .try_iter()
            .filter_map(|e| match e {
                PlayerEvent::TrackStarted { seq, .. } => Some(seq),
                _ => None,
            })
            .collect();
        assert_eq!(seqs, vec![1, 2]);
    }
}
