//! Media sink abstraction.
//!
//! The sink is the playback device: in the original site an HTML5
//! `<audio>` element behind `#audio-player`/`#audio-source`, here any
//! backend implementing [`MediaSink`]. The controller never resolves
//! page elements itself; it talks to whatever sink was attached and
//! degrades to a warning when none is.

use std::sync::{Arc, Mutex};

use crate::{SinkError, TrackRef};

/// Transport and position contract the controller consumes.
///
/// Calls take `&self`: implementations own their interior mutability the
/// same way a DOM element does. `play` is where a browser backend maps
/// its rejected promise (autoplay policy) to
/// [`SinkError::PlaybackRejected`].
pub trait MediaSink {
    /// Resource currently assigned to the sink, if any.
    fn loaded_track(&self) -> Option<TrackRef>;

    /// Assign `track` and trigger a reload. Resets the position to 0.
    fn load(&self, track: &TrackRef) -> Result<(), SinkError>;

    /// Start (or restart) playback of the loaded resource.
    fn play(&self) -> Result<(), SinkError>;

    /// Current playback position in seconds.
    fn position(&self) -> Result<f64, SinkError>;

    /// Seek to `seconds` within the loaded resource.
    fn seek(&self, seconds: f64) -> Result<(), SinkError>;
}

#[derive(Debug, Default)]
struct LocalSinkState {
    loaded: Option<TrackRef>,
    position: f64,
    playing: bool,
}

/// In-process [`MediaSink`] with audio-element semantics.
///
/// Used by the examples and tests, and by any embedding that drives a
/// local decoder rather than a browser element. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct LocalSink {
    state: Arc<Mutex<LocalSinkState>>,
}

impl LocalSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }
}

impl MediaSink for LocalSink {
    fn loaded_track(&self) -> Option<TrackRef> {
        self.state.lock().unwrap().loaded.clone()
    }

    fn load(&self, track: &TrackRef) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        state.loaded = Some(track.clone());
        state.position = 0.0;
        state.playing = false;
        Ok(())
    }

    fn play(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.loaded.is_none() {
            return Err(SinkError::not_ready("no resource loaded"));
        }
        state.playing = true;
        Ok(())
    }

    fn position(&self) -> Result<f64, SinkError> {
        let state = self.state.lock().unwrap();
        if state.loaded.is_none() {
            return Err(SinkError::not_ready("no resource loaded"));
        }
        Ok(state.position)
    }

    fn seek(&self, seconds: f64) -> Result<(), SinkError> {
        let mut state = self.state.lock().unwrap();
        if state.loaded.is_none() {
            return Err(SinkError::not_ready("no resource loaded"));
        }
        state.position = seconds.max(0.0);
        Ok(())
    }
}
