//! Identity-scoped session state.
//!
//! Each user identity persists exactly two values: the last loaded track
//! and the last playback position in seconds. Keys keep the original
//! site's `localStorage` naming (`{identity}_currentTrackSrc`,
//! `{identity}_currentTrackTime`) so an existing deployment's stored
//! sessions stay readable. Anonymous visitors fall back to the guest
//! sentinel from [`otoconfig`].

use tracing::warn;

use crate::{SessionStore, TrackRef};

const TRACK_FIELD: &str = "currentTrackSrc";
const POSITION_FIELD: &str = "currentTrackTime";

/// Storage keys for one identity's session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionKeys {
    pub track: String,
    pub position: String,
}

impl SessionKeys {
    /// Compose the keys for `identity`, falling back to the configured
    /// guest sentinel when no authenticated identity is available.
    pub fn for_identity(identity: Option<&str>) -> Self {
        let identity = match identity {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => otoconfig::get_config().get_guest_identity(),
        };
        Self {
            track: format!("{identity}_{TRACK_FIELD}"),
            position: format!("{identity}_{POSITION_FIELD}"),
        }
    }

    /// Write `track` and `position` under these keys.
    pub fn write(&self, store: &dyn SessionStore, track: &TrackRef, position: f64) {
        store.set(&self.track, track.as_str());
        store.set(&self.position, &position.to_string());
    }

    /// Read the stored track reference, if any.
    pub fn read_track(&self, store: &dyn SessionStore) -> Option<TrackRef> {
        store.get(&self.track).map(TrackRef)
    }

    /// Read the stored position. Unparseable values are tolerated: the
    /// session still restores, just without a seek.
    pub fn read_position(&self, store: &dyn SessionStore) -> Option<f64> {
        let raw = store.get(&self.position)?;
        match raw.parse::<f64>() {
            Ok(seconds) => Some(seconds),
            Err(_) => {
                warn!(
                    key = self.position.as_str(),
                    raw = raw.as_str(),
                    "Stored playback position is not a number; ignoring"
                );
                None
            }
        }
    }
}
