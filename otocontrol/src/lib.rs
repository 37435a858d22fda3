//! Playback-queue control core for OtoMusic.
//!
//! `otocontrol` owns the ordered playback queue of the player, the cursor
//! into it, and the binding to a single media sink. Everything the
//! surrounding page does (fragment loading, forms, styling) stays outside;
//! the controller only consumes three collaborator contracts:
//!
//!   - [`MediaSink`] — load/play/seek on the playback device,
//!   - [`SessionStore`] — identity-scoped key/value persistence,
//!   - [`PlaylistView`] — the tracks of the currently rendered playlist.
//!
//! Higher layers interact with playback exclusively through
//! [`PlayerControl`] so that queue manipulation, session persistence, and
//! the resume-gesture handshake stay in one place.

mod events;

pub mod controller;
pub mod errors;
pub mod playlist;
pub mod queue;
pub mod session;
pub mod sink;
pub mod store;

use serde::{Deserialize, Serialize};

pub use controller::{PlayContext, PlayerControl, Step};
pub use errors::SinkError;
pub use events::{PlayerEvent, PlayerEventBus};
pub use playlist::PlaylistView;
pub use queue::{PlayQueue, QueueSnapshot};
pub use session::SessionKeys;
pub use sink::{LocalSink, MediaSink};
pub use store::{MemoryStore, SessionStore};

/// Opaque locator naming a playable media resource.
///
/// Equality is exact string match; the controller never interprets the
/// contents (typically a URL served by the site's media backend).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRef(pub String);

impl TrackRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackRef {
    fn from(value: &str) -> Self {
        TrackRef(value.to_string())
    }
}

impl From<String> for TrackRef {
    fn from(value: String) -> Self {
        TrackRef(value)
    }
}

impl std::fmt::Display for TrackRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
