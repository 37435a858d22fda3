//! Playlist view abstraction.
//!
//! When playback starts from a playlist context, the controller asks the
//! currently rendered page fragment for its ordered tracks and builds the
//! queue from them. How the fragment got there (server render, AJAX swap)
//! is not this crate's concern.

use crate::TrackRef;

/// Ordered tracks of the playlist currently presented to the user.
pub trait PlaylistView {
    fn visible_tracks(&self) -> Vec<TrackRef>;
}

/// Any slice of tracks works as a playlist view; tests and examples use
/// this directly.
impl PlaylistView for [TrackRef] {
    fn visible_tracks(&self) -> Vec<TrackRef> {
        self.to_vec()
    }
}

impl PlaylistView for Vec<TrackRef> {
    fn visible_tracks(&self) -> Vec<TrackRef> {
        self.clone()
    }
}
