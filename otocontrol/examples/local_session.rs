/// Walks through a complete player session against the in-memory
/// backends: start a track from a playlist view, edit the queue, persist
/// the session, then restore and resume it the way a reloaded page would.
///
/// Usage:
///   cargo run --example local_session
use anyhow::Result;
use otocontrol::{
    LocalSink, MemoryStore, PlayContext, PlayerControl, PlayerEvent, TrackRef,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,otocontrol=debug")),
        )
        .init();

    info!("Starting local player session");

    let store = MemoryStore::new();
    let sink = LocalSink::new();
    let mut player = PlayerControl::new(Box::new(store.clone()));
    player.attach_sink(Box::new(sink.clone()));

    let events = player.subscribe_events();

    // A playlist view as the page would render it.
    let playlist: Vec<TrackRef> = [
        "media/songs/dreams.mp3",
        "media/songs/holiday.mp3",
        "media/songs/limelight.mp3",
        "media/songs/aja.mp3",
    ]
    .iter()
    .map(|s| TrackRef::from(*s))
    .collect();

    info!("Clicking the third track of the playlist");
    player.start_track(
        TrackRef::from("media/songs/limelight.mp3"),
        PlayContext::FromPlaylist(&playlist),
    );

    let snapshot = player.queue_snapshot();
    info!(queue = %serde_json::to_string_pretty(&snapshot)?, "Queue after playlist start");

    info!("Queueing one more track next-in-line, then skipping forward");
    player.enqueue_next(TrackRef::from("media/songs/roundabout.mp3"));
    player.advance();

    info!(
        now_playing = ?player.current_track(),
        "Persisting the session before \"leaving the page\""
    );
    player.persist_session(None);

    // Simulate a page reload: fresh sink and controller, same store.
    let sink2 = LocalSink::new();
    let mut revived = PlayerControl::new(Box::new(store));
    revived.attach_sink(Box::new(sink2.clone()));
    let revived_events = revived.subscribe_events();

    let restored = revived.restore_session(None);
    info!(?restored, "Session restored; waiting for the user gesture");

    for event in revived_events.try_iter() {
        if let PlayerEvent::ResumeAvailable { track, position } = event {
            info!(track = track.as_str(), position, "Resume affordance shown");
        }
    }

    info!("User clicked the resume button");
    let resumed = revived.resume();
    info!(resumed, playing = sink2.is_playing(), "Session resumed");

    info!(events_seen = events.len(), "First session's event count");
    Ok(())
}
