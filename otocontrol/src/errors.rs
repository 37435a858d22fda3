use thiserror::Error;

/// Failures reported by a [`MediaSink`](crate::MediaSink) implementation.
///
/// None of these are fatal to the player: the controller logs them,
/// broadcasts a [`PlayerEvent`](crate::PlayerEvent) where relevant, and
/// leaves queue/cursor state untouched. They exist so sink adapters can
/// be precise about *why* a transport call was refused.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The sink elements are absent from the current page.
    #[error("Media sink is missing: {0}")]
    Missing(String),
    /// The sink refused to start playback (typically the browser's
    /// user-gesture autoplay policy).
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),
    /// The sink exists but has no resource loaded, or is still loading one.
    #[error("Media sink not ready: {0}")]
    NotReady(String),
    /// The referenced media resource could not be fetched or decoded.
    #[error("Media resource unavailable: {0}")]
    Unavailable(String),
}

impl SinkError {
    pub fn rejected(message: &str) -> Self {
        SinkError::PlaybackRejected(message.to_string())
    }

    pub fn not_ready(message: &str) -> Self {
        SinkError::NotReady(message.to_string())
    }
}
