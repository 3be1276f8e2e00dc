//! Clip playback layer
//!
//! The platform player seam plus the resource that exposes transport
//! controls and position reporting for the review UI.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capture::frame::VideoFrame;
use crate::recorder::clip::Clip;

/// Range of the UI scrub control, mirrored by [`PlaybackPosition::scrub_value`].
pub const SCRUB_RANGE: u32 = 1000;

/// Platform seam for decoding and presenting a clip.
#[async_trait]
pub trait ClipPlayer: Send {
    /// Attach a clip as the playback source.
    async fn load(&mut self, clip: &Clip);

    fn play(&mut self);

    fn pause(&mut self);

    /// Move the playhead to an absolute time in seconds. The caller clamps.
    fn set_position(&mut self, seconds: f64);

    /// Current playhead time in seconds.
    fn position(&self) -> f64;

    /// Duration of the loaded media in seconds; 0.0 before metadata loads.
    fn duration(&self) -> f64;

    /// The frame at the current playhead, once decoded. `None` while no
    /// frame is ready (e.g. mid-seek or nothing loaded).
    async fn current_frame(&mut self) -> Option<VideoFrame>;

    /// Detach the source and release decoder resources.
    fn unload(&mut self);
}

/// Creates platform players on demand.
pub trait PlayerFactory: Send + Sync {
    fn create(&self) -> Box<dyn ClipPlayer>;
}

/// Playhead snapshot for UI synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackPosition {
    pub current_time: f64,
    pub duration_seconds: f64,
}

impl PlaybackPosition {
    /// Playhead projected onto the 0..=1000 scrub range.
    pub fn scrub_value(&self) -> u32 {
        if self.duration_seconds > 0.0 {
            (self.current_time / self.duration_seconds * f64::from(SCRUB_RANGE)).round() as u32
        } else {
            0
        }
    }
}

/// A clip attached for review: transport controls plus position reporting.
pub struct PlaybackResource {
    player: Box<dyn ClipPlayer>,
    duration_seconds: f64,
}

impl PlaybackResource {
    /// Load a clip into the given player.
    pub async fn attach(mut player: Box<dyn ClipPlayer>, clip: &Clip) -> Self {
        player.load(clip).await;
        let duration_seconds = player.duration();
        tracing::debug!(
            "Playback attached: clip {} ({:.2}s)",
            clip.id(),
            duration_seconds
        );
        Self {
            player,
            duration_seconds,
        }
    }

    pub fn play(&mut self) {
        self.player.play();
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    /// Seek to a fraction of the clip duration.
    ///
    /// The fraction is clamped to [0, 1] and the resulting target to
    /// [0, duration]. Returns the clamped target time in seconds. Seeking
    /// while an analysis loop runs is fine; the next iteration reads
    /// whatever frame is current once the seek settles.
    pub fn seek(&mut self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        let target = (fraction * self.duration_seconds).clamp(0.0, self.duration_seconds);
        self.player.set_position(target);
        target
    }

    /// Current playhead snapshot.
    pub fn position(&self) -> PlaybackPosition {
        PlaybackPosition {
            current_time: self.player.position(),
            duration_seconds: self.duration_seconds,
        }
    }

    /// The frame at the current playhead, if one is ready.
    pub async fn current_frame(&mut self) -> Option<VideoFrame> {
        self.player.current_frame().await
    }

    /// Pause and release the player's decoder resources.
    pub fn detach(&mut self) {
        self.player.pause();
        self.player.unload();
        tracing::debug!("Playback detached");
    }
}
