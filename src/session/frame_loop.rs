//! Generation-token frame loop
//!
//! A cooperative driver that pulls frames from the active source and feeds
//! the estimation pipeline. Stopping is only ever a token bump: every
//! iteration compares the token captured at spawn against the controller's
//! current generation and exits silently on mismatch, so a stale loop can
//! drain concurrently with its replacement without interference.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::capture::frame::VideoFrame;
use crate::estimation::pipeline::EstimationPipeline;
use crate::playback::PlaybackResource;
use crate::render::OverlayRenderer;

/// Where the loop pulls its frames from.
pub(crate) enum FrameSource {
    /// Tap on the live camera stream.
    Camera(broadcast::Receiver<VideoFrame>),
    /// Shared playback element; reads whatever frame is current.
    Playback(Arc<Mutex<PlaybackResource>>),
}

impl FrameSource {
    async fn next_frame(&mut self) -> Option<VideoFrame> {
        match self {
            Self::Camera(tap) => loop {
                match tap.recv().await {
                    Ok(frame) => return Some(frame),
                    // Fell behind the device; skip to the freshest frame.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            },
            Self::Playback(playback) => playback.lock().await.current_frame().await,
        }
    }

    fn is_camera(&self) -> bool {
        matches!(self, Self::Camera(_))
    }
}

/// Spawn a loop bound to `token`.
///
/// The loop owns nothing: pipeline and playback are shared, and the only
/// way to stop it is to advance `generation` past `token`.
pub(crate) fn spawn_frame_loop(
    token: u64,
    generation: Arc<AtomicU64>,
    mut source: FrameSource,
    pipeline: Arc<Mutex<EstimationPipeline>>,
    renderer: Arc<dyn OverlayRenderer>,
    tick: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("Frame loop {} started", token);
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if generation.load(Ordering::SeqCst) != token {
                break;
            }

            match source.next_frame().await {
                Some(frame) => {
                    let fed = pipeline.lock().await.feed(frame).await;
                    match fed {
                        Ok(Some(result)) => renderer.render(&result),
                        // Pipeline closed under us; the token check above
                        // ends the loop next tick.
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!("Frame loop {}: estimation failed: {}", token, e);
                        }
                    }
                }
                None => {
                    if source.is_camera() {
                        // Stream ended; nothing more will arrive.
                        break;
                    }
                    // Playback has no frame ready (mid-seek); try next tick.
                }
            }
        }
        tracing::debug!("Frame loop {} exited", token);
    })
}
