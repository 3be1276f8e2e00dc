//! Formcheck - body-pose tracking sessions for exercise form review.
//!
//! This crate implements the session lifecycle around an external pose
//! estimation engine: acquiring and releasing the camera, recording the
//! stream into a reviewable clip, driving per-frame estimation over either
//! the live feed or clip playback, and keeping all of it leak-free across
//! arbitrary mode switches and failures. Platform concerns (cameras,
//! encoders, players, the engine itself, overlay drawing) live behind the
//! collaborator traits in each module.

pub mod capture;
pub mod config;
pub mod error;
pub mod estimation;
pub mod playback;
pub mod recorder;
pub mod render;
pub mod session;

pub use capture::{
    CaptureBackend, CaptureConstraints, CaptureHandle, CaptureResource, CaptureStream, VideoFrame,
};
pub use config::SessionConfig;
pub use error::{DeviceError, EstimationError, RecorderError, SessionError, SessionResult};
pub use estimation::{EngineConfig, EngineLoader, EstimationPipeline, FrameResult, Landmark, PoseEngine};
pub use playback::{ClipPlayer, PlaybackPosition, PlaybackResource, PlayerFactory};
pub use recorder::{
    Clip, ClipInfo, FinalizedMedia, MediaChunk, RecorderBackend, RecorderResource, RecorderSession,
};
pub use render::{NullRenderer, OverlayRenderer};
pub use session::{Platform, Session, SessionController, SessionEvent, SessionMode, SessionState};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for embedders without their own subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formcheck=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
