//! Capture trait definitions
//!
//! Platform-agnostic seams for the device capture layer. A real platform
//! crate implements these on top of its camera API; this crate only
//! coordinates lifecycles through them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::capture::frame::VideoFrame;
use crate::error::DeviceError;

/// Constraints used when requesting a camera stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConstraints {
    /// Preferred capture width in pixels.
    pub ideal_width: u32,

    /// Preferred capture height in pixels.
    pub ideal_height: u32,

    /// Whether to request an audio track alongside video.
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            audio: false,
        }
    }
}

/// Platform entry point for acquiring camera streams.
///
/// `open_stream` is a suspension point: it may prompt the user for
/// permission and fails with a [`DeviceError`] when the environment lacks a
/// secure context, the capability is absent, or the device is denied.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn open_stream(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureStream>, DeviceError>;
}

/// An open device stream.
///
/// The device pushes frames; consumers subscribe through [`frames`]. Once
/// `stop_tracks` runs, the frame feed closes and every subscriber observes
/// end of stream.
///
/// [`frames`]: CaptureStream::frames
pub trait CaptureStream: Send {
    /// Subscribe to the live frame feed.
    fn frames(&self) -> broadcast::Receiver<VideoFrame>;

    /// Stop every underlying track. Must be idempotent.
    fn stop_tracks(&mut self);

    /// Whether the underlying tracks are still live.
    fn is_open(&self) -> bool;
}
