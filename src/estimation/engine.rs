//! Pose estimation engine seam and result types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capture::frame::VideoFrame;
use crate::error::EstimationError;

/// One body landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth relative to the hip midpoint; negative is toward the camera.
    pub z: f32,
    /// Likelihood the landmark is visible in the frame, in [0, 1].
    pub visibility: f32,
}

/// Per-frame estimation output handed to the overlay renderer.
///
/// `landmarks` is absent when no body was detected in the frame.
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub frame: VideoFrame,
    pub landmarks: Option<Vec<Landmark>>,
}

/// Fixed engine tuning applied at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub model_complexity: u32,
    pub smooth_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_complexity: 1,
            smooth_landmarks: true,
            min_detection_confidence: 0.6,
            min_tracking_confidence: 0.6,
        }
    }
}

/// A live instance of the external estimation engine.
#[async_trait]
pub trait PoseEngine: Send {
    /// Run detection on one frame. `None` means no body was found.
    async fn detect(&mut self, frame: &VideoFrame) -> Result<Option<Vec<Landmark>>, EstimationError>;

    /// Release the underlying engine resources.
    fn close(&mut self);
}

/// Loads engine instances on demand.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self, config: &EngineConfig) -> Result<Box<dyn PoseEngine>, EstimationError>;
}
