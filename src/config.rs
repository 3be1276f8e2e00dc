//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::capture::traits::CaptureConstraints;
use crate::estimation::engine::EngineConfig;

/// Configuration for a tracking session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Constraints used when acquiring the camera stream.
    pub capture: CaptureConstraints,

    /// Encoding preference order for recordings. The first runtime-supported
    /// entry wins; an empty or unsupported list defers to the backend
    /// default.
    pub mime_preferences: Vec<String>,

    /// Recorder timeslice in milliseconds; one chunk is buffered per slice.
    pub timeslice_ms: u64,

    /// Frame loop tick interval in milliseconds, nominally one display
    /// refresh.
    pub frame_interval_ms: u64,

    /// Estimation engine tuning.
    pub engine: EngineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConstraints::default(),
            mime_preferences: vec![
                "video/webm;codecs=vp9".to_string(),
                "video/webm;codecs=vp8".to_string(),
                "video/webm".to_string(),
            ],
            timeslice_ms: 200,
            frame_interval_ms: 16,
            engine: EngineConfig::default(),
        }
    }
}
