//! Pose estimation layer
//!
//! The engine seam plus the lazily-initialized pipeline that feeds it frames.

pub mod engine;
pub mod pipeline;

pub use engine::{EngineConfig, EngineLoader, FrameResult, Landmark, PoseEngine};
pub use pipeline::EstimationPipeline;
