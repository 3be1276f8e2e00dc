//! Lazily-initialized wrapper around the external estimation engine.

use std::sync::Arc;

use crate::capture::frame::VideoFrame;
use crate::error::EstimationError;
use crate::estimation::engine::{EngineConfig, EngineLoader, FrameResult, PoseEngine};

/// Feeds frames to the pose engine and collects per-frame results.
///
/// The engine itself is created on first use. After `close`, every further
/// `feed` is silently ignored: closure can race an in-flight loop iteration
/// that was issued under a stale generation token, and that race is benign.
pub struct EstimationPipeline {
    loader: Arc<dyn EngineLoader>,
    config: EngineConfig,
    engine: Option<Box<dyn PoseEngine>>,
    closed: bool,
}

impl EstimationPipeline {
    pub fn new(loader: Arc<dyn EngineLoader>, config: EngineConfig) -> Self {
        Self {
            loader,
            config,
            engine: None,
            closed: false,
        }
    }

    /// Whether the pipeline can still accept frames.
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    /// Whether an engine instance is currently alive.
    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Force the lazy engine initialization so load failures surface now
    /// rather than on the first frame.
    pub async fn ensure_engine(&mut self) -> Result<(), EstimationError> {
        if self.closed {
            return Err(EstimationError::Engine("pipeline is closed".into()));
        }
        if self.engine.is_none() {
            let engine = self.loader.load(&self.config).await?;
            self.engine = Some(engine);
            tracing::info!(
                "Pose engine loaded (complexity {}, confidence {}/{})",
                self.config.model_complexity,
                self.config.min_detection_confidence,
                self.config.min_tracking_confidence
            );
        }
        Ok(())
    }

    /// Run one frame through the engine.
    ///
    /// Returns `Ok(None)` without side effects when the pipeline has been
    /// closed; errors are only raised by the engine itself.
    pub async fn feed(&mut self, frame: VideoFrame) -> Result<Option<FrameResult>, EstimationError> {
        if self.closed {
            tracing::trace!("Dropping frame {} fed after pipeline close", frame.index);
            return Ok(None);
        }
        self.ensure_engine().await?;

        let engine = match self.engine.as_mut() {
            Some(engine) => engine,
            None => return Ok(None),
        };
        let landmarks = engine.detect(&frame).await?;
        Ok(Some(FrameResult { frame, landmarks }))
    }

    /// Release the engine. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.close();
            tracing::info!("Pose engine closed");
        }
        self.closed = true;
    }
}

impl Drop for EstimationPipeline {
    fn drop(&mut self) {
        self.close();
    }
}
