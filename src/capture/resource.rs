//! Camera stream acquisition and release.

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::capture::frame::VideoFrame;
use crate::capture::traits::{CaptureBackend, CaptureConstraints, CaptureStream};
use crate::error::DeviceError;

/// Acquires live camera streams from the platform backend.
pub struct CaptureResource {
    backend: Arc<dyn CaptureBackend>,
}

impl CaptureResource {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self { backend }
    }

    /// Request a camera stream.
    ///
    /// At most one handle may be open at a time; the caller tears down any
    /// previous handle before acquiring.
    pub async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureHandle, DeviceError> {
        let stream = self.backend.open_stream(constraints).await?;
        let handle = CaptureHandle {
            id: Uuid::new_v4(),
            constraints: constraints.clone(),
            stream,
            released: false,
        };

        tracing::info!(
            "Capture stream {} acquired ({}x{} ideal)",
            handle.id,
            constraints.ideal_width,
            constraints.ideal_height
        );
        Ok(handle)
    }
}

/// An open camera stream plus the constraints used to acquire it.
pub struct CaptureHandle {
    id: Uuid,
    constraints: CaptureConstraints,
    stream: Box<dyn CaptureStream>,
    released: bool,
}

impl CaptureHandle {
    /// Identifier for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Constraints the stream was acquired with.
    pub fn constraints(&self) -> &CaptureConstraints {
        &self.constraints
    }

    /// Subscribe to the stream's frame feed.
    ///
    /// A tap on a released handle yields end of stream immediately.
    pub fn frames(&self) -> broadcast::Receiver<VideoFrame> {
        self.stream.frames()
    }

    /// Whether the underlying tracks are still live.
    pub fn is_open(&self) -> bool {
        !self.released && self.stream.is_open()
    }

    /// Stop every underlying track. Idempotent; calling on an
    /// already-released handle is a no-op.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.stream.stop_tracks();
        self.released = true;
        tracing::info!("Capture stream {} released", self.id);
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.release();
    }
}
