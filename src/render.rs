//! Overlay renderer collaborator.

use crate::estimation::engine::FrameResult;

/// Receives one [`FrameResult`] per completed estimation.
///
/// Drawing is the collaborator's business and is independent of session
/// state transitions; implementations must not block the frame loop.
pub trait OverlayRenderer: Send + Sync {
    fn render(&self, result: &FrameResult);
}

/// Renderer that drops every result, for headless embedders and tests.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl OverlayRenderer for NullRenderer {
    fn render(&self, result: &FrameResult) {
        tracing::trace!(
            "Discarding frame {} ({} landmarks)",
            result.frame.index,
            result.landmarks.as_ref().map_or(0, Vec::len)
        );
    }
}
