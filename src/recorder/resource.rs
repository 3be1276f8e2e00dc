//! Recording resource
//!
//! Taps the live capture stream, buffers encoded timeslices as they arrive,
//! and assembles the finished clip once finalization completes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::capture::frame::VideoFrame;
use crate::capture::resource::CaptureHandle;
use crate::error::RecorderError;
use crate::recorder::clip::{Clip, MediaChunk};

/// Flush result returned by the platform encoder at finalize.
#[derive(Debug)]
pub struct FinalizedMedia {
    /// Chunks the encoder was still holding when it flushed.
    pub trailing_chunks: Vec<MediaChunk>,

    /// Duration of the encoded media in seconds.
    pub duration_seconds: f64,
}

/// Platform media encoder seam.
#[async_trait]
pub trait RecorderBackend: Send + Sync {
    /// Whether the runtime can encode the given mime type.
    fn supports_mime(&self, mime_type: &str) -> bool;

    /// Begin encoding the tapped stream, emitting one chunk per timeslice.
    /// A `mime_type` of `None` selects the backend's default encoding.
    async fn begin(
        &self,
        tap: broadcast::Receiver<VideoFrame>,
        mime_type: Option<&str>,
        timeslice: Duration,
    ) -> Result<Box<dyn RecorderSession>, RecorderError>;
}

/// One in-flight encoder session.
#[async_trait]
pub trait RecorderSession: Send {
    /// The encoding actually selected by the runtime.
    fn mime_type(&self) -> &str;

    /// Next encoded timeslice, or `None` once the tapped stream has ended.
    /// Must be cancel-safe: the resource polls it inside a `select!`.
    async fn next_chunk(&mut self) -> Option<MediaChunk>;

    /// Flush the encoder and report the finished media.
    async fn finalize(self: Box<Self>) -> Result<FinalizedMedia, RecorderError>;
}

struct ActiveRecording {
    mime_type: String,
    chunks: Arc<Mutex<Vec<MediaChunk>>>,
    stop_tx: watch::Sender<bool>,
    collector: JoinHandle<Result<FinalizedMedia, RecorderError>>,
    finalizing: bool,
}

/// Records a tapped capture stream into a finished [`Clip`].
///
/// The resource only ever reads the stream it taps; the capture handle's
/// lifecycle stays with its owner.
pub struct RecorderResource {
    backend: Arc<dyn RecorderBackend>,
    active: Option<ActiveRecording>,
}

impl RecorderResource {
    pub fn new(backend: Arc<dyn RecorderBackend>) -> Self {
        Self {
            backend,
            active: None,
        }
    }

    /// Whether a recording is in flight (finalizing counts as active).
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Start recording the given capture stream.
    pub async fn start(
        &mut self,
        handle: &CaptureHandle,
        mime_preferences: &[String],
        timeslice: Duration,
    ) -> Result<(), RecorderError> {
        if let Some(active) = &self.active {
            return Err(if active.finalizing {
                RecorderError::FinalizePending
            } else {
                RecorderError::AlreadyRecording
            });
        }
        if !handle.is_open() {
            return Err(RecorderError::NoActiveStream);
        }

        let preferred = select_mime_type(self.backend.as_ref(), mime_preferences);
        let tap = handle.frames();
        let session = self
            .backend
            .begin(tap, preferred.as_deref(), timeslice)
            .await?;
        let mime_type = session.mime_type().to_string();

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let (stop_tx, stop_rx) = watch::channel(false);
        let collector = tokio::spawn(collect_chunks(session, chunks.clone(), stop_rx));

        tracing::info!(
            "Recording started ({}, {}ms timeslices)",
            mime_type,
            timeslice.as_millis()
        );
        self.active = Some(ActiveRecording {
            mime_type,
            chunks,
            stop_tx,
            collector,
            finalizing: false,
        });
        Ok(())
    }

    /// Finalize the in-flight recording into a clip.
    ///
    /// Asynchronous by design: the caller must await completion before
    /// releasing the tapped capture stream. Calling while idle is a no-op.
    pub async fn stop(&mut self) -> Result<Option<Clip>, RecorderError> {
        let joined = {
            let active = match self.active.as_mut() {
                None => return Ok(None),
                Some(active) if active.finalizing => return Ok(None),
                Some(active) => active,
            };
            active.finalizing = true;
            let _ = active.stop_tx.send(true);
            (&mut active.collector).await
        };

        let Some(active) = self.active.take() else {
            return Ok(None);
        };
        let finalized = match joined {
            Ok(result) => result,
            Err(join_err) => Err(RecorderError::Encoder(format!(
                "collector task failed: {join_err}"
            ))),
        }?;

        let mut chunks = std::mem::take(&mut *active.chunks.lock());
        chunks.extend(finalized.trailing_chunks);
        let clip = Clip::assemble(chunks, active.mime_type, finalized.duration_seconds);

        tracing::info!(
            "Recording finalized: {} bytes, {:.2}s ({})",
            clip.byte_len(),
            clip.duration_seconds(),
            clip.mime_type()
        );
        Ok(Some(clip))
    }

    /// Teardown variant of [`stop`](Self::stop): drains the collector and
    /// discards whatever was buffered. Best-effort; errors are logged.
    pub async fn abort(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        let _ = active.stop_tx.send(true);
        match (&mut active.collector).await {
            Ok(Ok(_)) | Ok(Err(_)) => {}
            Err(join_err) => tracing::warn!("Recorder collector task failed: {join_err}"),
        }
        let discarded = active.chunks.lock().len();
        tracing::info!("Recording aborted, discarded {} buffered chunk(s)", discarded);
    }
}

async fn collect_chunks(
    mut session: Box<dyn RecorderSession>,
    buffer: Arc<Mutex<Vec<MediaChunk>>>,
    mut stop_rx: watch::Receiver<bool>,
) -> Result<FinalizedMedia, RecorderError> {
    loop {
        tokio::select! {
            biased;
            // Err means the stop sender is gone, which also ends recording.
            _ = stop_rx.changed() => break,
            chunk = session.next_chunk() => match chunk {
                Some(chunk) => buffer.lock().push(chunk),
                None => break,
            },
        }
    }
    session.finalize().await
}

/// Pick the first encoding the runtime supports, in preference order.
///
/// Returns `None` when nothing matches, deferring to the backend default;
/// the fallback is non-fatal and never surfaced to the user.
fn select_mime_type(backend: &dyn RecorderBackend, preferences: &[String]) -> Option<String> {
    for mime_type in preferences {
        if backend.supports_mime(mime_type) {
            return Some(mime_type.clone());
        }
    }
    tracing::debug!("No preferred encoding supported, deferring to backend default");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubBackend {
        supported: Vec<&'static str>,
    }

    #[async_trait]
    impl RecorderBackend for StubBackend {
        fn supports_mime(&self, mime_type: &str) -> bool {
            self.supported.contains(&mime_type)
        }

        async fn begin(
            &self,
            _tap: broadcast::Receiver<VideoFrame>,
            _mime_type: Option<&str>,
            _timeslice: Duration,
        ) -> Result<Box<dyn RecorderSession>, RecorderError> {
            unreachable!("mime selection tests never begin a session")
        }
    }

    fn prefs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_mime_prefers_first_supported() {
        let backend = StubBackend {
            supported: vec!["video/webm;codecs=vp8", "video/webm"],
        };
        let picked = select_mime_type(
            &backend,
            &prefs(&["video/webm;codecs=vp9", "video/webm;codecs=vp8", "video/webm"]),
        );
        assert_eq!(picked.as_deref(), Some("video/webm;codecs=vp8"));
    }

    #[test]
    fn test_select_mime_falls_back_to_backend_default() {
        let backend = StubBackend { supported: vec![] };
        let picked = select_mime_type(&backend, &prefs(&["video/webm;codecs=vp9"]));
        assert!(picked.is_none());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_a_noop() {
        let mut recorder = RecorderResource::new(Arc::new(StubBackend { supported: vec![] }));
        assert!(matches!(recorder.stop().await, Ok(None)));
        recorder.abort().await;
        assert!(!recorder.is_active());
    }
}
