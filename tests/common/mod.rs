//! Fake platform collaborators for integration tests.
//!
//! Each fake counts acquisitions and releases so tests can observe the
//! resource invariants from outside the controller.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use formcheck::{
    CaptureBackend, CaptureConstraints, CaptureStream, Clip, ClipPlayer, DeviceError, EngineConfig,
    EngineLoader, EstimationError, FinalizedMedia, FrameResult, Landmark, MediaChunk,
    OverlayRenderer, Platform, PlayerFactory, PoseEngine, RecorderBackend, RecorderError,
    RecorderSession, SessionConfig, SessionController, SessionMode, VideoFrame,
};

/// Counters shared by every stream a [`FakeCapture`] opens.
#[derive(Default)]
pub struct CaptureStats {
    pub open_streams: AtomicUsize,
    pub max_open: AtomicUsize,
    pub total_opened: AtomicUsize,
}

/// Capture backend that pumps synthetic frames every 2 ms.
pub struct FakeCapture {
    pub stats: Arc<CaptureStats>,
    fail_with: Mutex<Option<DeviceError>>,
}

impl FakeCapture {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::new(CaptureStats::default()),
            fail_with: Mutex::new(None),
        })
    }

    /// Make every following acquisition fail until cleared with `None`.
    pub fn set_failure(&self, error: Option<DeviceError>) {
        *self.fail_with.lock() = error;
    }
}

#[async_trait]
impl CaptureBackend for FakeCapture {
    async fn open_stream(
        &self,
        _constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureStream>, DeviceError> {
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(error);
        }

        let open = self.stats.open_streams.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_open.fetch_max(open, Ordering::SeqCst);
        self.stats.total_opened.fetch_add(1, Ordering::SeqCst);

        let (tx, _) = broadcast::channel(32);
        let stopped = Arc::new(AtomicBool::new(false));

        let pump_tx = tx.clone();
        let pump_stopped = stopped.clone();
        tokio::spawn(async move {
            let mut index = 0u64;
            let mut interval = tokio::time::interval(Duration::from_millis(2));
            loop {
                interval.tick().await;
                if pump_stopped.load(Ordering::SeqCst) {
                    break;
                }
                let frame = VideoFrame {
                    index,
                    timestamp_seconds: index as f64 / 30.0,
                    width: 1280,
                    height: 720,
                    data: Arc::new(Vec::new()),
                };
                let _ = pump_tx.send(frame);
                index += 1;
            }
        });

        Ok(Box::new(FakeStream {
            tx: Some(tx),
            stopped,
            stats: self.stats.clone(),
        }))
    }
}

pub struct FakeStream {
    tx: Option<broadcast::Sender<VideoFrame>>,
    stopped: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
}

impl CaptureStream for FakeStream {
    fn frames(&self) -> broadcast::Receiver<VideoFrame> {
        match &self.tx {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(1);
                drop(tx);
                rx
            }
        }
    }

    fn stop_tracks(&mut self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.tx = None;
        self.stats.open_streams.fetch_sub(1, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }
}

/// Recorder backend emitting one chunk per tapped frame.
pub struct FakeRecorder {
    pub supported: Mutex<Vec<String>>,
    pub clip_duration_seconds: Mutex<f64>,
    pub begun: Arc<AtomicUsize>,
    pub finalized: Arc<AtomicUsize>,
}

impl FakeRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            supported: Mutex::new(vec![
                "video/webm;codecs=vp9".to_string(),
                "video/webm".to_string(),
            ]),
            clip_duration_seconds: Mutex::new(10.0),
            begun: Arc::new(AtomicUsize::new(0)),
            finalized: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl RecorderBackend for FakeRecorder {
    fn supports_mime(&self, mime_type: &str) -> bool {
        self.supported.lock().iter().any(|m| m == mime_type)
    }

    async fn begin(
        &self,
        tap: broadcast::Receiver<VideoFrame>,
        mime_type: Option<&str>,
        _timeslice: Duration,
    ) -> Result<Box<dyn RecorderSession>, RecorderError> {
        self.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRecorderSession {
            mime_type: mime_type.unwrap_or("video/fake-default").to_string(),
            tap,
            duration_seconds: *self.clip_duration_seconds.lock(),
            finalized: self.finalized.clone(),
        }))
    }
}

struct FakeRecorderSession {
    mime_type: String,
    tap: broadcast::Receiver<VideoFrame>,
    duration_seconds: f64,
    finalized: Arc<AtomicUsize>,
}

#[async_trait]
impl RecorderSession for FakeRecorderSession {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn next_chunk(&mut self) -> Option<MediaChunk> {
        loop {
            match self.tap.recv().await {
                Ok(frame) => {
                    return Some(MediaChunk {
                        data: vec![frame.index as u8; 4],
                    })
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    async fn finalize(self: Box<Self>) -> Result<FinalizedMedia, RecorderError> {
        self.finalized.fetch_add(1, Ordering::SeqCst);
        Ok(FinalizedMedia {
            trailing_chunks: Vec::new(),
            duration_seconds: self.duration_seconds,
        })
    }
}

/// Engine loader that tracks how many engines are alive.
pub struct FakeEngineLoader {
    pub alive: Arc<AtomicUsize>,
    pub loads: Arc<AtomicUsize>,
    pub fail: Arc<AtomicBool>,
}

impl FakeEngineLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            alive: Arc::new(AtomicUsize::new(0)),
            loads: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
        })
    }
}

#[async_trait]
impl EngineLoader for FakeEngineLoader {
    async fn load(&self, _config: &EngineConfig) -> Result<Box<dyn PoseEngine>, EstimationError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EstimationError::EngineLoad("model unavailable".into()));
        }
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.alive.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeEngine {
            alive: self.alive.clone(),
        }))
    }
}

struct FakeEngine {
    alive: Arc<AtomicUsize>,
}

#[async_trait]
impl PoseEngine for FakeEngine {
    async fn detect(
        &mut self,
        _frame: &VideoFrame,
    ) -> Result<Option<Vec<Landmark>>, EstimationError> {
        Ok(Some(vec![
            Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0,
                visibility: 1.0,
            };
            33
        ]))
    }

    fn close(&mut self) {
        self.alive.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Observable state of one fake player instance.
#[derive(Default)]
pub struct PlayerProbe {
    pub loaded: AtomicBool,
    pub playing: AtomicBool,
}

struct FakePlayer {
    probe: Arc<PlayerProbe>,
    duration_seconds: f64,
    playhead: f64,
    next_frame_index: u64,
}

#[async_trait]
impl ClipPlayer for FakePlayer {
    async fn load(&mut self, clip: &Clip) {
        self.duration_seconds = clip.duration_seconds();
        self.probe.loaded.store(true, Ordering::SeqCst);
    }

    fn play(&mut self) {
        self.probe.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&mut self) {
        self.probe.playing.store(false, Ordering::SeqCst);
    }

    fn set_position(&mut self, seconds: f64) {
        self.playhead = seconds;
    }

    fn position(&self) -> f64 {
        self.playhead
    }

    fn duration(&self) -> f64 {
        self.duration_seconds
    }

    async fn current_frame(&mut self) -> Option<VideoFrame> {
        if !self.probe.loaded.load(Ordering::SeqCst) {
            return None;
        }
        let index = self.next_frame_index;
        self.next_frame_index += 1;
        Some(VideoFrame::empty(index, self.playhead))
    }

    fn unload(&mut self) {
        self.probe.loaded.store(false, Ordering::SeqCst);
        self.duration_seconds = 0.0;
    }
}

/// Factory exposing a probe per created player.
#[derive(Default)]
pub struct FakePlayerFactory {
    pub probes: Mutex<Vec<Arc<PlayerProbe>>>,
}

impl FakePlayerFactory {
    pub fn last_probe(&self) -> Option<Arc<PlayerProbe>> {
        self.probes.lock().last().cloned()
    }
}

impl PlayerFactory for FakePlayerFactory {
    fn create(&self) -> Box<dyn ClipPlayer> {
        let probe = Arc::new(PlayerProbe::default());
        self.probes.lock().push(probe.clone());
        Box::new(FakePlayer {
            probe,
            duration_seconds: 0.0,
            playhead: 0.0,
            next_frame_index: 0,
        })
    }
}

/// Renderer recording every frame index it was handed.
#[derive(Default)]
pub struct CollectingRenderer {
    pub frame_indices: Mutex<Vec<u64>>,
}

impl OverlayRenderer for CollectingRenderer {
    fn render(&self, result: &FrameResult) {
        self.frame_indices.lock().push(result.frame.index);
    }
}

/// One fully-faked platform plus a controller factory.
pub struct TestRig {
    pub capture: Arc<FakeCapture>,
    pub recorder: Arc<FakeRecorder>,
    pub engine: Arc<FakeEngineLoader>,
    pub players: Arc<FakePlayerFactory>,
    pub renderer: Arc<CollectingRenderer>,
}

impl TestRig {
    pub fn new() -> Self {
        Self {
            capture: FakeCapture::new(),
            recorder: FakeRecorder::new(),
            engine: FakeEngineLoader::new(),
            players: Arc::new(FakePlayerFactory::default()),
            renderer: Arc::new(CollectingRenderer::default()),
        }
    }

    pub fn controller(&self, mode: SessionMode) -> SessionController {
        let mut config = SessionConfig::default();
        config.frame_interval_ms = 1;
        SessionController::new(
            config,
            mode,
            Platform {
                capture: self.capture.clone(),
                recorder: self.recorder.clone(),
                engine: self.engine.clone(),
                player: self.players.clone(),
                renderer: self.renderer.clone(),
            },
        )
    }

    pub fn open_streams(&self) -> usize {
        self.capture.stats.open_streams.load(Ordering::SeqCst)
    }

    pub fn engines_alive(&self) -> usize {
        self.engine.alive.load(Ordering::SeqCst)
    }
}

/// Let spawned loops and pumps make progress.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
