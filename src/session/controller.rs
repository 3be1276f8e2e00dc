//! Session controller
//!
//! Owns every resource of a tracking session and enforces the lifecycle
//! state machine across mode switches, start/stop actions, and failures.
//! All release logic is centralized in one teardown path so the resource
//! invariants hold under arbitrary operation sequences.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};

use crate::capture::resource::{CaptureHandle, CaptureResource};
use crate::capture::traits::CaptureBackend;
use crate::config::SessionConfig;
use crate::error::{RecorderError, SessionError, SessionResult};
use crate::estimation::engine::EngineLoader;
use crate::estimation::pipeline::EstimationPipeline;
use crate::playback::{PlaybackPosition, PlaybackResource, PlayerFactory};
use crate::recorder::clip::{Clip, ClipInfo};
use crate::recorder::resource::{RecorderBackend, RecorderResource};
use crate::render::OverlayRenderer;
use crate::session::frame_loop::{spawn_frame_loop, FrameSource};
use crate::session::state::{Session, SessionMode, SessionState};

/// The platform collaborators a session is wired to.
#[derive(Clone)]
pub struct Platform {
    pub capture: Arc<dyn CaptureBackend>,
    pub recorder: Arc<dyn RecorderBackend>,
    pub engine: Arc<dyn EngineLoader>,
    pub player: Arc<dyn PlayerFactory>,
    pub renderer: Arc<dyn OverlayRenderer>,
}

/// Events emitted as the session moves through its lifecycle.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session entered a new state.
    StateChanged(SessionState),
    /// A recording finalized into a clip.
    ClipFinalized(ClipInfo),
    /// The attached clip was discarded.
    ClipDiscarded,
    /// A start operation failed.
    Error(String),
}

/// Coordinates camera capture, recording, playback, and estimation for one
/// tracking session.
pub struct SessionController {
    config: SessionConfig,
    session: Session,

    capture: CaptureResource,
    recorder: RecorderResource,

    /// The single open camera stream, when one exists.
    handle: Option<CaptureHandle>,

    /// Shared with the frame loop; replaced wholesale once closed.
    pipeline: Arc<Mutex<EstimationPipeline>>,

    /// Attached while a clip exists in record-review mode.
    playback: Option<Arc<Mutex<PlaybackResource>>>,

    /// Last finalized recording; released on supersede or discard.
    clip: Option<Clip>,

    /// Generation counter for frame loops. Bumping it invalidates every
    /// previously issued loop token.
    generation: Arc<AtomicU64>,

    engine_loader: Arc<dyn EngineLoader>,
    player_factory: Arc<dyn PlayerFactory>,
    renderer: Arc<dyn OverlayRenderer>,

    /// Event broadcaster
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    /// Create a controller in the given mode, wired to the platform.
    pub fn new(config: SessionConfig, mode: SessionMode, platform: Platform) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        let pipeline = EstimationPipeline::new(platform.engine.clone(), config.engine.clone());
        Self {
            session: Session::idle(mode),
            capture: CaptureResource::new(platform.capture),
            recorder: RecorderResource::new(platform.recorder),
            handle: None,
            pipeline: Arc::new(Mutex::new(pipeline)),
            playback: None,
            clip: None,
            generation: Arc::new(AtomicU64::new(0)),
            engine_loader: platform.engine,
            player_factory: platform.player,
            renderer: platform.renderer,
            event_tx,
            config,
        }
    }

    /// Snapshot for the UI layer.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn mode(&self) -> SessionMode {
        self.session.mode
    }

    pub fn error_message(&self) -> Option<&str> {
        self.session.error_message.as_deref()
    }

    /// Metadata of the attached clip, if any.
    pub fn clip_info(&self) -> Option<ClipInfo> {
        self.clip.as_ref().map(Clip::info)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Switch the session mode.
    ///
    /// Always performs a full teardown and resets to `Idle`, whatever was
    /// in flight. The attached clip (if any) survives until superseded or
    /// discarded.
    pub async fn select_mode(&mut self, mode: SessionMode) {
        tracing::info!("Selecting mode {:?}", mode);
        self.teardown().await;
        self.session = Session::idle(mode);
        let _ = self
            .event_tx
            .send(SessionEvent::StateChanged(SessionState::Idle));
    }

    /// Start live tracking: camera in, estimated landmarks out.
    pub async fn start_live(&mut self) -> SessionResult<()> {
        let state = self.session.state;
        if self.session.mode != SessionMode::Live || !Self::can_start_from(state) {
            return Err(SessionError::InvalidState {
                op: "start_live",
                state,
            });
        }

        tracing::info!("Starting live tracking");
        self.teardown().await;
        self.session.error_message = None;
        self.set_state(SessionState::Starting);

        let handle = match self.capture.acquire(&self.config.capture).await {
            Ok(handle) => handle,
            Err(e) => return self.abort_start("start_live", e.into()).await,
        };
        let tap = handle.frames();
        self.handle = Some(handle);

        self.ensure_open_pipeline().await;
        let ensure_result = self.pipeline.lock().await.ensure_engine().await;
        if let Err(e) = ensure_result {
            return self.abort_start("start_live", e.into()).await;
        }

        let token = self.bump_token();
        spawn_frame_loop(
            token,
            self.generation.clone(),
            FrameSource::Camera(tap),
            self.pipeline.clone(),
            self.renderer.clone(),
            self.frame_interval(),
        );
        self.set_state(SessionState::Tracking);
        Ok(())
    }

    /// Stop live tracking. Best-effort; never fails.
    pub async fn stop_live(&mut self) {
        if self.session.state != SessionState::Tracking {
            return;
        }
        tracing::info!("Stopping live tracking");
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.pipeline.lock().await.close();
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
        self.set_state(SessionState::Stopped);
    }

    /// Bring up the camera preview for record-review mode. No estimation
    /// runs yet.
    pub async fn start_preview(&mut self) -> SessionResult<()> {
        let state = self.session.state;
        if self.session.mode != SessionMode::RecordReview || !Self::can_start_from(state) {
            return Err(SessionError::InvalidState {
                op: "start_preview",
                state,
            });
        }

        tracing::info!("Starting camera preview");
        self.teardown().await;
        self.session.error_message = None;
        self.set_state(SessionState::Starting);

        match self.capture.acquire(&self.config.capture).await {
            Ok(handle) => {
                self.handle = Some(handle);
                self.set_state(SessionState::Previewing);
                Ok(())
            }
            Err(e) => self.abort_start("start_preview", e.into()).await,
        }
    }

    /// Stop the preview, aborting any in-flight recording. Best-effort.
    pub async fn stop_preview(&mut self) {
        if !matches!(
            self.session.state,
            SessionState::Previewing | SessionState::Recording
        ) {
            return;
        }
        tracing::info!("Stopping camera preview");
        // The recorder taps the stream, so it goes down first.
        self.recorder.abort().await;
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
        self.set_state(SessionState::Stopped);
    }

    /// Start recording the preview stream.
    pub async fn start_recording(&mut self) -> SessionResult<()> {
        let state = self.session.state;
        if state != SessionState::Previewing {
            return Err(SessionError::InvalidState {
                op: "start_recording",
                state,
            });
        }
        let timeslice = Duration::from_millis(self.config.timeslice_ms);
        let started = match self.handle.as_ref() {
            Some(handle) => {
                self.recorder
                    .start(handle, &self.config.mime_preferences, timeslice)
                    .await
            }
            None => Err(RecorderError::NoActiveStream),
        };
        if let Err(e) = started {
            return self.abort_start("start_recording", e.into()).await;
        }
        self.set_state(SessionState::Recording);
        Ok(())
    }

    /// Finalize the recording into a clip and attach it for review.
    ///
    /// Awaits the recorder's finalize to completion; only then is the
    /// tapped camera stream released. Not recording is a no-op.
    pub async fn stop_recording(&mut self) -> SessionResult<()> {
        if self.session.state != SessionState::Recording {
            return Ok(());
        }
        tracing::info!("Stopping recording");

        match self.recorder.stop().await {
            Ok(Some(clip)) => {
                if let Some(mut handle) = self.handle.take() {
                    handle.release();
                }
                let info = clip.info();
                if let Some(previous) = self.clip.replace(clip) {
                    tracing::info!(
                        "Superseding clip {} ({} bytes released)",
                        previous.id(),
                        previous.byte_len()
                    );
                }
                self.attach_playback().await;
                let _ = self.event_tx.send(SessionEvent::ClipFinalized(info));
                self.set_state(SessionState::Recorded);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                let error = SessionError::from(e);
                tracing::warn!("stop_recording failed: {}", error);
                self.teardown().await;
                self.fail(error.to_string());
                Err(error)
            }
        }
    }

    /// Run the estimation loop over the attached clip's playback.
    pub async fn start_analysis(&mut self) -> SessionResult<()> {
        let state = self.session.state;
        let recoverable = matches!(state, SessionState::Recorded | SessionState::Error);
        if self.clip.is_none() || !recoverable {
            return Err(SessionError::InvalidState {
                op: "start_analysis",
                state,
            });
        }

        tracing::info!("Starting clip analysis");
        if state == SessionState::Error {
            self.teardown().await;
            self.session.error_message = None;
        }
        if self.playback.is_none() {
            self.attach_playback().await;
        }
        let Some(playback) = self.playback.clone() else {
            return Err(SessionError::InvalidState {
                op: "start_analysis",
                state,
            });
        };

        self.ensure_open_pipeline().await;
        let ensure_result = self.pipeline.lock().await.ensure_engine().await;
        if let Err(e) = ensure_result {
            return self.abort_start("start_analysis", e.into()).await;
        }

        let token = self.bump_token();
        playback.lock().await.play();
        spawn_frame_loop(
            token,
            self.generation.clone(),
            FrameSource::Playback(playback),
            self.pipeline.clone(),
            self.renderer.clone(),
            self.frame_interval(),
        );
        self.set_state(SessionState::Analyzing);
        Ok(())
    }

    /// Stop the analysis loop, keeping the clip attached. Never fails.
    pub async fn stop_analysis(&mut self) {
        if self.session.state != SessionState::Analyzing {
            return;
        }
        tracing::info!("Stopping clip analysis");
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(playback) = &self.playback {
            playback.lock().await.pause();
        }
        self.set_state(SessionState::Recorded);
    }

    /// Release the attached clip and its backing storage. Never fails.
    pub async fn discard_clip(&mut self) {
        if self.clip.is_none() {
            return;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(playback) = self.playback.take() {
            playback.lock().await.detach();
        }
        if let Some(clip) = self.clip.take() {
            tracing::info!(
                "Discarded clip {} ({} bytes released)",
                clip.id(),
                clip.byte_len()
            );
        }
        let _ = self.event_tx.send(SessionEvent::ClipDiscarded);

        // A discard issued while the camera is mid-flight only releases the
        // storage; every other state collapses back to Idle.
        if !matches!(
            self.session.state,
            SessionState::Starting
                | SessionState::Tracking
                | SessionState::Previewing
                | SessionState::Recording
        ) {
            self.session.error_message = None;
            self.set_state(SessionState::Idle);
        }
    }

    /// Resume playback of the attached clip without estimation.
    pub async fn play_clip(&mut self) {
        if let Some(playback) = &self.playback {
            playback.lock().await.play();
        }
    }

    /// Pause playback of the attached clip.
    pub async fn pause_clip(&mut self) {
        if let Some(playback) = &self.playback {
            playback.lock().await.pause();
        }
    }

    /// Seek the attached clip to a fraction of its duration.
    ///
    /// Permitted while analyzing; the loop picks up whatever frame is
    /// current after the seek settles.
    pub async fn seek(&mut self, fraction: f64) -> Option<PlaybackPosition> {
        let playback = self.playback.as_ref()?;
        let mut playback = playback.lock().await;
        playback.seek(fraction);
        Some(playback.position())
    }

    /// Current playhead of the attached clip.
    pub async fn playback_position(&self) -> Option<PlaybackPosition> {
        let playback = self.playback.as_ref()?;
        let position = playback.lock().await.position();
        Some(position)
    }

    /// The single teardown path.
    ///
    /// Invoked by every mode switch and every failed start, in a fixed
    /// order: invalidate the frame loop, wind down the recorder, close the
    /// estimation pipeline, release the camera, detach playback. The
    /// recorder strictly precedes the capture release because it taps that
    /// stream. Secondary failures are swallowed; releasing must finish.
    async fn teardown(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.recorder.abort().await;
        self.pipeline.lock().await.close();
        if let Some(mut handle) = self.handle.take() {
            handle.release();
        }
        if let Some(playback) = self.playback.take() {
            playback.lock().await.detach();
        }
    }

    /// Tear down after a failed start and surface the error state.
    async fn abort_start(&mut self, op: &'static str, error: SessionError) -> SessionResult<()> {
        tracing::warn!("{} failed: {}", op, error);
        self.teardown().await;
        self.fail(error.to_string());
        Err(error)
    }

    fn fail(&mut self, message: String) {
        self.session.error_message = Some(message.clone());
        self.set_state(SessionState::Error);
        let _ = self.event_tx.send(SessionEvent::Error(message));
    }

    fn set_state(&mut self, state: SessionState) {
        if self.session.state == state {
            return;
        }
        tracing::debug!("Session state {:?} -> {:?}", self.session.state, state);
        self.session.state = state;
        let _ = self.event_tx.send(SessionEvent::StateChanged(state));
    }

    fn can_start_from(state: SessionState) -> bool {
        matches!(
            state,
            SessionState::Idle | SessionState::Stopped | SessionState::Error
        )
    }

    /// Claim the next loop token, invalidating every earlier one.
    fn bump_token(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the pipeline if a previous teardown closed it. Stale loops
    /// keep their handle on the closed instance and feed into the void.
    async fn ensure_open_pipeline(&mut self) {
        let open = self.pipeline.lock().await.is_open();
        if !open {
            self.pipeline = Arc::new(Mutex::new(EstimationPipeline::new(
                self.engine_loader.clone(),
                self.config.engine.clone(),
            )));
        }
    }

    /// Attach the current clip for review, replacing any previous player.
    async fn attach_playback(&mut self) {
        if let Some(previous) = self.playback.take() {
            previous.lock().await.detach();
        }
        let Some(clip) = self.clip.as_ref() else {
            return;
        };
        let player = self.player_factory.create();
        let playback = PlaybackResource::attach(player, clip).await;
        self.playback = Some(Arc::new(Mutex::new(playback)));
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.config.frame_interval_ms.max(1))
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        // Orphan any loop still running; it observes the bump on its next
        // iteration and exits.
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}
