//! Session state management
//!
//! The session mode, the state machine's tagged states, and the snapshot
//! the UI layer reads.

use serde::{Deserialize, Serialize};

/// How the user wants to track: against the live camera, or by recording a
/// clip and reviewing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionMode {
    Live,
    RecordReview,
}

impl Default for SessionMode {
    fn default() -> Self {
        Self::Live
    }
}

/// Current state of the tracking session.
///
/// One tagged state instead of scattered flags, so impossible combinations
/// (recording while in live mode, analyzing without a clip) cannot be
/// represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// Nothing acquired.
    Idle,
    /// A start operation is acquiring resources.
    Starting,
    /// Live camera frames are being estimated.
    Tracking,
    /// Camera preview is up, not yet recording.
    Previewing,
    /// The preview stream is being recorded.
    Recording,
    /// A finished clip is attached for review.
    Recorded,
    /// Clip playback frames are being estimated.
    Analyzing,
    /// Resources released by an explicit stop.
    Stopped,
    /// A start operation failed; see the session's error message.
    Error,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Snapshot of the session exposed to the UI layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub mode: SessionMode,

    pub state: SessionState,

    /// Human-readable failure description while `state` is
    /// [`SessionState::Error`].
    pub error_message: Option<String>,
}

impl Session {
    /// Fresh idle session in the given mode.
    pub fn idle(mode: SessionMode) -> Self {
        Self {
            mode,
            state: SessionState::Idle,
            error_message: None,
        }
    }
}
