//! Error types and handling
//!
//! Per-subsystem error enums plus the session-level aggregate returned by
//! [`SessionController`](crate::session::SessionController) operations.

use thiserror::Error;

use crate::session::SessionState;

/// Camera acquisition failures raised by the platform capture layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("camera capture requires a secure context")]
    NotSecureContext,

    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device available")]
    NoDevice,

    #[error("camera error: {0}")]
    Unknown(String),
}

/// Recorder state violations and encoder failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("recorder is already running")]
    AlreadyRecording,

    #[error("no active capture stream to record")]
    NoActiveStream,

    #[error("a previous recording is still finalizing")]
    FinalizePending,

    #[error("encoder error: {0}")]
    Encoder(String),
}

/// Pose estimation engine failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimationError {
    #[error("pose engine failed to load: {0}")]
    EngineLoad(String),

    #[error("pose engine failure: {0}")]
    Engine(String),
}

/// Session-level error type
///
/// Aggregates subsystem failures and rejects operations invoked in a state
/// they are not defined for.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error("{op} is not valid while the session is {state:?}")]
    InvalidState {
        op: &'static str,
        state: SessionState,
    },
}

/// Result type alias using SessionError
pub type SessionResult<T> = Result<T, SessionError>;
