//! Session layer
//!
//! The state machine, the generation-token frame loop, and the controller
//! that owns every resource.

pub mod controller;
pub(crate) mod frame_loop;
pub mod state;

pub use controller::{Platform, SessionController, SessionEvent};
pub use state::{Session, SessionMode, SessionState};
