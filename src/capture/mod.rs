//! Camera capture layer
//!
//! Frame type, platform seams, and the acquire/release resource that keeps
//! at most one camera stream open at a time.

pub mod frame;
pub mod resource;
pub mod traits;

pub use frame::VideoFrame;
pub use resource::{CaptureHandle, CaptureResource};
pub use traits::{CaptureBackend, CaptureConstraints, CaptureStream};
