//! Recording layer
//!
//! Encoder seams, the chunk-buffering recorder resource, and the immutable
//! clip it produces.

pub mod clip;
pub mod resource;

pub use clip::{Clip, ClipInfo, MediaChunk};
pub use resource::{FinalizedMedia, RecorderBackend, RecorderResource, RecorderSession};
