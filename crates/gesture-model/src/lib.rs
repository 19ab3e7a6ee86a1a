//! Holo-Control Gesture Model
//!
//! Defines the data contracts shared by the pipeline and the stream server:
//! - **Landmarks:** 21-point hand skeletons from the pose estimator
//! - **Modes:** the mutually exclusive control modes and their channels
//! - **Frames:** the immutable per-frame result of the gesture processor
//! - **Wire:** the versioned JSON protocol spoken to renderer clients
//!
//! All coordinates are normalized to `[0.0, 1.0]` relative to the camera
//! image, with `y` growing downwards.

pub mod frame;
pub mod geometry;
pub mod landmark;
pub mod mode;
pub mod wire;

pub use frame::*;
pub use geometry::*;
pub use landmark::*;
pub use mode::*;
pub use wire::*;
