//! Per-frame processor output.

use serde::{Deserialize, Serialize};

use crate::geometry::{Vec2, Vec3};
use crate::mode::GestureMode;

/// Immutable snapshot produced by the gesture processor for one frame.
///
/// Holds only owned values; nothing aliases processor state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutboundFrame {
    /// Horizontal rotation delta (sign-flipped for the mirrored camera).
    pub rot_dx: f64,

    /// Vertical rotation delta.
    pub rot_dy: f64,

    /// Change in inter-hand distance while zooming.
    pub zoom_delta: f64,

    /// Explode factor in `[0, 1]`.
    pub explode: f64,

    /// Authoritative mode for this frame.
    pub mode: GestureMode,

    /// `mode == Freeze`.
    pub freeze: bool,

    /// Number of hands observed.
    pub hands: usize,

    /// Single-hand shortcut gestures (hand 0).
    pub shortcuts: GestureShortcuts,

    /// Two-hand measurement gesture.
    pub measure: MeasureData,
}

/// Shortcut gesture results, evaluated on the first hand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureShortcuts {
    pub v_sign: bool,
    pub thumbs_up: bool,

    /// Both hands open with palms towards the camera.
    pub palm_menu: bool,

    /// Wrist-to-palm roll angle in radians.
    pub hand_roll: Option<f64>,

    /// Unit wrist-to-index direction, present while the index is raised.
    pub pointer: Option<Vec3>,

    /// Kalman-filtered thumb-index distance.
    pub pinch_distance: Option<f64>,
}

/// Measurement gesture state, reported independently per hand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasureData {
    /// Either hand shows the measure gesture.
    pub active: bool,
    pub has_left_gesture: bool,
    pub has_right_gesture: bool,

    /// Index/pinky midpoint of hand 0.
    pub pos1: Option<Vec2>,

    /// Index/pinky midpoint of hand 1.
    pub pos2: Option<Vec2>,
}
