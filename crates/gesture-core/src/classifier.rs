//! Stateless gesture predicates over landmark geometry.
//!
//! Image space has `y` growing downwards, so "up" means a smaller `y`.
//! Every predicate reads one frame of one hand (or two hands for the
//! bimanual predicates) and keeps no state.

use holo_gesture_model::landmark::index;
use holo_gesture_model::{HandLandmarks, Vec2, Vec3};

/// `(tip, pip)` index pairs for the four non-thumb fingers.
const FINGERS: [(usize, usize); 4] = [
    (index::INDEX_TIP, index::INDEX_PIP),
    (index::MIDDLE_TIP, index::MIDDLE_PIP),
    (index::RING_TIP, index::RING_PIP),
    (index::PINKY_TIP, index::PINKY_PIP),
];

/// Minimum height of the palm center above the wrist for the palm to count
/// as facing the camera.
pub const PALM_FACING_MARGIN: f64 = 0.1;

/// Default thumb-index pinch distance.
pub const DEFAULT_PINCH_THRESHOLD: f64 = 0.08;

/// A finger is extended when its tip is above its PIP joint.
pub fn finger_extended(hand: &HandLandmarks, tip: usize, pip: usize) -> bool {
    hand.point(tip).y < hand.point(pip).y
}

/// Number of extended non-thumb fingers.
pub fn extended_fingers(hand: &HandLandmarks) -> usize {
    FINGERS
        .iter()
        .filter(|(tip, pip)| finger_extended(hand, *tip, *pip))
        .count()
}

/// All four non-thumb fingers curled.
pub fn fist_closed(hand: &HandLandmarks) -> bool {
    extended_fingers(hand) == 0
}

/// At least three of the four non-thumb fingers extended.
pub fn hand_open(hand: &HandLandmarks) -> bool {
    extended_fingers(hand) >= 3
}

/// Thumb-tip to index-tip distance compared against `threshold`.
///
/// Returns the decision and the raw distance.
pub fn pinching(hand: &HandLandmarks, threshold: f64) -> (bool, f64) {
    let distance = hand
        .xy(index::THUMB_TIP)
        .distance(&hand.xy(index::INDEX_TIP));
    (distance < threshold, distance)
}

pub fn index_up(hand: &HandLandmarks) -> bool {
    finger_extended(hand, index::INDEX_TIP, index::INDEX_PIP)
}

/// Index and middle extended, ring and pinky curled.
pub fn v_sign(hand: &HandLandmarks) -> bool {
    finger_extended(hand, index::INDEX_TIP, index::INDEX_PIP)
        && finger_extended(hand, index::MIDDLE_TIP, index::MIDDLE_PIP)
        && !finger_extended(hand, index::RING_TIP, index::RING_PIP)
        && !finger_extended(hand, index::PINKY_TIP, index::PINKY_PIP)
}

/// Thumb tip above its IP joint with all four fingers curled.
pub fn thumbs_up(hand: &HandLandmarks) -> bool {
    hand.point(index::THUMB_TIP).y < hand.point(index::THUMB_IP).y && fist_closed(hand)
}

/// Index and pinky extended; middle and ring are not considered.
pub fn measure_gesture(hand: &HandLandmarks) -> bool {
    finger_extended(hand, index::INDEX_TIP, index::INDEX_PIP)
        && finger_extended(hand, index::PINKY_TIP, index::PINKY_PIP)
}

/// Open hand with the palm center well above the wrist.
pub fn palm_facing_camera(hand: &HandLandmarks) -> bool {
    hand_open(hand)
        && hand.point(index::PALM_CENTER).y <= hand.point(index::WRIST).y - PALM_FACING_MARGIN
}

/// Angle (radians) of the wrist → palm-center vector.
pub fn hand_roll_angle(hand: &HandLandmarks) -> f64 {
    let v = hand.xy(index::PALM_CENTER) - hand.xy(index::WRIST);
    v.y.atan2(v.x)
}

/// Unit 3-D direction from the wrist to the index tip.
pub fn pointer_direction(hand: &HandLandmarks) -> Vec3 {
    let wrist = hand.point(index::WRIST);
    let tip = hand.point(index::INDEX_TIP);
    Vec3::new(tip.x - wrist.x, tip.y - wrist.y, tip.z - wrist.z).normalized()
}

/// Midpoint of the index and pinky tips, the anchor of the measure gesture.
pub fn measure_point(hand: &HandLandmarks) -> Vec2 {
    hand.xy(index::INDEX_TIP)
        .midpoint(&hand.xy(index::PINKY_TIP))
}

/// Both palms facing the camera.
pub fn two_palms_menu(first: &HandLandmarks, second: &HandLandmarks) -> bool {
    palm_facing_camera(first) && palm_facing_camera(second)
}

/// One hand closed, the other open, in either assignment.
pub fn explode_gesture(first: &HandLandmarks, second: &HandLandmarks) -> bool {
    (fist_closed(first) && hand_open(second)) || (hand_open(first) && fist_closed(second))
}
