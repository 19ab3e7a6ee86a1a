//! Hand landmark types produced by the external pose estimator.
//!
//! Each detected hand is a fixed set of 21 points in normalized image
//! coordinates. Replay files store one frame per line: a JSON array of
//! hands, each hand an array of `{x, y, z}` objects.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Number of landmarks in one hand skeleton.
pub const LANDMARK_COUNT: usize = 21;

/// Anatomical landmark indices.
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const PALM_CENTER: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
}

/// One landmark in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Image-plane position.
    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Returned when a landmark list does not contain exactly 21 points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {LANDMARK_COUNT} landmarks per hand, got {0}")]
pub struct LandmarkCountError(pub usize);

/// The 21 landmarks of one detected hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Landmark at an anatomical index (see [`index`]).
    ///
    /// # Panics
    /// Panics when `idx >= 21`; callers use the constants in [`index`].
    pub fn point(&self, idx: usize) -> Landmark {
        self.points[idx]
    }

    /// Image-plane position of a landmark.
    pub fn xy(&self, idx: usize) -> Vec2 {
        self.points[idx].xy()
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    /// Mutable access for building synthetic hands.
    pub fn set(&mut self, idx: usize, landmark: Landmark) {
        self.points[idx] = landmark;
    }

    /// Shift every landmark by the same image-plane offset.
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        let mut points = self.points;
        for p in &mut points {
            p.x += dx;
            p.y += dy;
        }
        Self { points }
    }
}

impl TryFrom<Vec<Landmark>> for HandLandmarks {
    type Error = LandmarkCountError;

    fn try_from(value: Vec<Landmark>) -> Result<Self, Self::Error> {
        let len = value.len();
        let points: [Landmark; LANDMARK_COUNT] =
            value.try_into().map_err(|_| LandmarkCountError(len))?;
        Ok(Self { points })
    }
}

impl From<HandLandmarks> for Vec<Landmark> {
    fn from(value: HandLandmarks) -> Self {
        value.points.to_vec()
    }
}

/// Parse landmark frames from JSONL content (one JSON array of hands per
/// line). Blank lines and lines starting with `#` are skipped.
pub fn parse_frames(jsonl: &str) -> Result<Vec<Vec<HandLandmarks>>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}
