//! Gesture control modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The single authoritative control mode for a frame.
///
/// Exactly one mode is active at any instant; channel math for every other
/// mode is suppressed or decayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GestureMode {
    #[default]
    Idle,
    Rotate,
    Zoom,
    Explode,
    Freeze,
}

impl GestureMode {
    /// All modes in declaration order.
    pub const ALL: [GestureMode; 5] = [
        GestureMode::Idle,
        GestureMode::Rotate,
        GestureMode::Zoom,
        GestureMode::Explode,
        GestureMode::Freeze,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureMode::Idle => "IDLE",
            GestureMode::Rotate => "ROTATE",
            GestureMode::Zoom => "ZOOM",
            GestureMode::Explode => "EXPLODE",
            GestureMode::Freeze => "FREEZE",
        }
    }

    /// Dense index for fixed-size per-mode tables.
    pub fn index(&self) -> usize {
        match self {
            GestureMode::Idle => 0,
            GestureMode::Rotate => 1,
            GestureMode::Zoom => 2,
            GestureMode::Explode => 3,
            GestureMode::Freeze => 4,
        }
    }
}

impl fmt::Display for GestureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An output channel gated by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Rotation,
    Zoom,
    Explode,
}

impl Channel {
    /// The mode that makes this channel live.
    pub fn mode(&self) -> GestureMode {
        match self {
            Channel::Rotation => GestureMode::Rotate,
            Channel::Zoom => GestureMode::Zoom,
            Channel::Explode => GestureMode::Explode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for mode in GestureMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
        }
    }

    #[test]
    fn test_indices_are_dense() {
        for (i, mode) in GestureMode::ALL.iter().enumerate() {
            assert_eq!(mode.index(), i);
        }
    }
}
