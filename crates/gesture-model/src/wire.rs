//! Versioned JSON wire protocol between the stream server and renderers.
//!
//! Server → client, one text frame per published frame:
//!
//! ```json
//! {"v":2,"ts":123,"g":{"rot":{"dx":0.0,"dy":0.0},"zoom":{"dz":0.0},
//!  "explode":0.0,"freeze":false,"mode":"IDLE"},
//!  "measure":{"active":false,"has_left_gesture":false,"has_right_gesture":false,
//!             "pos1":null,"pos2":null},
//!  "dbg":{"hands":0,"frame":0}}
//! ```
//!
//! Client → server: `{"type":"ping"}`, answered with `{"type":"pong","v":2}`.
//! Anything else is ignored.

use serde::{Deserialize, Serialize};

use crate::frame::{MeasureData, OutboundFrame};
use crate::mode::GestureMode;

/// Protocol version carried in every message.
pub const PROTOCOL_VERSION: u32 = 2;

/// One published frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub v: u32,

    /// Millisecond timestamp.
    pub ts: u64,

    pub g: WireGesture,
    pub measure: MeasureData,
    pub dbg: WireDebug,

    /// Base64 JPEG thumbnail on preview-sampled frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireGesture {
    pub rot: WireRotation,
    pub zoom: WireZoom,
    pub explode: f64,
    pub freeze: bool,
    pub mode: GestureMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireRotation {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireZoom {
    pub dz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireDebug {
    pub hands: usize,
    pub frame: u64,
}

impl WireMessage {
    /// Build the wire message for a processed frame.
    pub fn from_frame(
        frame: &OutboundFrame,
        frame_index: u64,
        ts: u64,
        preview: Option<String>,
    ) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            ts,
            g: WireGesture {
                rot: WireRotation {
                    dx: frame.rot_dx,
                    dy: frame.rot_dy,
                },
                zoom: WireZoom {
                    dz: frame.zoom_delta,
                },
                explode: frame.explode,
                freeze: frame.freeze,
                mode: frame.mode,
            },
            measure: frame.measure.clone(),
            dbg: WireDebug {
                hands: frame.hands,
                frame: frame_index,
            },
            preview,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Control messages accepted from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
}

impl ClientMessage {
    /// Parse an inbound text frame. Unknown or malformed payloads yield
    /// `None` and are meant to be ignored.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Control messages sent to clients outside the frame stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong { v: u32 },
}

impl ServerMessage {
    pub fn pong() -> Self {
        ServerMessage::Pong {
            v: PROTOCOL_VERSION,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    #[test]
    fn test_wire_shape() {
        let frame = OutboundFrame {
            rot_dx: -0.0123,
            rot_dy: 0.004,
            zoom_delta: 0.0,
            explode: 0.5,
            mode: GestureMode::Rotate,
            freeze: false,
            hands: 1,
            measure: MeasureData {
                active: true,
                has_left_gesture: true,
                pos1: Some(Vec2::new(0.25, 0.5)),
                ..Default::default()
            },
            ..Default::default()
        };
        let msg = WireMessage::from_frame(&frame, 42, 1234, None);
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(value["v"], 2);
        assert_eq!(value["ts"], 1234);
        assert_eq!(value["g"]["rot"]["dx"], -0.0123);
        assert_eq!(value["g"]["zoom"]["dz"], 0.0);
        assert_eq!(value["g"]["explode"], 0.5);
        assert_eq!(value["g"]["freeze"], false);
        assert_eq!(value["g"]["mode"], "ROTATE");
        assert_eq!(value["measure"]["pos1"]["x"], 0.25);
        assert!(value["measure"]["pos2"].is_null());
        assert_eq!(value["dbg"]["hands"], 1);
        assert_eq!(value["dbg"]["frame"], 42);
        assert!(value.get("preview").is_none());
    }

    #[test]
    fn test_preview_included_when_present() {
        let msg =
            WireMessage::from_frame(&OutboundFrame::default(), 0, 0, Some("/9j/4AAQ".to_string()));
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["preview"], "/9j/4AAQ");
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(ClientMessage::parse(r#"{"type":"ping"}"#), Some(ClientMessage::Ping));
        assert_eq!(
            ClientMessage::parse(r#"{"type":"ping","seq":3}"#),
            Some(ClientMessage::Ping)
        );
        assert_eq!(ClientMessage::parse(r#"{"type":"hello"}"#), None);
        assert_eq!(ClientMessage::parse("not json"), None);
    }

    #[test]
    fn test_pong_shape() {
        assert_eq!(
            ServerMessage::pong().to_json().unwrap(),
            r#"{"type":"pong","v":2}"#
        );
    }
}
