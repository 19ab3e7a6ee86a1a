//! Wire serialization and fan-out of processed frames.

use std::sync::Arc;

use holo_common::clock::SessionClock;
use holo_common::config::PreviewConfig;
use holo_common::error::HoloResult;
use holo_gesture_model::{OutboundFrame, WireMessage};

use crate::registry::{BroadcastReport, ClientRegistry};

#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<ClientRegistry>,
    preview: PreviewConfig,
}

impl Broadcaster {
    pub fn new(registry: Arc<ClientRegistry>, preview: PreviewConfig) -> Self {
        Self { registry, preview }
    }

    /// Whether a preview image rides along with `frame_index`.
    pub fn preview_due(&self, frame_index: u64) -> bool {
        self.preview.enabled
            && self.preview.every_n_frames > 0
            && frame_index % self.preview.every_n_frames == 0
    }

    /// Build the wire message for a frame, stamped with the current time.
    pub fn encode(
        &self,
        frame: &OutboundFrame,
        frame_index: u64,
        preview: Option<&str>,
    ) -> HoloResult<String> {
        let preview = preview
            .filter(|_| self.preview_due(frame_index))
            .map(str::to_owned);
        let message = WireMessage::from_frame(
            frame,
            frame_index,
            SessionClock::wire_timestamp_ms(),
            preview,
        );
        Ok(message.to_json()?)
    }

    /// Encode a frame and offer it to every connected client.
    pub fn publish(
        &self,
        frame: &OutboundFrame,
        frame_index: u64,
        preview: Option<&str>,
    ) -> HoloResult<BroadcastReport> {
        if self.registry.is_empty() {
            return Ok(BroadcastReport::default());
        }
        let json = self.encode(frame, frame_index, preview)?;
        let report = self.registry.broadcast(&json);
        if report.dropped > 0 {
            tracing::info!(
                dropped = report.dropped,
                remaining = self.registry.len(),
                "Dropped clients during broadcast"
            );
        }
        Ok(report)
    }

    pub fn close_all(&self) -> usize {
        self.registry.close_all()
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;
    use holo_gesture_model::GestureMode;

    fn broadcaster(capacity: usize) -> Broadcaster {
        Broadcaster::new(Arc::new(ClientRegistry::new(capacity)), PreviewConfig::default())
    }

    fn text(message: Option<Message>) -> serde_json::Value {
        match message {
            Some(Message::Text(text)) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[test]
    fn test_wire_shape() {
        let b = broadcaster(4);
        let frame = OutboundFrame {
            rot_dx: -0.01,
            mode: GestureMode::Rotate,
            hands: 1,
            ..Default::default()
        };
        let json: serde_json::Value =
            serde_json::from_str(&b.encode(&frame, 5, Some("abc")).unwrap()).unwrap();

        assert_eq!(json["v"], 2);
        assert!(json["ts"].as_u64().unwrap() < 1_000_000_000);
        assert_eq!(json["g"]["rot"]["dx"], -0.01);
        assert_eq!(json["g"]["zoom"]["dz"], 0.0);
        assert_eq!(json["g"]["mode"], "ROTATE");
        assert_eq!(json["g"]["freeze"], false);
        assert_eq!(json["measure"]["active"], false);
        assert!(json["measure"]["pos1"].is_null());
        assert_eq!(json["dbg"]["hands"], 1);
        assert_eq!(json["dbg"]["frame"], 5);
        // Frame 5 is not a preview frame with the default sampling of 4.
        assert!(json.get("preview").is_none());
    }

    #[test]
    fn test_preview_only_on_sampled_frames() {
        let b = broadcaster(8);
        let (_id, mut rx) = b.registry().register();
        let frame = OutboundFrame::default();

        for index in 0..8 {
            b.publish(&frame, index, Some("jpeg")).unwrap();
        }
        let with_preview: Vec<u64> = (0..8)
            .filter_map(|_| {
                let json = text(rx.try_recv().ok());
                json.get("preview").map(|_| json["dbg"]["frame"].as_u64().unwrap())
            })
            .collect();
        assert_eq!(with_preview, vec![0, 4]);
    }

    #[test]
    fn test_preview_disabled() {
        let b = Broadcaster::new(
            Arc::new(ClientRegistry::new(1)),
            PreviewConfig {
                enabled: false,
                every_n_frames: 4,
            },
        );
        assert!(!b.preview_due(0));
        assert!(!b.preview_due(4));
    }

    #[test]
    fn test_failed_client_dropped_others_served() {
        let b = broadcaster(4);
        let (_ok, mut ok_rx) = b.registry().register();
        let (_gone, gone_rx) = b.registry().register();
        drop(gone_rx);

        let report = b.publish(&OutboundFrame::default(), 1, None).unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(b.registry().len(), 1);
        assert_eq!(text(ok_rx.try_recv().ok())["dbg"]["frame"], 1);

        b.publish(&OutboundFrame::default(), 2, None).unwrap();
        assert_eq!(text(ok_rx.try_recv().ok())["dbg"]["frame"], 2);
    }
}
