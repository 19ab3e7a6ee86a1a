//! Hand-landmark sources feeding the capture session.

use std::path::Path;
use std::time::{Duration, Instant};

use holo_common::error::{HoloError, HoloResult};
use holo_gesture_model::{parse_frames, HandLandmarks};

/// One acquisition from a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedFrame {
    /// Detected hands, in the pose estimator's order.
    pub hands: Vec<HandLandmarks>,

    /// Base64 JPEG of the camera image, when the source provides one.
    pub preview: Option<String>,
}

impl CapturedFrame {
    pub fn new(hands: Vec<HandLandmarks>) -> Self {
        Self {
            hands,
            preview: None,
        }
    }
}

/// Trait for landmark sources (camera + pose estimator, replay files).
///
/// `next_frame` may block until a frame is available.
pub trait HandSource: Send {
    /// Acquire the next frame. `Ok(None)` means nothing is available right
    /// now; the caller pauses and retries.
    fn next_frame(&mut self) -> HoloResult<Option<CapturedFrame>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Release the underlying device. Called once when the session ends.
    fn release(&mut self) {}
}

/// Replays recorded landmark frames from memory or a JSONL file.
#[derive(Debug)]
pub struct ReplaySource {
    name: String,
    frames: Vec<Vec<HandLandmarks>>,
    cursor: usize,
    looping: bool,
    interval: Option<Duration>,
    next_due: Option<Instant>,
    exhausted: bool,
}

impl ReplaySource {
    pub fn from_frames(frames: Vec<Vec<HandLandmarks>>) -> Self {
        Self {
            name: "replay".to_string(),
            frames,
            cursor: 0,
            looping: false,
            interval: None,
            next_due: None,
            exhausted: false,
        }
    }

    /// Load a JSONL recording (one JSON array of hands per line).
    pub fn open(path: &Path) -> HoloResult<Self> {
        if !path.exists() {
            return Err(HoloError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let frames = parse_frames(&content)?;
        tracing::info!(path = %path.display(), frames = frames.len(), "Loaded replay recording");

        let mut source = Self::from_frames(frames);
        source.name = format!("replay:{}", path.display());
        Ok(source)
    }

    /// Restart from the first frame after the last one.
    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Deliver at most one frame per `interval`, blocking in `next_frame`.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the next frame to deliver.
    pub fn position(&self) -> usize {
        self.cursor
    }

    fn pace(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        let now = Instant::now();
        if let Some(due) = self.next_due {
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        self.next_due = Some(self.next_due.map_or(now, |due| due.max(now)) + interval);
    }
}

impl HandSource for ReplaySource {
    fn next_frame(&mut self) -> HoloResult<Option<CapturedFrame>> {
        if self.cursor >= self.frames.len() {
            if self.looping && !self.frames.is_empty() {
                tracing::debug!(source = %self.name, "Replay looped");
                self.cursor = 0;
            } else {
                if !self.exhausted {
                    tracing::info!(source = %self.name, "Replay exhausted");
                    self.exhausted = true;
                }
                return Ok(None);
            }
        }

        self.pace();
        let hands = self.frames[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(CapturedFrame::new(hands)))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn release(&mut self) {
        tracing::debug!(source = %self.name, delivered = self.cursor, "Replay released");
    }
}
