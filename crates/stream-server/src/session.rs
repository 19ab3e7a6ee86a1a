//! The capture session loop: acquire, process, publish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use holo_common::clock::{RateController, SessionClock};
use holo_common::config::{AppConfig, GestureProfile};
use holo_common::error::HoloResult;
use holo_gesture_core::{FsmStats, GestureProcessor, ProcessorConfig};
use holo_gesture_model::GestureMode;
use serde::Serialize;
use tokio::sync::watch;

use crate::broadcaster::Broadcaster;
use crate::source::{CapturedFrame, HandSource};

/// Pause after a failed or empty acquisition.
pub const ACQUIRE_RETRY_PAUSE: Duration = Duration::from_millis(10);

/// The active gesture profile and its name.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSelection {
    pub name: String,
    pub profile: GestureProfile,
}

/// Snapshot published by the session after every processed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStatus {
    pub mode: GestureMode,
    pub frames_processed: u64,
    pub frames_published: u64,
    pub stats: FsmStats,
}

/// Counters reported when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub frames_published: u64,
    pub acquisition_failures: u64,
}

/// The outside world's handle on a running session.
#[derive(Debug)]
pub struct SessionHandle {
    profile_tx: watch::Sender<ProfileSelection>,
    status_rx: watch::Receiver<SessionStatus>,
    stop_flag: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Ask the session to switch profiles on its next iteration.
    pub fn select_profile(&self, selection: ProfileSelection) {
        self.profile_tx.send_replace(selection);
    }

    pub fn profile(&self) -> ProfileSelection {
        self.profile_tx.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }
}

/// Owns the source, the processor and the publish throttle.
///
/// `run` blocks the calling thread; the server drives it from a blocking
/// task.
pub struct GestureSession {
    source: Box<dyn HandSource>,
    processor: GestureProcessor,
    broadcaster: Broadcaster,
    rate: RateController,
    clock: SessionClock,
    stop_flag: Arc<AtomicBool>,
    profile_rx: watch::Receiver<ProfileSelection>,
    status_tx: watch::Sender<SessionStatus>,
    summary: SessionSummary,
    frame_index: u64,
    retry_pause: Duration,
}

impl GestureSession {
    pub fn new(
        config: &AppConfig,
        source: Box<dyn HandSource>,
        broadcaster: Broadcaster,
        stop_flag: Arc<AtomicBool>,
    ) -> HoloResult<(Self, SessionHandle)> {
        let processor_config = ProcessorConfig::from_app_config(config)?;
        let clock = SessionClock::start();

        let (profile_tx, profile_rx) = watch::channel(ProfileSelection {
            name: config.gestures.profile.clone(),
            profile: processor_config.profile,
        });
        let (status_tx, status_rx) = watch::channel(SessionStatus::default());

        let session = Self {
            source,
            processor: GestureProcessor::new(processor_config, clock.epoch()),
            broadcaster,
            rate: RateController::new(config.server.fps_limit),
            clock,
            stop_flag: stop_flag.clone(),
            profile_rx,
            status_tx,
            summary: SessionSummary::default(),
            frame_index: 0,
            retry_pause: ACQUIRE_RETRY_PAUSE,
        };
        let handle = SessionHandle {
            profile_tx,
            status_rx,
            stop_flag,
        };
        Ok((session, handle))
    }

    /// Run until the stop flag is set, then close every client and release
    /// the source.
    pub fn run(mut self) -> SessionSummary {
        tracing::info!(
            source = self.source.name(),
            started_at = self.clock.epoch_wall(),
            interval_ms = self.rate.interval().as_millis() as u64,
            "Gesture session started"
        );

        while !self.stop_flag.load(Ordering::Relaxed) {
            self.apply_profile_update();

            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    self.handle_frame(frame, Instant::now());
                }
                Ok(None) => {
                    self.summary.acquisition_failures += 1;
                    std::thread::sleep(self.retry_pause);
                }
                Err(err) => {
                    self.summary.acquisition_failures += 1;
                    tracing::warn!(
                        error = %err,
                        source = self.source.name(),
                        "Frame acquisition failed"
                    );
                    std::thread::sleep(self.retry_pause);
                }
            }
        }

        self.broadcaster.close_all();
        self.source.release();
        tracing::info!(
            frames = self.summary.frames_processed,
            published = self.summary.frames_published,
            failures = self.summary.acquisition_failures,
            elapsed_secs = self.clock.elapsed_secs(),
            "Gesture session stopped"
        );
        self.summary
    }

    /// Process one frame observed at `now` and publish it if due.
    ///
    /// Returns whether the frame was published.
    pub fn handle_frame(&mut self, frame: CapturedFrame, now: Instant) -> bool {
        let output = self.processor.process(&frame.hands, now);
        let index = self.frame_index;
        self.frame_index += 1;
        self.summary.frames_processed += 1;

        let due = self.rate.should_tick(self.clock.ns_at(now));
        if due {
            match self
                .broadcaster
                .publish(&output, index, frame.preview.as_deref())
            {
                Ok(_) => self.summary.frames_published += 1,
                Err(err) => tracing::error!(error = %err, frame = index, "Failed to encode frame"),
            }
        }

        self.status_tx.send_replace(SessionStatus {
            mode: output.mode,
            frames_processed: self.summary.frames_processed,
            frames_published: self.summary.frames_published,
            stats: self.processor.fsm().stats(now),
        });
        due
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    pub fn processor(&self) -> &GestureProcessor {
        &self.processor
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    fn apply_profile_update(&mut self) {
        if !self.profile_rx.has_changed().unwrap_or(false) {
            return;
        }
        let selection = self.profile_rx.borrow_and_update().clone();
        self.processor.set_profile(selection.profile);
        tracing::info!(profile = %selection.name, "Gesture profile switched");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClientRegistry;
    use crate::source::ReplaySource;
    use holo_common::error::HoloError;
    use holo_gesture_model::landmark::{Landmark, LANDMARK_COUNT};
    use holo_gesture_model::HandLandmarks;

    fn session_with(
        source: Box<dyn HandSource>,
    ) -> (GestureSession, SessionHandle, Arc<ClientRegistry>) {
        let config = AppConfig::default();
        let registry = Arc::new(ClientRegistry::new(64));
        let broadcaster = Broadcaster::new(registry.clone(), config.preview.clone());
        let (session, handle) = GestureSession::new(
            &config,
            source,
            broadcaster,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        (session, handle, registry)
    }

    /// All four fingers raised above their middle joints.
    fn open_hand() -> HandLandmarks {
        let mut hand = HandLandmarks::new([Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT]);
        for (tip, pip) in [(8, 6), (12, 10), (16, 14), (20, 18)] {
            hand.set(pip, Landmark::new(0.5, 0.4, 0.0));
            hand.set(tip, Landmark::new(0.5, 0.3, 0.0));
        }
        hand
    }

    #[test]
    fn test_rate_limit_publishes_due_frames_only() {
        let (mut session, handle, registry) =
            session_with(Box::new(ReplaySource::from_frames(Vec::new())));
        let (_id, mut rx) = registry.register();
        let epoch = session.clock().epoch();

        // 90 frames at ~100 Hz against the default 30 Hz limit.
        let published = (0..90u64)
            .filter(|i| {
                session.handle_frame(
                    CapturedFrame::new(vec![open_hand()]),
                    epoch + Duration::from_millis(10 * i),
                )
            })
            .count();

        assert_eq!(session.summary().frames_processed, 90);
        assert_eq!(published as u64, session.summary().frames_published);
        // One publish every 4th frame (40ms >= 33.3ms).
        assert_eq!(published, 23);

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, published);

        let status = handle.status();
        assert_eq!(status.frames_processed, 90);
        assert_eq!(status.mode, GestureMode::Rotate);
        assert_eq!(status.stats.total_transitions, 1);
    }

    #[test]
    fn test_profile_update_applied_on_next_iteration() {
        let (mut session, handle, _registry) =
            session_with(Box::new(ReplaySource::from_frames(Vec::new())));
        handle.select_profile(ProfileSelection {
            name: "precise".to_string(),
            profile: GestureProfile::precise(),
        });
        assert_eq!(handle.profile().name, "precise");

        session.apply_profile_update();
        assert_eq!(session.processor().config().profile, GestureProfile::precise());
    }

    struct FlakySource {
        calls: u32,
    }

    impl HandSource for FlakySource {
        fn next_frame(&mut self) -> HoloResult<Option<CapturedFrame>> {
            self.calls += 1;
            match self.calls % 3 {
                0 => Err(HoloError::capture("camera hiccup")),
                1 => Ok(None),
                _ => Ok(Some(CapturedFrame::new(Vec::new()))),
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[test]
    fn test_run_survives_acquisition_failures_and_stops() {
        let (session, handle, registry) = session_with(Box::new(FlakySource { calls: 0 }));
        let (_id, mut rx) = registry.register();

        let stop = handle.stop_flag();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            stop.store(true, Ordering::SeqCst);
        });
        let summary = session.run();
        stopper.join().unwrap();

        assert!(summary.frames_processed > 0);
        assert!(summary.acquisition_failures >= summary.frames_processed);
        assert!(registry.is_empty());

        // The last queued message is the close frame.
        let mut last = None;
        while let Ok(message) = rx.try_recv() {
            last = Some(message);
        }
        assert_eq!(last, Some(axum::extract::ws::Message::Close(None)));
    }
}
