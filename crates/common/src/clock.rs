//! Session clock and broadcast rate control.
//!
//! A capture session is anchored to a monotonic epoch taken when the
//! session opens. Filter and state-machine timing uses that monotonic
//! clock; only the outbound wire timestamp is derived from wall-clock time.

use std::time::{Duration, Instant};

/// Wire timestamps wrap at this many milliseconds so they stay well inside
/// the integer range of JavaScript clients.
pub const WIRE_TIMESTAMP_MODULUS_MS: i64 = 1_000_000_000;

/// Monotonic clock for one capture session.
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Nanoseconds between the epoch and `now`, saturating at zero.
    pub fn ns_at(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.epoch).as_nanos() as u64
    }

    /// Seconds elapsed since the session opened.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// The underlying epoch instant.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Millisecond timestamp carried in the `ts` field of wire messages.
    pub fn wire_timestamp_ms() -> u64 {
        chrono::Utc::now()
            .timestamp_millis()
            .rem_euclid(WIRE_TIMESTAMP_MODULUS_MS) as u64
    }
}

/// Publish-rate limiter for the outbound stream.
///
/// Every frame is processed, but a frame is only published when at least
/// one interval has elapsed since the previous publish.
#[derive(Debug)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given rate in Hz.
    ///
    /// A rate of zero is treated as 1 Hz.
    pub fn new(target_hz: u32) -> Self {
        Self {
            target_interval_ns: 1_000_000_000 / target_hz.max(1) as u64,
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next publish.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Target interval.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.target_interval_ns)
    }
}
