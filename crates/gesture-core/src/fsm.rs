//! Gesture finite state machine.
//!
//! Arbitrates between the control modes with a fixed priority order and a
//! per-target dwell time, so that a single noisy frame cannot flip the mode.
//!
//! Priority: `Freeze > Zoom > Rotate > Explode > Idle`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use holo_common::config::FsmConfig;
use holo_gesture_model::{Channel, GestureMode};
use serde::Serialize;

/// Minimum time the machine must have spent in its current mode before it
/// may move to a given target mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellTable {
    pub idle: Duration,
    pub rotate: Duration,
    pub zoom: Duration,
    pub explode: Duration,
}

impl DwellTable {
    pub fn from_config(config: &FsmConfig) -> Self {
        Self {
            idle: Duration::from_millis(config.dwell_idle_ms),
            rotate: Duration::from_millis(config.dwell_rotate_ms),
            zoom: Duration::from_millis(config.dwell_zoom_ms),
            explode: Duration::from_millis(config.dwell_explode_ms),
        }
    }

    /// Dwell required to enter `target`. Freeze is always immediate.
    pub fn dwell(&self, target: GestureMode) -> Duration {
        match target {
            GestureMode::Idle => self.idle,
            GestureMode::Rotate => self.rotate,
            GestureMode::Zoom => self.zoom,
            GestureMode::Explode => self.explode,
            GestureMode::Freeze => Duration::ZERO,
        }
    }
}

impl Default for DwellTable {
    fn default() -> Self {
        Self::from_config(&FsmConfig::default())
    }
}

/// Per-frame classifier output consumed by the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsmSignals {
    pub hands: usize,
    /// Hand 0 is a closed fist.
    pub fist: bool,
    pub pinch_left: bool,
    pub pinch_right: bool,
    /// Hand 0 has its index finger raised.
    pub index_up: bool,
}

impl FsmSignals {
    /// Highest-priority mode these signals ask for.
    pub fn candidate(&self) -> GestureMode {
        if self.fist {
            GestureMode::Freeze
        } else if self.hands >= 2 && self.pinch_left && self.pinch_right {
            GestureMode::Zoom
        } else if self.hands == 1 {
            GestureMode::Rotate
        } else if self.index_up {
            GestureMode::Explode
        } else {
            GestureMode::Idle
        }
    }
}

/// Usage statistics snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FsmStats {
    pub current_mode: GestureMode,
    pub time_in_current_ms: f64,
    pub total_transitions: u64,
    /// Share of completed mode time per mode, in percent.
    pub mode_percentages: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct GestureFsm {
    mode: GestureMode,
    entered_at: Instant,
    dwell: DwellTable,
    transitions: u64,
    durations: [Duration; 5],
}

impl GestureFsm {
    pub fn new(config: &FsmConfig, now: Instant) -> Self {
        Self::with_dwell(DwellTable::from_config(config), now)
    }

    pub fn with_dwell(dwell: DwellTable, now: Instant) -> Self {
        Self {
            mode: GestureMode::Idle,
            entered_at: now,
            dwell,
            transitions: 0,
            durations: [Duration::ZERO; 5],
        }
    }

    /// Evaluate one frame of signals and return the resulting mode.
    ///
    /// A transition happens only when the time spent in the current mode is
    /// at least the dwell of the target mode. Staying in the same mode never
    /// restarts the timer.
    pub fn update(&mut self, signals: FsmSignals, now: Instant) -> GestureMode {
        let target = signals.candidate();
        if target != self.mode && self.time_in_current(now) >= self.dwell.dwell(target) {
            self.enter(target, now);
        }
        self.mode
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    /// Whether `channel` may emit non-trivial output in the current mode.
    pub fn can_apply(&self, channel: Channel) -> bool {
        self.mode != GestureMode::Freeze && self.mode == channel.mode()
    }

    /// Back to `Idle` immediately, with all statistics cleared.
    pub fn reset(&mut self, now: Instant) {
        self.mode = GestureMode::Idle;
        self.entered_at = now;
        self.transitions = 0;
        self.durations = [Duration::ZERO; 5];
    }

    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    pub fn time_in_current(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.entered_at)
    }

    pub fn stats(&self, now: Instant) -> FsmStats {
        let total: Duration = self.durations.iter().sum();
        let total_secs = total.as_secs_f64();
        let mode_percentages = GestureMode::ALL
            .iter()
            .map(|mode| {
                let share = if total_secs > 0.0 {
                    self.durations[mode.index()].as_secs_f64() / total_secs * 100.0
                } else {
                    0.0
                };
                (mode.as_str().to_string(), share)
            })
            .collect();

        FsmStats {
            current_mode: self.mode,
            time_in_current_ms: self.time_in_current(now).as_secs_f64() * 1000.0,
            total_transitions: self.transitions,
            mode_percentages,
        }
    }

    fn enter(&mut self, target: GestureMode, now: Instant) {
        let spent = self.time_in_current(now);
        self.durations[self.mode.index()] += spent;
        self.transitions += 1;
        tracing::trace!(
            from = %self.mode,
            to = %target,
            spent_ms = spent.as_millis() as u64,
            "Mode transition"
        );
        self.mode = target;
        self.entered_at = now;
    }
}
