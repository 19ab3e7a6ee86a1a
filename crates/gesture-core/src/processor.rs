//! Per-frame gesture processing.
//!
//! [`GestureProcessor`] owns every piece of mutable pipeline state: the
//! filters, the rotation/zoom/explode channel state and the state machine.
//! One call to [`GestureProcessor::process`] consumes one frame of hands and
//! yields one [`OutboundFrame`].

use std::time::Instant;

use holo_common::config::{AppConfig, ExplodeConfig, FsmConfig, GestureProfile, KalmanConfig};
use holo_common::error::HoloResult;
use holo_gesture_model::landmark::index;
use holo_gesture_model::{
    Channel, GestureMode, GestureShortcuts, HandLandmarks, MeasureData, OutboundFrame, Vec2,
};

use crate::classifier;
use crate::deadzone::AdaptiveDeadzone;
use crate::fsm::{FsmSignals, GestureFsm};
use crate::kalman::{Kalman1D, Kalman2D};

/// Frames between periodic debug summaries.
const DEBUG_LOG_INTERVAL: u64 = 60;

/// Frames between explode progress logs while the gesture is held.
const EXPLODE_LOG_INTERVAL: u64 = 30;

/// Weight of the newest distance in the zoom moving average.
const ZOOM_AVERAGE_WEIGHT: f64 = 0.9;

/// Everything the processor needs from the application configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessorConfig {
    pub profile: GestureProfile,
    pub kalman: KalmanConfig,
    pub fsm: FsmConfig,
    pub explode: ExplodeConfig,
}

impl ProcessorConfig {
    /// Extract processor settings, resolving the active gesture profile.
    pub fn from_app_config(config: &AppConfig) -> HoloResult<Self> {
        Ok(Self {
            profile: *config.gestures.active()?,
            kalman: config.kalman.clone(),
            fsm: config.fsm.clone(),
            explode: config.explode.clone(),
        })
    }
}

/// Stateful per-frame processor.
#[derive(Debug, Clone)]
pub struct GestureProcessor {
    config: ProcessorConfig,
    fsm: GestureFsm,
    palm_filter: Kalman2D,
    pinch_filter: Kalman1D,
    rot_deadzone: AdaptiveDeadzone,
    zoom_deadzone: AdaptiveDeadzone,

    previous_palm: Option<Vec2>,
    velocity: Vec2,
    zoom_average: Option<f64>,
    explode_factor: f64,
    frame_count: u64,
}

impl GestureProcessor {
    pub fn new(config: ProcessorConfig, now: Instant) -> Self {
        let fsm = GestureFsm::new(&config.fsm, now);
        let palm_filter = Kalman2D::from_config(&config.kalman);
        let pinch_filter = Kalman1D::from_config(&config.kalman);
        let (rot_deadzone, zoom_deadzone) = deadzones(&config.profile);

        tracing::debug!(
            kalman = config.kalman.enabled,
            rot_gain = config.profile.rot_gain,
            smooth = config.profile.smooth,
            "Gesture processor initialized"
        );

        Self {
            config,
            fsm,
            palm_filter,
            pinch_filter,
            rot_deadzone,
            zoom_deadzone,
            previous_palm: None,
            velocity: Vec2::ZERO,
            zoom_average: None,
            explode_factor: 0.0,
            frame_count: 0,
        }
    }

    /// Process one frame of hands observed at `now`.
    pub fn process(&mut self, hands: &[HandLandmarks], now: Instant) -> OutboundFrame {
        self.frame_count += 1;

        let threshold = self.config.profile.pinch_threshold;
        let first = hands.first();
        let second = hands.get(1);

        let pinch_first = first.map(|h| classifier::pinching(h, threshold));
        let pinch_second = second.map(|h| classifier::pinching(h, threshold));

        let signals = FsmSignals {
            hands: hands.len(),
            fist: first.is_some_and(classifier::fist_closed),
            pinch_left: pinch_first.is_some_and(|(pinch, _)| pinch),
            pinch_right: pinch_second.is_some_and(|(pinch, _)| pinch),
            index_up: first.is_some_and(classifier::index_up),
        };
        let mode = self.fsm.update(signals, now);

        let (rot_dx, rot_dy) = self.rotation(first);
        let zoom_delta = match (first, second) {
            (Some(a), Some(b)) if self.fsm.can_apply(Channel::Zoom) => self.zoom(a, b),
            _ => {
                self.zoom_average = None;
                0.0
            }
        };
        self.explode(first, second);

        let shortcuts = self.shortcuts(first, second, signals.index_up, pinch_first);
        let measure = measure_data(first, second);

        if self.frame_count % DEBUG_LOG_INTERVAL == 0 {
            tracing::debug!(
                frame = self.frame_count,
                mode = %mode,
                hands = hands.len(),
                rot_dx,
                rot_dy,
                zoom_delta,
                "Processor summary"
            );
        }

        OutboundFrame {
            rot_dx: round_to(rot_dx, 6),
            rot_dy: round_to(rot_dy, 6),
            zoom_delta: round_to(zoom_delta, 6),
            explode: round_to(self.explode_factor, 2),
            mode,
            freeze: mode == GestureMode::Freeze,
            hands: hands.len(),
            shortcuts,
            measure,
        }
    }

    /// Swap the tuning profile. Filter and state machine state are kept.
    pub fn set_profile(&mut self, profile: GestureProfile) {
        let (rot_deadzone, zoom_deadzone) = deadzones(&profile);
        self.rot_deadzone = rot_deadzone;
        self.zoom_deadzone = zoom_deadzone;
        self.config.profile = profile;
    }

    /// Clear channel state, filters and the state machine.
    pub fn reset(&mut self, now: Instant) {
        self.fsm.reset(now);
        self.palm_filter.reset();
        self.pinch_filter.reset(0.0);
        self.previous_palm = None;
        self.velocity = Vec2::ZERO;
        self.zoom_average = None;
        self.explode_factor = 0.0;
        self.frame_count = 0;
    }

    pub fn fsm(&self) -> &GestureFsm {
        &self.fsm
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Smoothed palm velocity (before gain).
    pub fn rotation_velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Unrounded explode factor.
    pub fn explode_factor(&self) -> f64 {
        self.explode_factor
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn rotation(&mut self, first: Option<&HandLandmarks>) -> (f64, f64) {
        let hand = match first {
            Some(hand) if self.fsm.can_apply(Channel::Rotation) => hand,
            _ => {
                self.previous_palm = None;
                self.velocity = self.velocity * self.config.profile.velocity_decay;
                return (0.0, 0.0);
            }
        };

        let raw = hand.xy(index::PALM_CENTER);
        let (palm, variance) = if self.config.kalman.enabled {
            let (x, y) = self.palm_filter.update(raw.x, raw.y);
            (Vec2::new(x, y), self.palm_filter.variance())
        } else {
            (raw, 0.0)
        };

        let mut output = (0.0, 0.0);
        if let Some(previous) = self.previous_palm {
            let delta = palm - previous;
            let gated = Vec2::new(
                self.rot_deadzone.apply(delta.x, variance),
                self.rot_deadzone.apply(delta.y, variance),
            );
            let smooth = self.config.profile.smooth;
            self.velocity = self.velocity * smooth + gated * (1.0 - smooth);

            let gain = self.config.profile.rot_gain;
            output = (-self.velocity.x * gain, self.velocity.y * gain);
        }
        self.previous_palm = Some(palm);
        output
    }

    fn zoom(&mut self, first: &HandLandmarks, second: &HandLandmarks) -> f64 {
        let distance = first
            .xy(index::INDEX_TIP)
            .distance(&second.xy(index::INDEX_TIP));
        let average = *self.zoom_average.get_or_insert(distance);

        let delta = self.zoom_deadzone.apply(distance - average, 0.0);
        self.zoom_average =
            Some(ZOOM_AVERAGE_WEIGHT * distance + (1.0 - ZOOM_AVERAGE_WEIGHT) * average);
        delta
    }

    fn explode(&mut self, first: Option<&HandLandmarks>, second: Option<&HandLandmarks>) {
        let pair = first.zip(second).filter(|(a, b)| classifier::explode_gesture(a, b));
        let Some((a, b)) = pair else {
            self.explode_factor =
                (self.explode_factor - self.config.explode.decay_step).clamp(0.0, 1.0);
            return;
        };

        let ExplodeConfig {
            min_distance,
            max_distance,
            ..
        } = self.config.explode;
        let distance = a
            .xy(index::PALM_CENTER)
            .distance(&b.xy(index::PALM_CENTER));
        let normalized = (distance - min_distance) / (max_distance - min_distance);
        self.explode_factor = if normalized.is_finite() {
            normalized.clamp(0.0, 1.0)
        } else {
            0.0
        };

        if self.frame_count % EXPLODE_LOG_INTERVAL == 0 {
            tracing::info!(
                distance,
                factor = self.explode_factor,
                "Explode gesture active"
            );
        }
    }

    fn shortcuts(
        &mut self,
        first: Option<&HandLandmarks>,
        second: Option<&HandLandmarks>,
        index_up: bool,
        pinch_first: Option<(bool, f64)>,
    ) -> GestureShortcuts {
        let Some(hand) = first else {
            return GestureShortcuts::default();
        };

        let pinch_distance = pinch_first.map(|(_, raw)| {
            if self.config.kalman.enabled {
                self.pinch_filter.update(raw)
            } else {
                raw
            }
        });

        GestureShortcuts {
            v_sign: classifier::v_sign(hand),
            thumbs_up: classifier::thumbs_up(hand),
            palm_menu: second.is_some_and(|other| classifier::two_palms_menu(hand, other)),
            hand_roll: Some(round_to(classifier::hand_roll_angle(hand), 3)),
            pointer: index_up.then(|| classifier::pointer_direction(hand)),
            pinch_distance,
        }
    }
}

fn deadzones(profile: &GestureProfile) -> (AdaptiveDeadzone, AdaptiveDeadzone) {
    (
        AdaptiveDeadzone::new(profile.rot_deadzone, profile.rot_deadzone_scale),
        AdaptiveDeadzone::new(profile.zoom_deadzone, profile.zoom_deadzone_scale),
    )
}

fn measure_data(first: Option<&HandLandmarks>, second: Option<&HandLandmarks>) -> MeasureData {
    let pos1 = first
        .filter(|h| classifier::measure_gesture(h))
        .map(classifier::measure_point);
    let pos2 = second
        .filter(|h| classifier::measure_gesture(h))
        .map(classifier::measure_point);

    MeasureData {
        active: pos1.is_some() || pos2.is_some(),
        has_left_gesture: pos1.is_some(),
        has_right_gesture: pos2.is_some(),
        pos1,
        pos2,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
