//! Kalman filters for per-channel noise removal.
//!
//! Constant-value process model: each update predicts that the signal did
//! not move, then corrects towards the measurement by the Kalman gain. The
//! error covariance doubles as an uncertainty estimate that downstream
//! deadzones use to widen their gate.

use holo_common::config::KalmanConfig;

/// Default process noise covariance (q).
pub const DEFAULT_PROCESS_NOISE: f64 = 1e-3;

/// Default measurement noise covariance (r).
pub const DEFAULT_MEASUREMENT_NOISE: f64 = 5e-3;

/// Scalar Kalman filter for one numeric channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Kalman1D {
    estimate: f64,
    error_covariance: f64,
    process_noise: f64,
    measurement_noise: f64,
}

impl Kalman1D {
    pub fn new(process_noise: f64, measurement_noise: f64, initial_value: f64) -> Self {
        Self {
            estimate: initial_value,
            error_covariance: 1.0,
            process_noise,
            measurement_noise,
        }
    }

    pub fn from_config(config: &KalmanConfig) -> Self {
        Self::new(config.process_noise, config.measurement_noise, 0.0)
    }

    /// Fold in one measurement and return the new estimate.
    pub fn update(&mut self, measurement: f64) -> f64 {
        self.error_covariance += self.process_noise;

        let gain = self.error_covariance / (self.error_covariance + self.measurement_noise);
        self.estimate += gain * (measurement - self.estimate);
        self.error_covariance *= 1.0 - gain;

        self.estimate
    }

    /// Discard history: estimate becomes `value`, covariance 1.0.
    pub fn reset(&mut self, value: f64) {
        self.estimate = value;
        self.error_covariance = 1.0;
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Current error covariance.
    pub fn variance(&self) -> f64 {
        self.error_covariance
    }
}

impl Default for Kalman1D {
    fn default() -> Self {
        Self::new(DEFAULT_PROCESS_NOISE, DEFAULT_MEASUREMENT_NOISE, 0.0)
    }
}

/// Two independent scalar filters for a 2-D position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Kalman2D {
    x: Kalman1D,
    y: Kalman1D,
}

impl Kalman2D {
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            x: Kalman1D::new(process_noise, measurement_noise, 0.0),
            y: Kalman1D::new(process_noise, measurement_noise, 0.0),
        }
    }

    pub fn from_config(config: &KalmanConfig) -> Self {
        Self::new(config.process_noise, config.measurement_noise)
    }

    pub fn update(&mut self, x: f64, y: f64) -> (f64, f64) {
        (self.x.update(x), self.y.update(y))
    }

    /// Reset both axes to the origin.
    pub fn reset(&mut self) {
        self.x.reset(0.0);
        self.y.reset(0.0);
    }

    /// Mean of the two axis variances; a coarse noise proxy.
    pub fn variance(&self) -> f64 {
        (self.x.variance() + self.y.variance()) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_input_converges_monotonically() {
        let mut kf = Kalman1D::default();
        let target = 0.75;
        let mut prev_err = (kf.estimate() - target).abs();
        let mut prev_var = kf.variance();

        for _ in 0..200 {
            kf.update(target);
            let err = (kf.estimate() - target).abs();
            assert!(err <= prev_err, "error grew: {err} > {prev_err}");
            assert!(kf.variance() <= prev_var, "variance grew");
            prev_err = err;
            prev_var = kf.variance();
        }

        assert!(prev_err < 1e-6);
    }

    #[test]
    fn test_reset_discards_history() {
        let mut kf = Kalman1D::default();
        for _ in 0..50 {
            kf.update(3.0);
        }
        assert!(kf.variance() < 0.01);

        kf.reset(-1.5);
        assert_eq!(kf.estimate(), -1.5);
        assert_eq!(kf.variance(), 1.0);
    }

    #[test]
    fn test_first_update_nearly_follows_measurement() {
        // With covariance 1.0 the first gain is ~0.995.
        let mut kf = Kalman1D::default();
        let est = kf.update(1.0);
        assert!((est - 1.001 / 1.006).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_signal_is_smoothed() {
        let mut kf = Kalman1D::default();
        kf.reset(0.5);
        let noise = [0.03, -0.02, 0.025, -0.03, 0.01, -0.015, 0.02, -0.025];
        let mut max_dev: f64 = 0.0;
        for _ in 0..10 {
            for n in noise {
                let est = kf.update(0.5 + n);
                max_dev = max_dev.max((est - 0.5).abs());
            }
        }
        assert!(max_dev < 0.03);
    }

    #[test]
    fn test_vector_variance_is_axis_mean() {
        let mut kf = Kalman2D::default();
        kf.update(0.2, 0.8);
        let (vx, vy) = (kf.x.variance(), kf.y.variance());
        assert!((kf.variance() - (vx + vy) / 2.0).abs() < 1e-15);

        kf.reset();
        assert_eq!(kf.variance(), 1.0);
    }
}
