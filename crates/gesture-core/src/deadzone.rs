//! Variance-driven deadzone.
//!
//! The gate widens automatically under high measurement uncertainty, so
//! filter-induced jitter is suppressed without a hand-tuned constant per
//! lighting condition.

/// Hard noise gate whose threshold grows with filter variance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveDeadzone {
    base: f64,
    scale: f64,
}

impl AdaptiveDeadzone {
    pub fn new(base: f64, scale: f64) -> Self {
        Self { base, scale }
    }

    /// `base + variance * scale`.
    pub fn threshold(&self, variance: f64) -> f64 {
        self.base + variance * self.scale
    }

    /// Zero when `|value|` is below the threshold, otherwise `value`
    /// unchanged (no soft knee).
    pub fn apply(&self, value: f64, variance: f64) -> f64 {
        if value.abs() < self.threshold(variance) {
            0.0
        } else {
            value
        }
    }
}
