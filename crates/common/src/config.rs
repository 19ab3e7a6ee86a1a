//! Application configuration.
//!
//! Configuration is an explicit value: it is loaded once, validated, and
//! then handed by value to the processor, the state machine, and the
//! server. Nothing reads configuration from ambient global state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HoloError, HoloResult};

/// Name of the profile selected when none is configured.
pub const DEFAULT_PROFILE: &str = "balanced";

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Network and broadcast settings.
    pub server: ServerConfig,

    /// Camera thumbnail forwarding.
    pub preview: PreviewConfig,

    /// Kalman filter noise parameters.
    pub kalman: KalmanConfig,

    /// State-machine dwell durations.
    pub fsm: FsmConfig,

    /// Gesture tuning profiles.
    pub gestures: GestureConfig,

    /// Bimanual explode mapping.
    pub explode: ExplodeConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Maximum published frames per second.
    pub fps_limit: u32,

    /// Seconds without any inbound client message before the server closes
    /// the connection.
    pub idle_timeout_secs: u64,

    /// Outbound messages buffered per client before it is considered too
    /// slow and dropped.
    pub client_queue_capacity: usize,
}

/// Preview thumbnail sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Whether previews supplied by the capture source are forwarded.
    pub enabled: bool,

    /// Forward a preview on every Nth frame.
    pub every_n_frames: u64,
}

/// Kalman filter parameters shared by every filtered channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanConfig {
    /// When disabled, raw positions are used and the deadzone sees zero
    /// variance.
    pub enabled: bool,

    /// Process noise covariance (q).
    pub process_noise: f64,

    /// Measurement noise covariance (r).
    pub measurement_noise: f64,
}

/// Dwell durations (milliseconds) required before entering each mode.
///
/// `Freeze` has no entry: it is always entered immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsmConfig {
    pub dwell_rotate_ms: u64,
    pub dwell_zoom_ms: u64,
    pub dwell_explode_ms: u64,
    pub dwell_idle_ms: u64,
}

/// Named gesture profiles and the active selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Active profile name.
    pub profile: String,

    /// Available profiles by name.
    pub profiles: BTreeMap<String, GestureProfile>,
}

/// Tuning for the rotation and zoom channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureProfile {
    /// Multiplier applied to the smoothed palm velocity.
    pub rot_gain: f64,

    /// Velocity smoothing weight in `[0, 1)`; larger is smoother.
    pub smooth: f64,

    /// Base rotation deadzone (normalized units per frame).
    pub rot_deadzone: f64,

    /// How strongly filter variance widens the rotation deadzone.
    pub rot_deadzone_scale: f64,

    /// Base zoom deadzone (normalized distance).
    pub zoom_deadzone: f64,

    /// How strongly variance widens the zoom deadzone.
    pub zoom_deadzone_scale: f64,

    /// Thumb-index distance below which a hand counts as pinching.
    pub pinch_threshold: f64,

    /// Per-frame multiplier applied to rotation velocity while rotation
    /// is not active.
    pub velocity_decay: f64,
}

/// Mapping from inter-palm distance to explode factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplodeConfig {
    /// Palm distance mapped to factor 0.0.
    pub min_distance: f64,

    /// Palm distance mapped to factor 1.0.
    pub max_distance: f64,

    /// Amount subtracted per frame when the gesture is absent.
    pub decay_step: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "holo_gesture_core=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            fps_limit: 30,
            idle_timeout_secs: 60,
            client_queue_capacity: 32,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            every_n_frames: 4,
        }
    }
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            process_noise: 1e-3,
            measurement_noise: 5e-3,
        }
    }
}

impl Default for FsmConfig {
    fn default() -> Self {
        Self {
            dwell_rotate_ms: 80,
            dwell_zoom_ms: 80,
            dwell_explode_ms: 100,
            dwell_idle_ms: 120,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(DEFAULT_PROFILE.to_string(), GestureProfile::balanced());
        profiles.insert("precise".to_string(), GestureProfile::precise());
        profiles.insert("reactive".to_string(), GestureProfile::reactive());
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            profiles,
        }
    }
}

impl GestureProfile {
    /// General-purpose tuning.
    pub fn balanced() -> Self {
        Self {
            rot_gain: 2.0,
            smooth: 0.5,
            rot_deadzone: 0.00005,
            rot_deadzone_scale: 1.0,
            zoom_deadzone: 0.002,
            zoom_deadzone_scale: 50.0,
            pinch_threshold: 0.08,
            velocity_decay: 0.85,
        }
    }

    /// Slower, heavily smoothed control for fine positioning.
    pub fn precise() -> Self {
        Self {
            rot_gain: 1.2,
            smooth: 0.7,
            rot_deadzone: 0.0002,
            rot_deadzone_scale: 1.5,
            zoom_deadzone: 0.004,
            zoom_deadzone_scale: 50.0,
            pinch_threshold: 0.07,
            velocity_decay: 0.8,
        }
    }

    /// Fast response for large gestures.
    pub fn reactive() -> Self {
        Self {
            rot_gain: 3.0,
            smooth: 0.35,
            rot_deadzone: 0.00002,
            rot_deadzone_scale: 0.5,
            zoom_deadzone: 0.001,
            zoom_deadzone_scale: 50.0,
            pinch_threshold: 0.09,
            velocity_decay: 0.9,
        }
    }
}

impl Default for GestureProfile {
    fn default() -> Self {
        Self::balanced()
    }
}

impl Default for ExplodeConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.1,
            max_distance: 0.8,
            decay_step: 0.02,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl GestureConfig {
    /// The currently selected profile.
    pub fn active(&self) -> HoloResult<&GestureProfile> {
        self.profiles.get(&self.profile).ok_or_else(|| {
            HoloError::config(format!(
                "Unknown gesture profile '{}'. Available: {}",
                self.profile,
                self.profile_names().join(", ")
            ))
        })
    }

    /// Names of all configured profiles, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: &Path) -> HoloResult<Self> {
        if !path.exists() {
            return Err(HoloError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            profile = %config.gestures.profile,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, path: &Path) -> HoloResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Switch the active gesture profile.
    pub fn set_profile(&mut self, name: &str) -> HoloResult<()> {
        if !self.gestures.profiles.contains_key(name) {
            tracing::warn!(
                profile = name,
                available = ?self.gestures.profile_names(),
                "Unknown gesture profile"
            );
            return Err(HoloError::config(format!("Unknown gesture profile '{name}'")));
        }
        self.gestures.profile = name.to_string();
        tracing::info!(profile = name, "Switched gesture profile");
        Ok(())
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> HoloResult<()> {
        if self.server.fps_limit == 0 {
            return Err(HoloError::config("server.fps_limit must be positive"));
        }
        if self.server.idle_timeout_secs == 0 {
            return Err(HoloError::config("server.idle_timeout_secs must be positive"));
        }
        if self.server.client_queue_capacity == 0 {
            return Err(HoloError::config(
                "server.client_queue_capacity must be positive",
            ));
        }
        if self.preview.every_n_frames == 0 {
            return Err(HoloError::config("preview.every_n_frames must be positive"));
        }
        if self.kalman.process_noise < 0.0 || self.kalman.measurement_noise <= 0.0 {
            return Err(HoloError::config(
                "kalman noise must be non-negative (measurement noise strictly positive)",
            ));
        }
        if self.explode.max_distance <= self.explode.min_distance {
            return Err(HoloError::config(
                "explode.max_distance must exceed explode.min_distance",
            ));
        }
        if self.explode.decay_step < 0.0 {
            return Err(HoloError::config("explode.decay_step must be non-negative"));
        }

        for (name, profile) in &self.gestures.profiles {
            if !(0.0..1.0).contains(&profile.smooth) {
                return Err(HoloError::config(format!(
                    "profile '{name}': smooth must be in [0, 1)"
                )));
            }
            if !(0.0..1.0).contains(&profile.velocity_decay) {
                return Err(HoloError::config(format!(
                    "profile '{name}': velocity_decay must be in [0, 1)"
                )));
            }
            if profile.pinch_threshold <= 0.0 {
                return Err(HoloError::config(format!(
                    "profile '{name}': pinch_threshold must be positive"
                )));
            }
        }

        self.gestures.active()?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("holo-control").join("config.json")
}
