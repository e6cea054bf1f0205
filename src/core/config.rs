//! Controller configuration with documented constants
//!
//! Every timing and actuation constant the controller uses lives here.
//! Every field has a default, so an empty TOML file is a valid
//! configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{ReachError, Result};

/// Target used when neither the CLI nor the config file names one
pub const DEFAULT_TARGET: &str = "coke_can";

/// Upper bound for every configured duration (seconds)
pub const MAX_DURATION_SECS: f64 = 86_400.0;

/// Shortest timer period accepted (seconds)
pub const MIN_PERIOD_SECS: f64 = 0.001;

/// Upper bound for the run-loop frequency
pub const MAX_TICK_HZ: f64 = 1000.0;

/// Timestamps and sentinel values stamped onto commanded arm points
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryTiming {
    /// Time of the first commanded point (seconds)
    ///
    /// Gives the arm time to leave its current configuration before
    /// the second point is due.
    pub base_offset_secs: f64,

    /// Spacing between consecutive commanded points (seconds)
    ///
    /// Must be at least one second. Larger steps bound the joint velocity
    /// between IK solutions that ended up far apart.
    pub step_secs: f64,

    /// Effort written to every joint of every commanded point
    ///
    /// The trajectory is position-commanded; this is a torque ceiling,
    /// not a setpoint.
    pub effort_ceiling: f64,
}

impl Default for TrajectoryTiming {
    fn default() -> Self {
        Self {
            base_offset_secs: 5.0,
            step_secs: 2.0,
            effort_ceiling: 1000.0,
        }
    }
}

/// Finger apertures and timing for the gripper controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperConfig {
    /// Finger position when holding an object (0.0 = open, 1.0 = fully shut)
    pub closed: f64,
    /// Finger position while approaching
    pub open: f64,
    /// Effort applied on each finger
    pub effort: f64,
    /// Time to close after the arm trajectory settles (seconds)
    pub close_time_secs: f64,
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self {
            closed: 0.95,
            open: 0.4,
            effort: 5.0,
            close_time_secs: 2.0,
        }
    }
}

/// Timing for the fixed home/init postures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    pub arm_time_secs: f64,
    pub gripper_time_secs: f64,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            arm_time_secs: 5.0,
            gripper_time_secs: 3.0,
        }
    }
}

/// Top-level configuration for the controller node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Name (or name fragment) of the object to reach
    pub target: String,

    /// Run-loop frequency (ticks per second)
    pub tick_hz: f64,

    /// How often the "waiting for simulation" message repeats (seconds)
    pub wait_log_interval_secs: f64,

    /// Directory receiving one JSON audit file per planned path
    ///
    /// `None` disables path persistence.
    pub path_log_dir: Option<PathBuf>,

    pub timing: TrajectoryTiming,
    pub gripper: GripperConfig,
    pub posture: PostureConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            tick_hz: 10.0,
            wait_log_interval_secs: 5.0,
            path_log_dir: None,
            timing: TrajectoryTiming::default(),
            gripper: GripperConfig::default(),
            posture: PostureConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: ControllerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(ReachError::InvalidConfig("target must not be empty".into()));
        }

        if !(self.tick_hz > 0.0 && self.tick_hz <= MAX_TICK_HZ) {
            return Err(ReachError::InvalidConfig(format!(
                "tick_hz ({}) must lie in (0, {}]",
                self.tick_hz, MAX_TICK_HZ
            )));
        }
        check_secs("tick period (1 / tick_hz)", 1.0 / self.tick_hz, SecsBound::Period)?;
        check_secs(
            "wait_log_interval_secs",
            self.wait_log_interval_secs,
            SecsBound::Period,
        )?;

        // Timestamps must stay strictly increasing and joint speed bounded
        if !(self.timing.step_secs >= 1.0) {
            return Err(ReachError::InvalidConfig(format!(
                "timing.step_secs ({}) must be >= 1.0",
                self.timing.step_secs
            )));
        }
        check_secs("timing.step_secs", self.timing.step_secs, SecsBound::Period)?;
        check_secs(
            "timing.base_offset_secs",
            self.timing.base_offset_secs,
            SecsBound::NonNegative,
        )?;
        check_secs(
            "gripper.close_time_secs",
            self.gripper.close_time_secs,
            SecsBound::NonNegative,
        )?;
        check_secs(
            "posture.arm_time_secs",
            self.posture.arm_time_secs,
            SecsBound::NonNegative,
        )?;
        check_secs(
            "posture.gripper_time_secs",
            self.posture.gripper_time_secs,
            SecsBound::NonNegative,
        )?;

        let apertures = [
            ("gripper.closed", self.gripper.closed),
            ("gripper.open", self.gripper.open),
        ];
        for (label, value) in apertures {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReachError::InvalidConfig(format!(
                    "{} ({}) must lie in [0, 1]",
                    label, value
                )));
            }
        }

        Ok(())
    }
}

#[derive(Clone, Copy)]
enum SecsBound {
    /// At least `MIN_PERIOD_SECS`; used for timer periods
    Period,
    NonNegative,
}

/// A duration must be finite, within `MAX_DURATION_SECS` and above its bound;
/// NaN fails every comparison and is rejected
fn check_secs(label: &str, value: f64, bound: SecsBound) -> Result<()> {
    let above = match bound {
        SecsBound::Period => value >= MIN_PERIOD_SECS,
        SecsBound::NonNegative => value >= 0.0,
    };
    if above && value <= MAX_DURATION_SECS {
        return Ok(());
    }
    Err(ReachError::InvalidConfig(format!(
        "{} ({}) must be a finite duration of at most {} s",
        label, value, MAX_DURATION_SECS
    )))
}
