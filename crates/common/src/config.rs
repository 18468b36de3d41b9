//! Engine configuration.
//!
//! Recognized keys use camelCase (`fixedStep`, `maxSubStepsPerFrame`,
//! `gravity`, `maxFrameDelta`, ...). Files are YAML or JSON, chosen by
//! extension. Unknown keys are rejected.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config extension: {0:?}")]
    UnsupportedExtension(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Sleeping heuristic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SleepConfig {
    /// Linear speed (m/s) below which a body counts as resting.
    pub linear_threshold: f32,
    /// Angular speed (rad/s) below which a body counts as resting.
    pub angular_threshold: f32,
    /// Consecutive resting sub-steps before the body falls asleep. Zero
    /// disables sleeping.
    pub steps: u32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            linear_threshold: 0.8,
            angular_threshold: 1.0,
            // Two seconds at the default 60 Hz step.
            steps: 120,
        }
    }
}

/// Top-level configuration for the simulation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    /// Fixed physics step `h`, in seconds.
    pub fixed_step: f64,
    /// Upper bound on physics sub-steps per displayed frame.
    pub max_sub_steps_per_frame: u32,
    pub gravity: Vec3,
    /// Upper bound on a single frame's measured delta, in seconds.
    pub max_frame_delta: f64,
    pub sleep: SleepConfig,
    pub solver_iterations: u32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Edge length of a broad-phase grid cell.
    pub broadphase_cell_size: f32,
    /// Capacity of the cross-thread handoff queue.
    pub handoff_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_step: 1.0 / 60.0,
            max_sub_steps_per_frame: 8,
            gravity: Vec3::new(0.0, -10.0, 0.0),
            max_frame_delta: 0.25,
            sleep: SleepConfig::default(),
            solver_iterations: 8,
            linear_damping: 0.0,
            angular_damping: 0.0,
            broadphase_cell_size: 4.0,
            handoff_capacity: 1024,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = std::fs::read_to_string(path)?;
        match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&text),
            "json" => Self::from_json_str(&text),
            other => Err(ConfigError::UnsupportedExtension(other.to_string())),
        }
    }

    /// Fixed step as `f32`, the precision physics integrates in.
    pub fn step_f32(&self) -> f32 {
        self.fixed_step as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_step.is_finite() && self.fixed_step > 0.0) {
            return Err(invalid("fixedStep", "must be a positive number of seconds"));
        }
        if self.max_sub_steps_per_frame == 0 {
            return Err(invalid("maxSubStepsPerFrame", "must be at least 1"));
        }
        if !self.gravity.is_finite() {
            return Err(invalid("gravity", "must be finite"));
        }
        if !(self.max_frame_delta.is_finite() && self.max_frame_delta > 0.0) {
            return Err(invalid("maxFrameDelta", "must be a positive number of seconds"));
        }
        if !(self.sleep.linear_threshold >= 0.0 && self.sleep.angular_threshold >= 0.0) {
            return Err(invalid("sleep", "thresholds must be non-negative"));
        }
        if self.solver_iterations == 0 {
            return Err(invalid("solverIterations", "must be at least 1"));
        }
        if !(self.linear_damping >= 0.0 && self.angular_damping >= 0.0) {
            return Err(invalid("damping", "must be non-negative"));
        }
        if !(self.broadphase_cell_size.is_finite() && self.broadphase_cell_size > 0.0) {
            return Err(invalid("broadphaseCellSize", "must be positive"));
        }
        if self.handoff_capacity == 0 {
            return Err(invalid("handoffCapacity", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_sub_steps_per_frame, 8);
        assert_eq!(config.sleep.steps, 120);
    }

    #[test]
    fn yaml_uses_camel_case_keys() {
        let config = EngineConfig::from_yaml_str(
            "fixedStep: 0.01\nmaxSubStepsPerFrame: 4\ngravity: [0.0, -9.8, 0.0]\nmaxFrameDelta: 0.1\n",
        )
        .unwrap();
        assert_eq!(config.fixed_step, 0.01);
        assert_eq!(config.max_sub_steps_per_frame, 4);
        assert_eq!(config.gravity, Vec3::new(0.0, -9.8, 0.0));
        // Unspecified keys keep their defaults.
        assert_eq!(config.solver_iterations, 8);
    }

    #[test]
    fn json_with_nested_sleep() {
        let config = EngineConfig::from_json_str(
            r#"{"fixedStep": 0.02, "sleep": {"linearThreshold": 0.1, "steps": 10}}"#,
        )
        .unwrap();
        assert_eq!(config.sleep.linear_threshold, 0.1);
        assert_eq!(config.sleep.steps, 10);
        assert_eq!(config.sleep.angular_threshold, 1.0);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(EngineConfig::from_yaml_str("fixedStepp: 0.01\n").is_err());
    }

    #[test]
    fn invalid_values_rejected() {
        let err = EngineConfig::from_yaml_str("fixedStep: 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "fixedStep", .. }));
        let err = EngineConfig::from_yaml_str("maxSubStepsPerFrame: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "maxSubStepsPerFrame",
                ..
            }
        ));
    }

    #[test]
    fn load_by_extension() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "maxFrameDelta: 0.5").unwrap();
        let config = EngineConfig::load(yaml.path()).unwrap();
        assert_eq!(config.max_frame_delta, 0.5);

        let txt = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            EngineConfig::load(txt.path()),
            Err(ConfigError::UnsupportedExtension(_))
        ));
    }
}
