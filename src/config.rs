//! Configuration for the free-space backup behavior.
//!
//! Every key is optional; missing keys take the defaults below.
//!
//! ```toml
//! global_frame = "map"
//! robot_radius = 0.1
//! max_radius = 1.0
//! service_name = "local_costmap/get_costmap"
//! free_threshold = 5
//! visualize = false
//! transform_tolerance = 0.1
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Parameters of the free-space backup behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Frame poses are looked up in.
    pub global_frame: String,
    /// Robot radius [m].
    pub robot_radius: f64,
    /// How far rays are cast when searching for free space [m].
    pub max_radius: f64,
    /// Name of the costmap service to fetch snapshots from.
    pub service_name: String,
    /// Read and reported, but the free-space scan always uses the lethal threshold.
    pub free_threshold: u8,
    /// Publish target and arc markers.
    pub visualize: bool,
    /// Pose lookup tolerance [s].
    pub transform_tolerance: f64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        BackupConfig {
            global_frame: "map".to_string(),
            robot_radius: 0.1,
            max_radius: 1.0,
            service_name: "local_costmap/get_costmap".to_string(),
            free_threshold: 5,
            visualize: false,
            transform_tolerance: 0.1,
        }
    }
}

impl BackupConfig {
    /// Load and validate a TOML file.
    ///
    /// # Errors
    ///
    /// - `ConfigError::FileNotFound` if the file cannot be read
    /// - `ConfigError::ParseError` if TOML syntax or types are invalid
    /// - `ConfigError::ValidationError` if [`validate`](Self::validate) fails
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BackupConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no behavior can run with.
    ///
    /// `max_radius < robot_radius` is not an error; it is clamped at configure time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("robot_radius", self.robot_radius),
            ("max_radius", self.max_radius),
            ("transform_tolerance", self.transform_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.global_frame.is_empty() {
            return Err(ConfigError::ValidationError(
                "global_frame cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Raise `max_radius` to `robot_radius` if it is smaller. Returns whether it changed.
    pub fn clamp_max_radius(&mut self) -> bool {
        if self.max_radius < self.robot_radius {
            self.max_radius = self.robot_radius;
            return true;
        }
        false
    }

    pub fn transform_tolerance(&self) -> Duration {
        Duration::from_secs_f64(self.transform_tolerance.max(0.0))
    }
}
