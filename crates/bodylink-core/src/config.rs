use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_gravity() -> [f64; 3] {
    [0.0, 0.0, -9.81]
}

/// Immutable description of one robot interface: which model file, which
/// joint subset, and which hardware transport groups to aggregate.
///
/// The order of `controlled_joints` is significant: it defines the model
/// index space every joint map and partitioned vector refers to. Equality
/// compares every field and is used by the registry to distinguish a no-op
/// re-registration from an override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Stable identity token supplied by the caller (typically the owning
    /// block's name); the registry cache key.
    pub key: String,

    /// Robot name, used as the namespace prefix of the hardware groups.
    pub robot_name: String,

    /// Path of the robot model file.
    pub model_file: String,

    /// Prefix for the ports the transport session opens locally.
    pub port_prefix: String,

    /// Joint subset, in the order that defines the model index space.
    pub controlled_joints: Vec<String>,

    /// Hardware transport group names, in scan order.
    pub hardware_groups: Vec<String>,

    /// Gravity vector [x, y, z] in m/s² (default: [0, 0, -9.81]).
    #[serde(default = "default_gravity")]
    pub gravity: [f64; 3],
}

impl Configuration {
    /// Number of controlled degrees of freedom.
    pub fn dofs(&self) -> usize {
        self.controlled_joints.len()
    }

    /// Validate the configuration. Returns Err on any empty field or a
    /// duplicated controlled joint name.
    ///
    /// Hardware-group membership of the controlled joints is deliberately
    /// not checked here: that requires the discovered group layouts and is
    /// reported distinctly by joint map construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.is_empty() {
            return Err(ConfigError::EmptyField("key"));
        }
        if self.robot_name.is_empty() {
            return Err(ConfigError::EmptyField("robot_name"));
        }
        if self.model_file.is_empty() {
            return Err(ConfigError::EmptyField("model_file"));
        }
        if self.port_prefix.is_empty() {
            return Err(ConfigError::EmptyField("port_prefix"));
        }
        if self.controlled_joints.is_empty() {
            return Err(ConfigError::EmptyField("controlled_joints"));
        }
        if self.hardware_groups.is_empty() {
            return Err(ConfigError::EmptyField("hardware_groups"));
        }

        let mut seen = HashSet::with_capacity(self.controlled_joints.len());
        for joint in &self.controlled_joints {
            if !seen.insert(joint.as_str()) {
                return Err(ConfigError::DuplicateControlledJoint(joint.clone()));
            }
        }

        Ok(())
    }

    /// Load and validate a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
