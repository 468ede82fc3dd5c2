//! Traits for the two external collaborators: the rigid-body model library
//! and the hardware transport layer.
//!
//! Real implementations wrap the vendor libraries; `bodylink-test-utils`
//! provides mocks. [`RobotInterface`](crate::interface::RobotInterface) only
//! ever talks to these traits.

use std::sync::Arc;

use thiserror::Error;

use bodylink_core::config::Configuration;

use crate::capabilities::{
    ControlLimits, ControlMode, CurrentControl, Encoders, MotorEncoders, PidControl,
    PositionControl, PositionDirect, PwmControl, TorqueControl, VelocityControl,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The model backend rejected a model file or joint subset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to load model '{file}': {reason}")]
pub struct ModelLoadError {
    pub file: String,
    pub reason: String,
}

/// Hardware transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Hardware group '{0}' not found")]
    GroupNotFound(String),

    #[error("Transport rejected the request: {0}")]
    Rejected(String),

    #[error("Transport backend failure: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Model backend
// ---------------------------------------------------------------------------

/// A rigid-body model computation handle, reduced to the controlled joints.
pub trait ModelHandle: Send + Sync {
    /// Joint names of the loaded reduced model, in model order.
    fn joint_names(&self) -> &[String];

    /// Internal degrees of freedom of the reduced model.
    fn dofs(&self) -> usize {
        self.joint_names().len()
    }
}

/// Loads rigid-body models from file, restricted to a joint subset.
pub trait ModelBackend: Send + Sync {
    fn load_model(
        &self,
        file: &str,
        controlled_joints: &[String],
    ) -> Result<Arc<dyn ModelHandle>, ModelLoadError>;
}

// ---------------------------------------------------------------------------
// Transport backend
// ---------------------------------------------------------------------------

/// An open connection spanning all hardware groups of one configuration.
///
/// Each getter returns `None` when the underlying transport does not support
/// that capability. The session closes when the last `Arc` to it drops;
/// [`RobotInterface`](crate::interface::RobotInterface) drops its session and
/// every cached capability handle on the last `release()`.
pub trait TransportSession: Send + Sync {
    fn control_mode(&self) -> Option<Arc<dyn ControlMode>>;
    fn position_control(&self) -> Option<Arc<dyn PositionControl>>;
    fn position_direct(&self) -> Option<Arc<dyn PositionDirect>>;
    fn velocity_control(&self) -> Option<Arc<dyn VelocityControl>>;
    fn torque_control(&self) -> Option<Arc<dyn TorqueControl>>;
    fn pwm_control(&self) -> Option<Arc<dyn PwmControl>>;
    fn current_control(&self) -> Option<Arc<dyn CurrentControl>>;
    fn encoders(&self) -> Option<Arc<dyn Encoders>>;
    fn motor_encoders(&self) -> Option<Arc<dyn MotorEncoders>>;
    fn control_limits(&self) -> Option<Arc<dyn ControlLimits>>;
    fn pid_control(&self) -> Option<Arc<dyn PidControl>>;
}

/// Discovers hardware group layouts and opens transport sessions.
pub trait TransportBackend: Send + Sync {
    /// Native joint names of one hardware group, in hardware order.
    ///
    /// May open a transient connection to the group; must not leave a
    /// persistent session behind.
    fn joint_names(&self, robot_name: &str, group: &str) -> Result<Vec<String>, TransportError>;

    /// Open the persistent session spanning all hardware groups of `config`,
    /// with axes remapped to `controlled_joints` order.
    fn open_session(&self, config: &Configuration)
        -> Result<Arc<dyn TransportSession>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_load_error_display() {
        let err = ModelLoadError {
            file: "model.urdf".into(),
            reason: "joint 'ghost' not present in the model".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load model 'model.urdf': joint 'ghost' not present in the model"
        );
    }

    #[test]
    fn transport_error_display() {
        assert_eq!(
            TransportError::GroupNotFound("left_arm".into()).to_string(),
            "Hardware group 'left_arm' not found"
        );
        assert_eq!(
            TransportError::Rejected("busy".into()).to_string(),
            "Transport rejected the request: busy"
        );
        assert_eq!(
            TransportError::Backend("socket closed".into()).to_string(),
            "Transport backend failure: socket closed"
        );
    }

    #[test]
    fn errors_are_clone_and_eq() {
        let err = TransportError::GroupNotFound("torso".into());
        assert_eq!(err.clone(), err);
    }
}
