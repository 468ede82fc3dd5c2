//! The closed set of typed control and sensor interfaces a transport session
//! can expose: one object-safe trait per capability.
//!
//! All joint vectors are `f64` in model index order — the open session
//! already remaps axes to the controlled joint ordering, so the partitioner
//! stays the only place where hardware-group indices appear. Reading methods
//! fill caller-provided buffers to keep the per-sample path allocation-free.

use std::fmt;

use crate::backend::TransportError;

pub type TransportResult<T> = Result<T, TransportError>;

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// Identifies one capability, for diagnostics and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ControlMode,
    PositionControl,
    PositionDirect,
    VelocityControl,
    TorqueControl,
    PwmControl,
    CurrentControl,
    Encoders,
    MotorEncoders,
    ControlLimits,
    PidControl,
}

impl Capability {
    /// All capabilities, in a stable order.
    pub const ALL: [Self; 11] = [
        Self::ControlMode,
        Self::PositionControl,
        Self::PositionDirect,
        Self::VelocityControl,
        Self::TorqueControl,
        Self::PwmControl,
        Self::CurrentControl,
        Self::Encoders,
        Self::MotorEncoders,
        Self::ControlLimits,
        Self::PidControl,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::ControlMode => "control mode",
            Self::PositionControl => "position control",
            Self::PositionDirect => "direct position control",
            Self::VelocityControl => "velocity control",
            Self::TorqueControl => "torque control",
            Self::PwmControl => "PWM control",
            Self::CurrentControl => "current control",
            Self::Encoders => "encoders",
            Self::MotorEncoders => "motor encoders",
            Self::ControlLimits => "control limits",
            Self::PidControl => "PID control",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Value types
// ---------------------------------------------------------------------------

/// Per-joint control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlModeKind {
    #[default]
    Idle,
    Position,
    PositionDirect,
    Velocity,
    Torque,
    Pwm,
    Current,
}

/// Low-level PID gains for one joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Switch the control mode of the joints.
pub trait ControlMode: Send + Sync {
    /// Set one mode per joint, in model order.
    fn set_control_modes(&self, modes: &[ControlModeKind]) -> TransportResult<()>;

    fn control_modes(&self) -> TransportResult<Vec<ControlModeKind>>;
}

/// Trajectory-generated position control.
pub trait PositionControl: Send + Sync {
    /// Move to `refs` (rad) through the firmware trajectory generator.
    fn position_move(&self, refs: &[f64]) -> TransportResult<()>;

    /// Reference speeds (rad/s) used by the trajectory generator.
    fn set_ref_speeds(&self, speeds: &[f64]) -> TransportResult<()>;
}

/// Streaming position control, no trajectory generation.
pub trait PositionDirect: Send + Sync {
    fn set_positions(&self, refs: &[f64]) -> TransportResult<()>;
}

/// Velocity control.
pub trait VelocityControl: Send + Sync {
    fn velocity_move(&self, refs: &[f64]) -> TransportResult<()>;
}

/// Joint torque control and measurement.
pub trait TorqueControl: Send + Sync {
    fn set_ref_torques(&self, refs: &[f64]) -> TransportResult<()>;

    fn torques(&self, out: &mut [f64]) -> TransportResult<()>;
}

/// Raw PWM duty-cycle control and measurement.
pub trait PwmControl: Send + Sync {
    fn set_ref_duty_cycles(&self, refs: &[f64]) -> TransportResult<()>;

    fn duty_cycles(&self, out: &mut [f64]) -> TransportResult<()>;
}

/// Motor current control and measurement.
pub trait CurrentControl: Send + Sync {
    fn set_ref_currents(&self, refs: &[f64]) -> TransportResult<()>;

    fn currents(&self, out: &mut [f64]) -> TransportResult<()>;
}

/// Joint encoder readings.
pub trait Encoders: Send + Sync {
    fn positions(&self, out: &mut [f64]) -> TransportResult<()>;

    fn velocities(&self, out: &mut [f64]) -> TransportResult<()>;

    fn accelerations(&self, out: &mut [f64]) -> TransportResult<()>;
}

/// Motor-side encoder readings (before the transmission).
pub trait MotorEncoders: Send + Sync {
    fn motor_positions(&self, out: &mut [f64]) -> TransportResult<()>;
}

/// Joint position limits.
pub trait ControlLimits: Send + Sync {
    /// `(min, max)` position limits (rad) for one joint, by model index.
    fn limits(&self, joint: usize) -> TransportResult<(f64, f64)>;
}

/// Low-level PID configuration.
pub trait PidControl: Send + Sync {
    fn set_pid(&self, joint: usize, gains: PidGains) -> TransportResult<()>;

    fn pid(&self, joint: usize) -> TransportResult<PidGains>;
}
