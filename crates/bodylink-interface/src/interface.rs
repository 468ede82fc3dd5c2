//! The shared per-configuration robot handle.
//!
//! One [`RobotInterface`] exists per configuration key (enforced by the
//! registry) and is shared through `Arc` by every block built on that
//! configuration. Object ownership and the transport session lifetime are
//! deliberately two separate counts: blocks initialize and terminate in
//! unspecified relative order, so the session opens on the first `retain()`
//! and closes on the last `release()` while the object itself stays alive
//! for as long as any holder keeps it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use bodylink_core::config::Configuration;
use bodylink_core::joints::{GroupLayout, JointMaps};
use bodylink_core::partition::{ModelPartitioner, PartitionDirection};

use crate::backend::{ModelBackend, ModelHandle, TransportBackend, TransportSession};
use crate::capabilities::{
    Capability, ControlLimits, ControlMode, CurrentControl, Encoders, MotorEncoders, PidControl,
    PositionControl, PositionDirect, PwmControl, TorqueControl, VelocityControl,
};
use crate::error::InterfaceError;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Capability handles obtained from the session so far. Cleared when the
/// session closes so stale handles never outlive a re-opened session.
#[derive(Default)]
struct CapabilityCache {
    control_mode: Option<Arc<dyn ControlMode>>,
    position_control: Option<Arc<dyn PositionControl>>,
    position_direct: Option<Arc<dyn PositionDirect>>,
    velocity_control: Option<Arc<dyn VelocityControl>>,
    torque_control: Option<Arc<dyn TorqueControl>>,
    pwm_control: Option<Arc<dyn PwmControl>>,
    current_control: Option<Arc<dyn CurrentControl>>,
    encoders: Option<Arc<dyn Encoders>>,
    motor_encoders: Option<Arc<dyn MotorEncoders>>,
    control_limits: Option<Arc<dyn ControlLimits>>,
    pid_control: Option<Arc<dyn PidControl>>,
}

impl CapabilityCache {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Default)]
struct SessionState {
    retain_count: usize,
    session: Option<Arc<dyn TransportSession>>,
    cache: CapabilityCache,
}

// ---------------------------------------------------------------------------
// RobotInterface
// ---------------------------------------------------------------------------

/// Shared handle to one robot: the loaded reduced model, the joint maps, and
/// a reference-counted transport session.
pub struct RobotInterface {
    config: Configuration,
    joint_maps: Arc<JointMaps>,
    model: Arc<dyn ModelHandle>,
    transport: Arc<dyn TransportBackend>,
    session: Mutex<SessionState>,
}

impl RobotInterface {
    /// Construct an interface for `config`.
    ///
    /// Performs, in order: configuration validation, reduced model loading,
    /// native joint list discovery per hardware group, joint map
    /// construction. The persistent transport session is *not* opened here;
    /// that is deferred to the first [`retain`](Self::retain).
    pub fn new(
        config: Configuration,
        model_backend: &dyn ModelBackend,
        transport: Arc<dyn TransportBackend>,
    ) -> Result<Self, InterfaceError> {
        config.validate()?;

        let model = model_backend.load_model(&config.model_file, &config.controlled_joints)?;

        // Discovery may open transient connections to the single groups; the
        // session spanning all of them comes later.
        let mut layouts = Vec::with_capacity(config.hardware_groups.len());
        for group in &config.hardware_groups {
            let joints = transport
                .joint_names(&config.robot_name, group)
                .map_err(|source| InterfaceError::Discovery {
                    group: group.clone(),
                    source,
                })?;
            layouts.push(GroupLayout::new(group.clone(), joints));
        }

        let joint_maps = JointMaps::build(&config.controlled_joints, &layouts)?;

        Ok(Self {
            config,
            joint_maps: Arc::new(joint_maps),
            model,
            transport,
            session: Mutex::new(SessionState::default()),
        })
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // LIFECYCLE
    // =========

    /// Increment the session open-count, opening the transport session on
    /// the 0→1 transition.
    ///
    /// On failure the count is left unchanged and no partial session is
    /// kept, so a later `retain()` can try again.
    pub fn retain(&self) -> Result<(), InterfaceError> {
        let mut state = self.state();
        if state.retain_count == 0 {
            let session = self
                .transport
                .open_session(&self.config)
                .map_err(InterfaceError::SessionOpen)?;
            debug!(key = %self.config.key, "transport session opened");
            state.session = Some(session);
        }
        state.retain_count += 1;
        Ok(())
    }

    /// Decrement the session open-count, closing the transport session on
    /// the 1→0 transition.
    ///
    /// A release without a matching retain is a no-op, so a block's
    /// terminate path can call this unconditionally even when its
    /// initialize only partially succeeded.
    pub fn release(&self) {
        let mut state = self.state();
        match state.retain_count {
            0 => {}
            1 => {
                state.cache.clear();
                state.session = None;
                state.retain_count = 0;
                debug!(key = %self.config.key, "transport session closed");
            }
            _ => state.retain_count -= 1,
        }
    }

    /// Whether the transport session is currently open.
    pub fn session_open(&self) -> bool {
        self.state().session.is_some()
    }

    /// Current session open-count.
    pub fn retain_count(&self) -> usize {
        self.state().retain_count
    }

    // ACCESSORS
    // =========

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn joint_maps(&self) -> Arc<JointMaps> {
        self.joint_maps.clone()
    }

    pub fn model(&self) -> Arc<dyn ModelHandle> {
        self.model.clone()
    }

    pub fn dofs(&self) -> usize {
        self.config.dofs()
    }

    /// Partitioner over this interface's joint maps.
    pub fn partitioner(&self, direction: PartitionDirection) -> ModelPartitioner {
        ModelPartitioner::new(self.joint_maps.clone(), direction)
    }

    // TYPED INTERFACES
    // ================

    /// Shared lazy lookup: return the cached handle if present, otherwise
    /// ask the open session and cache the result.
    fn capability<T: ?Sized>(
        &self,
        which: Capability,
        slot: impl Fn(&mut CapabilityCache) -> &mut Option<Arc<T>>,
        view: impl Fn(&dyn TransportSession) -> Option<Arc<T>>,
    ) -> Result<Arc<T>, InterfaceError> {
        let mut state = self.state();

        let Some(session) = state.session.clone() else {
            return Err(InterfaceError::SessionNotOpen);
        };

        if let Some(handle) = slot(&mut state.cache).as_ref() {
            return Ok(handle.clone());
        }

        let handle =
            view(session.as_ref()).ok_or(InterfaceError::InterfaceUnavailable(which))?;
        *slot(&mut state.cache) = Some(handle.clone());
        Ok(handle)
    }

    pub fn control_mode(&self) -> Result<Arc<dyn ControlMode>, InterfaceError> {
        self.capability(Capability::ControlMode, |c| &mut c.control_mode, |s| {
            s.control_mode()
        })
    }

    pub fn position_control(&self) -> Result<Arc<dyn PositionControl>, InterfaceError> {
        self.capability(
            Capability::PositionControl,
            |c| &mut c.position_control,
            |s| s.position_control(),
        )
    }

    pub fn position_direct(&self) -> Result<Arc<dyn PositionDirect>, InterfaceError> {
        self.capability(
            Capability::PositionDirect,
            |c| &mut c.position_direct,
            |s| s.position_direct(),
        )
    }

    pub fn velocity_control(&self) -> Result<Arc<dyn VelocityControl>, InterfaceError> {
        self.capability(
            Capability::VelocityControl,
            |c| &mut c.velocity_control,
            |s| s.velocity_control(),
        )
    }

    pub fn torque_control(&self) -> Result<Arc<dyn TorqueControl>, InterfaceError> {
        self.capability(
            Capability::TorqueControl,
            |c| &mut c.torque_control,
            |s| s.torque_control(),
        )
    }

    pub fn pwm_control(&self) -> Result<Arc<dyn PwmControl>, InterfaceError> {
        self.capability(Capability::PwmControl, |c| &mut c.pwm_control, |s| {
            s.pwm_control()
        })
    }

    pub fn current_control(&self) -> Result<Arc<dyn CurrentControl>, InterfaceError> {
        self.capability(
            Capability::CurrentControl,
            |c| &mut c.current_control,
            |s| s.current_control(),
        )
    }

    pub fn encoders(&self) -> Result<Arc<dyn Encoders>, InterfaceError> {
        self.capability(Capability::Encoders, |c| &mut c.encoders, |s| s.encoders())
    }

    pub fn motor_encoders(&self) -> Result<Arc<dyn MotorEncoders>, InterfaceError> {
        self.capability(
            Capability::MotorEncoders,
            |c| &mut c.motor_encoders,
            |s| s.motor_encoders(),
        )
    }

    pub fn control_limits(&self) -> Result<Arc<dyn ControlLimits>, InterfaceError> {
        self.capability(
            Capability::ControlLimits,
            |c| &mut c.control_limits,
            |s| s.control_limits(),
        )
    }

    pub fn pid_control(&self) -> Result<Arc<dyn PidControl>, InterfaceError> {
        self.capability(Capability::PidControl, |c| &mut c.pid_control, |s| {
            s.pid_control()
        })
    }
}

impl std::fmt::Debug for RobotInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("RobotInterface")
            .field("key", &self.config.key)
            .field("dofs", &self.config.dofs())
            .field("retain_count", &state.retain_count)
            .field("session_open", &state.session.is_some())
            .finish_non_exhaustive()
    }
}
