//! In-memory mock implementations of the backend traits.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bodylink_core::config::Configuration;
use bodylink_interface::backend::{
    ModelBackend, ModelHandle, ModelLoadError, TransportBackend, TransportError, TransportSession,
};
use bodylink_interface::capabilities::{
    Capability, ControlLimits, ControlMode, ControlModeKind, CurrentControl, Encoders,
    MotorEncoders, PidControl, PidGains, PositionControl, PositionDirect, PwmControl,
    TorqueControl, TransportResult, VelocityControl,
};

// ---------------------------------------------------------------------------
// Model backend
// ---------------------------------------------------------------------------

struct MockModelHandle {
    joints: Vec<String>,
}

impl ModelHandle for MockModelHandle {
    fn joint_names(&self) -> &[String] {
        &self.joints
    }
}

/// Mock model loader. By default it accepts any joint subset; restrict it
/// with [`with_joint`](Self::with_joint) to reject joints outside a known
/// set, or make every load fail with [`failing`](Self::failing).
#[derive(Default)]
pub struct MockModelBackend {
    known_joints: Option<Vec<String>>,
    fail: bool,
}

impl MockModelBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `joint` to the set of joints the mock model contains. Once any
    /// joint is added, loads requesting a joint outside the set fail.
    pub fn with_joint(mut self, joint: impl Into<String>) -> Self {
        self.known_joints
            .get_or_insert_with(Vec::new)
            .push(joint.into());
        self
    }

    /// Make every load fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl ModelBackend for MockModelBackend {
    fn load_model(
        &self,
        file: &str,
        controlled_joints: &[String],
    ) -> Result<Arc<dyn ModelHandle>, ModelLoadError> {
        if self.fail {
            return Err(ModelLoadError {
                file: file.to_string(),
                reason: "mock model backend configured to fail".to_string(),
            });
        }
        if let Some(known) = &self.known_joints {
            for joint in controlled_joints {
                if !known.contains(joint) {
                    return Err(ModelLoadError {
                        file: file.to_string(),
                        reason: format!("joint '{joint}' not present in the model"),
                    });
                }
            }
        }
        Ok(Arc::new(MockModelHandle {
            joints: controlled_joints.to_vec(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Transport backend
// ---------------------------------------------------------------------------

struct MockGroup {
    name: String,
    joints: Vec<String>,
}

/// Mock hardware transport: an ordered list of groups with fixed native
/// joint lists, plus counters for session opens and closes.
pub struct MockTransportBackend {
    groups: Vec<MockGroup>,
    supported: HashSet<Capability>,
    fail_open: AtomicBool,
    open_count: AtomicUsize,
    close_count: Arc<AtomicUsize>,
    last_session: Mutex<Option<Weak<MockSession>>>,
}

impl Default for MockTransportBackend {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            supported: Capability::ALL.into_iter().collect(),
            fail_open: AtomicBool::new(false),
            open_count: AtomicUsize::new(0),
            close_count: Arc::new(AtomicUsize::new(0)),
            last_session: Mutex::new(None),
        }
    }
}

impl MockTransportBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hardware group exposing `joints` in the given order.
    pub fn with_group(mut self, name: impl Into<String>, joints: &[&str]) -> Self {
        self.groups.push(MockGroup {
            name: name.into(),
            joints: joints.iter().map(|s| (*s).to_string()).collect(),
        });
        self
    }

    /// Remove one capability from the sessions this backend opens.
    pub fn without_capability(mut self, capability: Capability) -> Self {
        self.supported.remove(&capability);
        self
    }

    /// Make subsequent [`open_session`](TransportBackend::open_session)
    /// calls fail (or succeed again).
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Number of sessions opened so far.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Number of sessions dropped so far.
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// The most recently opened session, while it is still alive.
    pub fn last_session(&self) -> Option<Arc<MockSession>> {
        self.last_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

impl TransportBackend for MockTransportBackend {
    fn joint_names(&self, _robot_name: &str, group: &str) -> Result<Vec<String>, TransportError> {
        self.groups
            .iter()
            .find(|g| g.name == group)
            .map(|g| g.joints.clone())
            .ok_or_else(|| TransportError::GroupNotFound(group.to_string()))
    }

    fn open_session(
        &self,
        config: &Configuration,
    ) -> Result<Arc<dyn TransportSession>, TransportError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(TransportError::Backend(
                "mock transport configured to fail".to_string(),
            ));
        }

        let dofs = config.dofs();
        let close_count = self.close_count.clone();
        let supported = self.supported.clone();
        let session = Arc::new_cyclic(|this| MockSession {
            this: this.clone(),
            supported,
            dofs,
            state: Mutex::new(MockJointState::new(dofs)),
            close_count,
        });

        self.open_count.fetch_add(1, Ordering::SeqCst);
        *self
            .last_session
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::downgrade(&session));
        Ok(session)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-joint state held by a [`MockSession`], all vectors in model order.
#[derive(Debug, Clone, PartialEq)]
pub struct MockJointState {
    pub modes: Vec<ControlModeKind>,
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
    pub accelerations: Vec<f64>,
    pub torques: Vec<f64>,
    pub duty_cycles: Vec<f64>,
    pub currents: Vec<f64>,
    pub motor_positions: Vec<f64>,
    pub ref_speeds: Vec<f64>,
    pub limits: Vec<(f64, f64)>,
    pub pids: Vec<PidGains>,
    pub last_position_refs: Option<Vec<f64>>,
    pub last_velocity_refs: Option<Vec<f64>>,
    pub last_torque_refs: Option<Vec<f64>>,
}

impl MockJointState {
    fn new(dofs: usize) -> Self {
        Self {
            modes: vec![ControlModeKind::Idle; dofs],
            positions: vec![0.0; dofs],
            velocities: vec![0.0; dofs],
            accelerations: vec![0.0; dofs],
            torques: vec![0.0; dofs],
            duty_cycles: vec![0.0; dofs],
            currents: vec![0.0; dofs],
            motor_positions: vec![0.0; dofs],
            ref_speeds: vec![0.0; dofs],
            limits: vec![(-std::f64::consts::PI, std::f64::consts::PI); dofs],
            pids: vec![PidGains::default(); dofs],
            last_position_refs: None,
            last_velocity_refs: None,
            last_torque_refs: None,
        }
    }
}

/// A mock transport session implementing every capability trait over a
/// single mutex-guarded joint state.
pub struct MockSession {
    this: Weak<MockSession>,
    supported: HashSet<Capability>,
    dofs: usize,
    state: Mutex<MockJointState>,
    close_count: Arc<AtomicUsize>,
}

impl MockSession {
    /// Direct access to the joint state, for assertions.
    pub fn state(&self) -> MutexGuard<'_, MockJointState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_len(&self, len: usize) -> TransportResult<()> {
        if len == self.dofs {
            Ok(())
        } else {
            Err(TransportError::Rejected(format!(
                "expected {} values, got {len}",
                self.dofs
            )))
        }
    }

    fn check_joint(&self, joint: usize) -> TransportResult<()> {
        if joint < self.dofs {
            Ok(())
        } else {
            Err(TransportError::Rejected(format!(
                "joint index {joint} out of range for {} dofs",
                self.dofs
            )))
        }
    }

    fn handle<T: ?Sized>(
        &self,
        capability: Capability,
        cast: impl FnOnce(Arc<MockSession>) -> Arc<T>,
    ) -> Option<Arc<T>> {
        if !self.supported.contains(&capability) {
            return None;
        }
        self.this.upgrade().map(cast)
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl TransportSession for MockSession {
    fn control_mode(&self) -> Option<Arc<dyn ControlMode>> {
        self.handle(Capability::ControlMode, |s| s as Arc<dyn ControlMode>)
    }

    fn position_control(&self) -> Option<Arc<dyn PositionControl>> {
        self.handle(Capability::PositionControl, |s| s as Arc<dyn PositionControl>)
    }

    fn position_direct(&self) -> Option<Arc<dyn PositionDirect>> {
        self.handle(Capability::PositionDirect, |s| s as Arc<dyn PositionDirect>)
    }

    fn velocity_control(&self) -> Option<Arc<dyn VelocityControl>> {
        self.handle(Capability::VelocityControl, |s| s as Arc<dyn VelocityControl>)
    }

    fn torque_control(&self) -> Option<Arc<dyn TorqueControl>> {
        self.handle(Capability::TorqueControl, |s| s as Arc<dyn TorqueControl>)
    }

    fn pwm_control(&self) -> Option<Arc<dyn PwmControl>> {
        self.handle(Capability::PwmControl, |s| s as Arc<dyn PwmControl>)
    }

    fn current_control(&self) -> Option<Arc<dyn CurrentControl>> {
        self.handle(Capability::CurrentControl, |s| s as Arc<dyn CurrentControl>)
    }

    fn encoders(&self) -> Option<Arc<dyn Encoders>> {
        self.handle(Capability::Encoders, |s| s as Arc<dyn Encoders>)
    }

    fn motor_encoders(&self) -> Option<Arc<dyn MotorEncoders>> {
        self.handle(Capability::MotorEncoders, |s| s as Arc<dyn MotorEncoders>)
    }

    fn control_limits(&self) -> Option<Arc<dyn ControlLimits>> {
        self.handle(Capability::ControlLimits, |s| s as Arc<dyn ControlLimits>)
    }

    fn pid_control(&self) -> Option<Arc<dyn PidControl>> {
        self.handle(Capability::PidControl, |s| s as Arc<dyn PidControl>)
    }
}

impl ControlMode for MockSession {
    fn set_control_modes(&self, modes: &[ControlModeKind]) -> TransportResult<()> {
        self.check_len(modes.len())?;
        self.state().modes.copy_from_slice(modes);
        Ok(())
    }

    fn control_modes(&self) -> TransportResult<Vec<ControlModeKind>> {
        Ok(self.state().modes.clone())
    }
}

impl PositionControl for MockSession {
    fn position_move(&self, refs: &[f64]) -> TransportResult<()> {
        self.check_len(refs.len())?;
        let mut state = self.state();
        state.last_position_refs = Some(refs.to_vec());
        state.positions.copy_from_slice(refs);
        Ok(())
    }

    fn set_ref_speeds(&self, speeds: &[f64]) -> TransportResult<()> {
        self.check_len(speeds.len())?;
        self.state().ref_speeds.copy_from_slice(speeds);
        Ok(())
    }
}

impl PositionDirect for MockSession {
    fn set_positions(&self, refs: &[f64]) -> TransportResult<()> {
        self.check_len(refs.len())?;
        let mut state = self.state();
        state.last_position_refs = Some(refs.to_vec());
        state.positions.copy_from_slice(refs);
        Ok(())
    }
}

impl VelocityControl for MockSession {
    fn velocity_move(&self, refs: &[f64]) -> TransportResult<()> {
        self.check_len(refs.len())?;
        let mut state = self.state();
        state.last_velocity_refs = Some(refs.to_vec());
        state.velocities.copy_from_slice(refs);
        Ok(())
    }
}

impl TorqueControl for MockSession {
    fn set_ref_torques(&self, refs: &[f64]) -> TransportResult<()> {
        self.check_len(refs.len())?;
        let mut state = self.state();
        state.last_torque_refs = Some(refs.to_vec());
        state.torques.copy_from_slice(refs);
        Ok(())
    }

    fn torques(&self, out: &mut [f64]) -> TransportResult<()> {
        self.check_len(out.len())?;
        out.copy_from_slice(&self.state().torques);
        Ok(())
    }
}

impl PwmControl for MockSession {
    fn set_ref_duty_cycles(&self, refs: &[f64]) -> TransportResult<()> {
        self.check_len(refs.len())?;
        self.state().duty_cycles.copy_from_slice(refs);
        Ok(())
    }

    fn duty_cycles(&self, out: &mut [f64]) -> TransportResult<()> {
        self.check_len(out.len())?;
        out.copy_from_slice(&self.state().duty_cycles);
        Ok(())
    }
}

impl CurrentControl for MockSession {
    fn set_ref_currents(&self, refs: &[f64]) -> TransportResult<()> {
        self.check_len(refs.len())?;
        self.state().currents.copy_from_slice(refs);
        Ok(())
    }

    fn currents(&self, out: &mut [f64]) -> TransportResult<()> {
        self.check_len(out.len())?;
        out.copy_from_slice(&self.state().currents);
        Ok(())
    }
}

impl Encoders for MockSession {
    fn positions(&self, out: &mut [f64]) -> TransportResult<()> {
        self.check_len(out.len())?;
        out.copy_from_slice(&self.state().positions);
        Ok(())
    }

    fn velocities(&self, out: &mut [f64]) -> TransportResult<()> {
        self.check_len(out.len())?;
        out.copy_from_slice(&self.state().velocities);
        Ok(())
    }

    fn accelerations(&self, out: &mut [f64]) -> TransportResult<()> {
        self.check_len(out.len())?;
        out.copy_from_slice(&self.state().accelerations);
        Ok(())
    }
}

impl MotorEncoders for MockSession {
    fn motor_positions(&self, out: &mut [f64]) -> TransportResult<()> {
        self.check_len(out.len())?;
        out.copy_from_slice(&self.state().motor_positions);
        Ok(())
    }
}

impl ControlLimits for MockSession {
    fn limits(&self, joint: usize) -> TransportResult<(f64, f64)> {
        self.check_joint(joint)?;
        Ok(self.state().limits[joint])
    }
}

impl PidControl for MockSession {
    fn set_pid(&self, joint: usize, gains: PidGains) -> TransportResult<()> {
        self.check_joint(joint)?;
        self.state().pids[joint] = gains;
        Ok(())
    }

    fn pid(&self, joint: usize) -> TransportResult<PidGains> {
        self.check_joint(joint)?;
        Ok(self.state().pids[joint])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fixtures::three_joint_config;

    fn open(backend: &MockTransportBackend) -> Arc<dyn TransportSession> {
        backend.open_session(&three_joint_config("t")).unwrap()
    }

    #[test]
    fn joint_names_follow_group_order() {
        let backend = MockTransportBackend::new().with_group("cb1", &["j1", "j3", "jX"]);
        assert_eq!(
            backend.joint_names("icub", "cb1").unwrap(),
            vec!["j1", "j3", "jX"]
        );
        assert!(matches!(
            backend.joint_names("icub", "nope"),
            Err(TransportError::GroupNotFound(_))
        ));
    }

    #[test]
    fn open_and_drop_are_counted() {
        let backend = MockTransportBackend::new();
        let session = open(&backend);
        assert_eq!(backend.open_count(), 1);
        assert_eq!(backend.close_count(), 0);
        drop(session);
        assert_eq!(backend.close_count(), 1);
        assert!(backend.last_session().is_none());
    }

    #[test]
    fn fail_open_is_switchable() {
        let backend = MockTransportBackend::new();
        backend.set_fail_open(true);
        assert!(backend.open_session(&three_joint_config("t")).is_err());
        assert_eq!(backend.open_count(), 0);
        backend.set_fail_open(false);
        let _session = open(&backend);
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn removed_capability_is_absent_others_remain() {
        let backend = MockTransportBackend::new().without_capability(Capability::Encoders);
        let session = open(&backend);
        assert!(session.encoders().is_none());
        assert!(session.position_control().is_some());
    }

    #[test]
    fn writes_are_visible_through_reads() {
        let backend = MockTransportBackend::new();
        let session = open(&backend);

        session
            .position_direct()
            .unwrap()
            .set_positions(&[0.1, 0.2, 0.3])
            .unwrap();

        let mut out = vec![0.0; 3];
        session.encoders().unwrap().positions(&mut out).unwrap();
        assert_eq!(out, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn wrong_vector_length_is_rejected() {
        let backend = MockTransportBackend::new();
        let session = open(&backend);
        assert!(matches!(
            session.velocity_control().unwrap().velocity_move(&[1.0]),
            Err(TransportError::Rejected(_))
        ));
    }

    #[test]
    fn pid_round_trip_per_joint() {
        let backend = MockTransportBackend::new();
        let session = open(&backend);
        let pid = session.pid_control().unwrap();

        pid.set_pid(1, PidGains::new(10.0, 0.5, 0.1)).unwrap();
        assert_eq!(pid.pid(1).unwrap(), PidGains::new(10.0, 0.5, 0.1));
        assert_eq!(pid.pid(0).unwrap(), PidGains::default());
        assert!(pid.set_pid(7, PidGains::default()).is_err());
    }
}
