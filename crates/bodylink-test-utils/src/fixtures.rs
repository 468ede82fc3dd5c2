//! Shared fixtures: a three-joint robot split across two hardware groups.
//!
//! Group `cb1` exposes `[j1, j3, jX]` and group `cb2` exposes `[j2]`; the
//! controlled subset is `[j1, j2, j3]`, so `jX` is hardware-only and the
//! expected slots are j1→(0,0), j3→(0,1), j2→(1,0).

use bodylink_core::config::Configuration;

use crate::mocks::{MockModelBackend, MockTransportBackend};

/// Configuration for the three-joint robot, registered under `key`.
pub fn three_joint_config(key: impl Into<String>) -> Configuration {
    Configuration {
        key: key.into(),
        robot_name: "icub".into(),
        model_file: "model.urdf".into(),
        port_prefix: "/bodylink".into(),
        controlled_joints: vec!["j1".into(), "j2".into(), "j3".into()],
        hardware_groups: vec!["cb1".into(), "cb2".into()],
        gravity: [0.0, 0.0, -9.81],
    }
}

/// Model backend knowing exactly the three controlled joints.
pub fn three_joint_model() -> MockModelBackend {
    MockModelBackend::new()
        .with_joint("j1")
        .with_joint("j2")
        .with_joint("j3")
}

/// Transport backend exposing the two hardware groups.
pub fn three_joint_transport() -> MockTransportBackend {
    MockTransportBackend::new()
        .with_group("cb1", &["j1", "j3", "jX"])
        .with_group("cb2", &["j2"])
}
