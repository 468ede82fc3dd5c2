//! Index maps between the model joint ordering and the hardware-group joint
//! ordering.
//!
//! The model index space is defined by the configuration's ordered
//! `controlled_joints` list. Each hardware group exposes its own native joint
//! list; the subset of native joints that are also controlled gets dense
//! per-group indices in the order the hardware exposes them. [`JointMaps`]
//! holds both directions of that mapping and is rebuilt whenever a robot
//! interface is constructed.

use std::collections::HashMap;

use tracing::warn;

use crate::error::MapError;

/// One discovered hardware group: its name and native joint list, in the
/// order the transport exposes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    pub name: String,
    pub joints: Vec<String>,
}

impl GroupLayout {
    pub fn new(name: impl Into<String>, joints: Vec<String>) -> Self {
        Self {
            name: name.into(),
            joints,
        }
    }
}

/// Position of a joint inside the hardware layout: which group carries it
/// and its index within that group's *controlled subset* (not the group's
/// full native joint count).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupSlot {
    pub group: usize,
    pub index: usize,
}

/// Read-only index maps between model order and hardware-group order.
///
/// Invariants, guaranteed by [`JointMaps::build`]:
/// - every controlled joint has exactly one slot;
/// - per group, the slot indices are a dense `0..group_size` permutation;
/// - the group sizes sum to the number of controlled joints.
#[derive(Debug, Clone, PartialEq)]
pub struct JointMaps {
    model_index: HashMap<String, usize>,
    group_of: HashMap<String, GroupSlot>,
    /// Slot per model index; the hot-path lookup table (no string hashing).
    slots: Vec<GroupSlot>,
    group_sizes: Vec<usize>,
}

impl JointMaps {
    /// Build the maps from the controlled joint list and the discovered
    /// group layouts, scanning groups and their native lists in order.
    ///
    /// Fails with [`MapError::JointNotFound`] when a controlled joint is
    /// absent from every group, and with [`MapError::AmbiguousJoint`] when a
    /// controlled joint is exposed by more than one group (the dense
    /// per-group index ranges could not be kept otherwise). Native joints
    /// that are not controlled are silently excluded: that is the joint
    /// subset feature. Nothing is published on failure.
    pub fn build(controlled_joints: &[String], groups: &[GroupLayout]) -> Result<Self, MapError> {
        let model_index: HashMap<String, usize> = controlled_joints
            .iter()
            .enumerate()
            .map(|(i, joint)| (joint.clone(), i))
            .collect();

        let mut group_of: HashMap<String, GroupSlot> =
            HashMap::with_capacity(controlled_joints.len());
        let mut group_sizes = vec![0usize; groups.len()];

        for (g, layout) in groups.iter().enumerate() {
            let mut assigned = 0usize;
            for name in &layout.joints {
                if !model_index.contains_key(name.as_str()) {
                    // Hardware-only joint: excluded by the subset selection.
                    continue;
                }
                if let Some(previous) = group_of.get(name.as_str()) {
                    return Err(MapError::AmbiguousJoint {
                        joint: name.clone(),
                        first: groups[previous.group].name.clone(),
                        second: layout.name.clone(),
                    });
                }
                group_of.insert(
                    name.clone(),
                    GroupSlot {
                        group: g,
                        index: assigned,
                    },
                );
                assigned += 1;
            }
            if assigned == 0 {
                warn!(
                    group = %layout.name,
                    "hardware group exposes no controlled joint; it might be unused"
                );
            }
            group_sizes[g] = assigned;
        }

        let mut slots = Vec::with_capacity(controlled_joints.len());
        for joint in controlled_joints {
            match group_of.get(joint.as_str()) {
                Some(slot) => slots.push(*slot),
                None => return Err(MapError::JointNotFound(joint.clone())),
            }
        }

        Ok(Self {
            model_index,
            group_of,
            slots,
            group_sizes,
        })
    }

    /// Number of controlled degrees of freedom.
    pub fn dofs(&self) -> usize {
        self.slots.len()
    }

    /// Number of hardware groups, including groups that carry no controlled
    /// joint.
    pub fn group_count(&self) -> usize {
        self.group_sizes.len()
    }

    /// Number of controlled joints carried by group `group`.
    ///
    /// # Panics
    /// Panics if `group` is out of range.
    pub fn group_size(&self, group: usize) -> usize {
        self.group_sizes[group]
    }

    pub fn group_sizes(&self) -> &[usize] {
        &self.group_sizes
    }

    /// Model index of a controlled joint, by name.
    pub fn model_index_of(&self, joint: &str) -> Option<usize> {
        self.model_index.get(joint).copied()
    }

    /// Hardware slot of a controlled joint, by name.
    pub fn slot_of(&self, joint: &str) -> Option<GroupSlot> {
        self.group_of.get(joint).copied()
    }

    /// Hardware slot of a controlled joint, by model index.
    ///
    /// # Panics
    /// Panics if `index >= dofs()`.
    pub fn slot_of_model_index(&self, index: usize) -> GroupSlot {
        self.slots[index]
    }

    /// All slots, indexed by model index.
    pub fn slots(&self) -> &[GroupSlot] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joints(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    /// The worked example: cb1 exposes [j1, j3, jX], cb2 exposes [j2], and
    /// the controlled subset is [j1, j2, j3].
    fn scenario_maps() -> JointMaps {
        JointMaps::build(
            &joints(&["j1", "j2", "j3"]),
            &[
                GroupLayout::new("cb1", joints(&["j1", "j3", "jX"])),
                GroupLayout::new("cb2", joints(&["j2"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn scenario_slots() {
        let maps = scenario_maps();
        assert_eq!(maps.slot_of("j1"), Some(GroupSlot { group: 0, index: 0 }));
        assert_eq!(maps.slot_of("j3"), Some(GroupSlot { group: 0, index: 1 }));
        assert_eq!(maps.slot_of("j2"), Some(GroupSlot { group: 1, index: 0 }));
    }

    #[test]
    fn scenario_group_sizes() {
        let maps = scenario_maps();
        assert_eq!(maps.group_sizes(), &[2, 1]);
        assert_eq!(maps.group_size(0), 2);
        assert_eq!(maps.group_size(1), 1);
        assert_eq!(maps.group_count(), 2);
        assert_eq!(maps.dofs(), 3);
    }

    #[test]
    fn scenario_model_indices() {
        let maps = scenario_maps();
        assert_eq!(maps.model_index_of("j1"), Some(0));
        assert_eq!(maps.model_index_of("j2"), Some(1));
        assert_eq!(maps.model_index_of("j3"), Some(2));
    }

    #[test]
    fn hardware_only_joint_excluded() {
        let maps = scenario_maps();
        assert_eq!(maps.model_index_of("jX"), None);
        assert_eq!(maps.slot_of("jX"), None);
    }

    #[test]
    fn slots_by_model_index_match_names() {
        let maps = scenario_maps();
        assert_eq!(maps.slot_of_model_index(0), maps.slot_of("j1").unwrap());
        assert_eq!(maps.slot_of_model_index(1), maps.slot_of("j2").unwrap());
        assert_eq!(maps.slot_of_model_index(2), maps.slot_of("j3").unwrap());
    }

    #[test]
    fn every_joint_mapped_exactly_once_with_dense_indices() {
        // For each group, the indices form exactly {0, .., size-1}.
        let controlled = joints(&["a", "b", "c", "d", "e"]);
        let maps = JointMaps::build(
            &controlled,
            &[
                GroupLayout::new("g0", joints(&["x", "c", "a", "y"])),
                GroupLayout::new("g1", joints(&["e", "b", "d"])),
            ],
        )
        .unwrap();

        assert_eq!(maps.group_sizes().iter().sum::<usize>(), maps.dofs());

        for g in 0..maps.group_count() {
            let mut indices: Vec<usize> = controlled
                .iter()
                .filter_map(|j| maps.slot_of(j))
                .filter(|slot| slot.group == g)
                .map(|slot| slot.index)
                .collect();
            indices.sort_unstable();
            let expected: Vec<usize> = (0..maps.group_size(g)).collect();
            assert_eq!(indices, expected, "group {g} indices are not dense");
        }
    }

    #[test]
    fn per_group_indices_follow_hardware_order() {
        // g0 exposes c before a, so c gets index 0 even though a has the
        // lower model index.
        let maps = JointMaps::build(
            &joints(&["a", "c"]),
            &[GroupLayout::new("g0", joints(&["c", "a"]))],
        )
        .unwrap();
        assert_eq!(maps.slot_of("c"), Some(GroupSlot { group: 0, index: 0 }));
        assert_eq!(maps.slot_of("a"), Some(GroupSlot { group: 0, index: 1 }));
    }

    #[test]
    fn missing_joint_fails_closed() {
        // A controlled joint absent from every group aborts construction.
        let result = JointMaps::build(
            &joints(&["j1", "ghost"]),
            &[GroupLayout::new("cb1", joints(&["j1", "j2"]))],
        );
        match result {
            Err(MapError::JointNotFound(j)) => assert_eq!(j, "ghost"),
            other => panic!("expected JointNotFound, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_joint_rejected() {
        let result = JointMaps::build(
            &joints(&["j1", "j2"]),
            &[
                GroupLayout::new("cb1", joints(&["j1", "j2"])),
                GroupLayout::new("cb2", joints(&["j2"])),
            ],
        );
        match result {
            Err(MapError::AmbiguousJoint {
                joint,
                first,
                second,
            }) => {
                assert_eq!(joint, "j2");
                assert_eq!(first, "cb1");
                assert_eq!(second, "cb2");
            }
            other => panic!("expected AmbiguousJoint, got {other:?}"),
        }
    }

    #[test]
    fn unused_group_is_allowed() {
        // A group that carries no controlled joint stays in the layout with
        // size zero; only a warning is emitted.
        let maps = JointMaps::build(
            &joints(&["j1"]),
            &[
                GroupLayout::new("cb1", joints(&["j1"])),
                GroupLayout::new("cb_unused", joints(&["other"])),
            ],
        )
        .unwrap();
        assert_eq!(maps.group_count(), 2);
        assert_eq!(maps.group_sizes(), &[1, 0]);
    }

    #[test]
    fn single_group_covers_all_joints() {
        let maps = JointMaps::build(
            &joints(&["j1", "j2", "j3"]),
            &[GroupLayout::new("cb", joints(&["j3", "j1", "j2"]))],
        )
        .unwrap();
        assert_eq!(maps.group_sizes(), &[3]);
        assert_eq!(maps.slot_of("j3"), Some(GroupSlot { group: 0, index: 0 }));
        assert_eq!(maps.slot_of("j1"), Some(GroupSlot { group: 0, index: 1 }));
        assert_eq!(maps.slot_of("j2"), Some(GroupSlot { group: 0, index: 2 }));
    }
}
