//! Vector partitioning between the model index space and the per-group
//! hardware index spaces.
//!
//! This is a pure gather/scatter over [`JointMaps`]: no numeric transform,
//! no locking, no I/O. It runs on the simulation's per-sample output path,
//! so the `*_into` variants reuse caller-provided buffers and allocate
//! nothing. Every index used is in range by construction of the maps;
//! mismatched buffer lengths are caller contract violations and panic.

use std::sync::Arc;

use crate::joints::JointMaps;

/// Routing direction, the partitioner block's single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionDirection {
    /// One model-ordered vector in, one vector per hardware group out.
    VectorToGroups,
    /// One vector per hardware group in, one model-ordered vector out.
    GroupsToVector,
}

/// Fans a model-ordered vector out to per-group vectors, or merges them back.
///
/// Round-trip guarantee: `to_vector(to_groups(v)) == v` element-for-element
/// for any maps that were built successfully.
#[derive(Debug, Clone)]
pub struct ModelPartitioner {
    maps: Arc<JointMaps>,
    direction: PartitionDirection,
}

impl ModelPartitioner {
    pub fn new(maps: Arc<JointMaps>, direction: PartitionDirection) -> Self {
        Self { maps, direction }
    }

    pub fn direction(&self) -> PartitionDirection {
        self.direction
    }

    pub fn joint_maps(&self) -> &JointMaps {
        &self.maps
    }

    /// Freshly allocated per-group output buffers, one per hardware group,
    /// sized by the group's controlled joint count.
    pub fn group_buffers(&self) -> Vec<Vec<f64>> {
        self.maps
            .group_sizes()
            .iter()
            .map(|&size| vec![0.0; size])
            .collect()
    }

    /// Scatter a model-ordered vector into per-group vectors.
    pub fn to_groups(&self, input: &[f64]) -> Vec<Vec<f64>> {
        let mut out = self.group_buffers();
        self.scatter_into(input, &mut out);
        out
    }

    /// Scatter into caller-provided buffers (allocation-free hot path).
    ///
    /// # Panics
    /// Panics if `input.len() != dofs` or the output buffers do not match
    /// the group layout.
    pub fn scatter_into(&self, input: &[f64], out: &mut [Vec<f64>]) {
        assert_eq!(input.len(), self.maps.dofs(), "input length != dofs");
        assert_eq!(
            out.len(),
            self.maps.group_count(),
            "output buffer count != group count"
        );
        for (g, buffer) in out.iter().enumerate() {
            assert_eq!(
                buffer.len(),
                self.maps.group_size(g),
                "output buffer {g} length != group size"
            );
        }

        for (model_index, &value) in input.iter().enumerate() {
            let slot = self.maps.slot_of_model_index(model_index);
            out[slot.group][slot.index] = value;
        }
    }

    /// Merge per-group vectors into a model-ordered vector.
    pub fn to_vector(&self, groups: &[Vec<f64>]) -> Vec<f64> {
        let mut out = vec![0.0; self.maps.dofs()];
        self.gather_into(groups, &mut out);
        out
    }

    /// Merge into a caller-provided buffer (allocation-free hot path).
    ///
    /// # Panics
    /// Panics if the input buffers do not match the group layout or
    /// `out.len() != dofs`.
    pub fn gather_into(&self, groups: &[Vec<f64>], out: &mut [f64]) {
        assert_eq!(
            groups.len(),
            self.maps.group_count(),
            "input buffer count != group count"
        );
        for (g, buffer) in groups.iter().enumerate() {
            assert_eq!(
                buffer.len(),
                self.maps.group_size(g),
                "input buffer {g} length != group size"
            );
        }
        assert_eq!(out.len(), self.maps.dofs(), "output length != dofs");

        for (model_index, value) in out.iter_mut().enumerate() {
            let slot = self.maps.slot_of_model_index(model_index);
            *value = groups[slot.group][slot.index];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joints::GroupLayout;

    fn joints(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn scenario_maps() -> Arc<JointMaps> {
        Arc::new(
            JointMaps::build(
                &joints(&["j1", "j2", "j3"]),
                &[
                    GroupLayout::new("cb1", joints(&["j1", "j3", "jX"])),
                    GroupLayout::new("cb2", joints(&["j2"])),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn scenario_scatter() {
        // v = [10, 20, 30] for (j1, j2, j3) → cb1 gets [10, 30], cb2 [20].
        let partitioner =
            ModelPartitioner::new(scenario_maps(), PartitionDirection::VectorToGroups);
        let groups = partitioner.to_groups(&[10.0, 20.0, 30.0]);
        assert_eq!(groups, vec![vec![10.0, 30.0], vec![20.0]]);
    }

    #[test]
    fn scenario_gather() {
        let partitioner =
            ModelPartitioner::new(scenario_maps(), PartitionDirection::GroupsToVector);
        let v = partitioner.to_vector(&[vec![10.0, 30.0], vec![20.0]]);
        assert_eq!(v, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn round_trip_is_exact() {
        // gather(scatter(v)) == v element-wise.
        let maps = Arc::new(
            JointMaps::build(
                &joints(&["a", "b", "c", "d", "e"]),
                &[
                    GroupLayout::new("g0", joints(&["x", "c", "a"])),
                    GroupLayout::new("g1", joints(&["e", "b", "d", "y"])),
                ],
            )
            .unwrap(),
        );
        let partitioner = ModelPartitioner::new(maps, PartitionDirection::VectorToGroups);

        let v: Vec<f64> = (0..5).map(|i| f64::from(i) * 1.5 - 2.0).collect();
        let round_tripped = partitioner.to_vector(&partitioner.to_groups(&v));
        assert_eq!(round_tripped, v);
    }

    #[test]
    fn into_variants_reuse_buffers() {
        let partitioner =
            ModelPartitioner::new(scenario_maps(), PartitionDirection::VectorToGroups);
        let mut groups = partitioner.group_buffers();
        let mut merged = vec![0.0; 3];

        partitioner.scatter_into(&[1.0, 2.0, 3.0], &mut groups);
        partitioner.gather_into(&groups, &mut merged);
        assert_eq!(merged, vec![1.0, 2.0, 3.0]);

        // Second sample through the same buffers.
        partitioner.scatter_into(&[4.0, 5.0, 6.0], &mut groups);
        partitioner.gather_into(&groups, &mut merged);
        assert_eq!(merged, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn group_buffers_match_layout() {
        let partitioner =
            ModelPartitioner::new(scenario_maps(), PartitionDirection::VectorToGroups);
        let buffers = partitioner.group_buffers();
        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers[0].len(), 2);
        assert_eq!(buffers[1].len(), 1);
    }

    #[test]
    fn unused_group_gets_empty_buffer() {
        let maps = Arc::new(
            JointMaps::build(
                &joints(&["j1"]),
                &[
                    GroupLayout::new("cb1", joints(&["j1"])),
                    GroupLayout::new("cb_unused", joints(&["other"])),
                ],
            )
            .unwrap(),
        );
        let partitioner = ModelPartitioner::new(maps, PartitionDirection::VectorToGroups);
        let groups = partitioner.to_groups(&[7.0]);
        assert_eq!(groups, vec![vec![7.0], vec![]]);
        assert_eq!(partitioner.to_vector(&groups), vec![7.0]);
    }

    #[test]
    #[should_panic(expected = "input length != dofs")]
    fn scatter_rejects_wrong_input_length() {
        let partitioner =
            ModelPartitioner::new(scenario_maps(), PartitionDirection::VectorToGroups);
        let mut groups = partitioner.group_buffers();
        partitioner.scatter_into(&[1.0, 2.0], &mut groups);
    }

    #[test]
    #[should_panic(expected = "input buffer count != group count")]
    fn gather_rejects_wrong_group_count() {
        let partitioner =
            ModelPartitioner::new(scenario_maps(), PartitionDirection::GroupsToVector);
        let mut out = vec![0.0; 3];
        partitioner.gather_into(&[vec![1.0, 2.0]], &mut out);
    }

    #[test]
    fn direction_flag_is_exposed() {
        let partitioner =
            ModelPartitioner::new(scenario_maps(), PartitionDirection::GroupsToVector);
        assert_eq!(
            partitioner.direction(),
            PartitionDirection::GroupsToVector
        );
        assert_eq!(partitioner.joint_maps().dofs(), 3);
    }
}
