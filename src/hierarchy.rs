//! Bone hierarchy built from the flat skeleton arrays.

use nalgebra::{Matrix4, Translation3, UnitQuaternion, Vector3};

use crate::config::ConversionConfig;
use crate::coords::{to_pmx_position, to_pmx_rotation};
use crate::correction::matrix_translation;
use crate::error::{ConvertError, Result};
use crate::source::SourceAvatar;

/// One bone of the hierarchy, addressed by its skeleton index.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneNode {
    pub index: usize,
    /// Display path, e.g. `"MODEL_00/BASE/KOSHI"`.
    pub path: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Local translation in PMX space (scaled).
    pub local_position: Vector3<f32>,
    /// Local rotation in PMX space.
    pub local_rotation: UnitQuaternion<f32>,
    /// World-space rest position in PMX space (scaled).
    pub world_position: Vector3<f32>,
}

/// Arena of [`BoneNode`]s in skeleton order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneHierarchy {
    pub nodes: Vec<BoneNode>,
}

impl BoneHierarchy {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `node`, in skeleton order.
    pub fn children_of<'a>(&'a self, node: &'a BoneNode) -> impl Iterator<Item = &'a BoneNode> {
        node.children
            .iter()
            .filter_map(|&child| self.nodes.get(child))
    }
}

/// Build the bone hierarchy of an avatar.
///
/// Local transforms are converted into PMX space here; world rest positions
/// are composed parent-first.
pub fn build_hierarchy(avatar: &SourceAvatar, config: &ConversionConfig) -> Result<BoneHierarchy> {
    let skeleton = &avatar.skeleton;
    let transforms = &avatar.pose.transforms;

    if skeleton.nodes.len() != skeleton.node_ids.len() {
        return Err(ConvertError::InvalidSourceData(format!(
            "skeleton has {} nodes but {} node ids",
            skeleton.nodes.len(),
            skeleton.node_ids.len()
        )));
    }
    if transforms.len() != skeleton.len() {
        return Err(ConvertError::InvalidSourceData(format!(
            "skeleton has {} bones but the pose has {} transforms",
            skeleton.len(),
            transforms.len()
        )));
    }

    let scale = config.position_scale();
    let mut nodes = Vec::with_capacity(skeleton.len());

    for (index, (node, bone_id)) in skeleton.nodes.iter().zip(&skeleton.node_ids).enumerate() {
        if let Some(parent) = node.parent
            && parent >= skeleton.len()
        {
            return Err(ConvertError::InvalidSourceData(format!(
                "bone #{} has parent #{} outside the skeleton",
                index, parent
            )));
        }

        let path = avatar
            .bone_names
            .get(bone_id)
            .cloned()
            .ok_or(ConvertError::UnnamedBone { bone_id: *bone_id })?;

        let transform = &transforms[index];
        nodes.push(BoneNode {
            index,
            path,
            parent: node.parent,
            children: Vec::new(),
            local_position: to_pmx_position(transform.translation, scale),
            local_rotation: to_pmx_rotation(transform.rotation),
            world_position: Vector3::zeros(),
        });
    }

    let root_count = nodes.iter().filter(|node| node.parent.is_none()).count();
    if !nodes.is_empty() && root_count != 1 {
        return Err(ConvertError::InvalidSourceData(format!(
            "skeleton must have exactly one root bone (found {})",
            root_count
        )));
    }

    for index in 0..nodes.len() {
        if let Some(parent) = nodes[index].parent {
            nodes[parent].children.push(index);
        }
    }

    let locals: Vec<Matrix4<f32>> = nodes
        .iter()
        .map(|node| {
            Translation3::from(node.local_position).to_homogeneous()
                * node.local_rotation.to_homogeneous()
        })
        .collect();
    let parents: Vec<Option<usize>> = nodes.iter().map(|node| node.parent).collect();
    let worlds = compute_world_matrices(&locals, &parents)?;

    for (node, world) in nodes.iter_mut().zip(&worlds) {
        node.world_position = matrix_translation(world);
    }

    Ok(BoneHierarchy { nodes })
}

/// Compute world matrices from local transforms and parent links.
pub(crate) fn compute_world_matrices(
    local_matrices: &[Matrix4<f32>],
    parents: &[Option<usize>],
) -> Result<Vec<Matrix4<f32>>> {
    let mut worlds = vec![Matrix4::<f32>::identity(); local_matrices.len()];
    let mut resolved = vec![false; local_matrices.len()];

    for index in 0..local_matrices.len() {
        if resolved[index] {
            continue;
        }

        // Walk up to the first resolved ancestor, then resolve back down.
        let mut chain = vec![index];
        let mut current = index;
        while let Some(parent) = parents[current] {
            if resolved[parent] {
                break;
            }
            if chain.contains(&parent) {
                return Err(ConvertError::InvalidSourceData(format!(
                    "bone #{} is part of a parent cycle",
                    parent
                )));
            }
            chain.push(parent);
            current = parent;
        }

        for &node in chain.iter().rev() {
            worlds[node] = match parents[node] {
                Some(parent) => worlds[parent] * local_matrices[node],
                None => local_matrices[node],
            };
            resolved[node] = true;
        }
    }

    Ok(worlds)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::source::{SkeletonNode, SourcePose, SourceSkeleton, SourceTransform};

    fn avatar(parents: &[Option<usize>], transforms: Vec<SourceTransform>) -> SourceAvatar {
        let node_ids: Vec<u32> = (0..parents.len() as u32).map(|i| 100 + i).collect();
        let bone_names: HashMap<u32, String> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, if i == 0 { String::new() } else { format!("B{i}") }))
            .collect();

        SourceAvatar {
            name: "test".to_string(),
            skeleton: SourceSkeleton {
                nodes: parents
                    .iter()
                    .map(|parent| SkeletonNode { parent: *parent })
                    .collect(),
                node_ids,
            },
            pose: SourcePose { transforms },
            bone_names,
        }
    }

    fn translated(x: f32, y: f32, z: f32) -> SourceTransform {
        SourceTransform {
            translation: Vector3::new(x, y, z),
            ..SourceTransform::default()
        }
    }

    #[test]
    fn given_chain_when_building_then_world_positions_accumulate_in_pmx_space() {
        let avatar = avatar(
            &[None, Some(0), Some(1)],
            vec![
                translated(0.0, 0.0, 0.0),
                translated(1.0, 1.0, 0.0),
                translated(0.0, 1.0, 0.5),
            ],
        );

        let hierarchy =
            build_hierarchy(&avatar, &ConversionConfig::minimal()).expect("hierarchy should build");

        assert_eq!(hierarchy.nodes[0].children, vec![1]);
        assert_eq!(hierarchy.nodes[2].parent, Some(1));
        assert!((hierarchy.nodes[2].world_position - Vector3::new(-1.0, 2.0, 0.5)).norm() < 1e-5);
    }

    #[test]
    fn given_rotated_parent_when_building_then_child_position_is_rotated() {
        let mut parent = translated(0.0, 1.0, 0.0);
        parent.rotation = UnitQuaternion::from_euler_angles(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        let avatar = avatar(&[None, Some(0)], vec![parent, translated(0.0, 0.0, 1.0)]);

        let hierarchy =
            build_hierarchy(&avatar, &ConversionConfig::minimal()).expect("hierarchy should build");

        // Source: rotate (0,0,1) by +90° about Y -> (1,0,0); plus (0,1,0) -> (1,1,0).
        // PMX mirrors X.
        assert!((hierarchy.nodes[1].world_position - Vector3::new(-1.0, 1.0, 0.0)).norm() < 1e-5);
    }

    #[test]
    fn given_pose_length_mismatch_when_building_then_error_is_returned() {
        let avatar = avatar(&[None, Some(0)], vec![SourceTransform::default()]);
        let result = build_hierarchy(&avatar, &ConversionConfig::minimal());
        assert!(matches!(result, Err(ConvertError::InvalidSourceData(_))));
    }

    #[test]
    fn given_unnamed_bone_when_building_then_error_is_returned() {
        let mut avatar = avatar(&[None], vec![SourceTransform::default()]);
        avatar.bone_names.clear();
        let result = build_hierarchy(&avatar, &ConversionConfig::minimal());
        assert_eq!(result, Err(ConvertError::UnnamedBone { bone_id: 100 }));
    }

    #[test]
    fn given_parent_cycle_when_building_then_error_is_returned() {
        let avatar = avatar(
            &[None, Some(2), Some(1)],
            vec![SourceTransform::default(); 3],
        );
        let result = build_hierarchy(&avatar, &ConversionConfig::minimal());
        assert!(matches!(result, Err(ConvertError::InvalidSourceData(_))));
    }
}
