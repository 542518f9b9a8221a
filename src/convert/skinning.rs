use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use super::types::TDA_ARM_CORRECTIONS;
use crate::config::{ConversionConfig, SkeletonFormat};
use crate::correction::{
    blend_skin_matrices, local_pose_matrix, matrix_translation, skin_matrix, skin_normal,
    skin_position,
};
use crate::error::{ConvertError, Result};
use crate::hierarchy::compute_world_matrices;
use crate::pmx::{PmxBone, PmxVertex};

// ─── Binding pose fix ─────────────────────────────────────────────────────────

/// Apply the TDA arm-angle rebind when the configuration asks for it.
///
/// Returns whether the model was rebound.
pub(super) fn apply_binding_pose_fix(
    bones: &mut [PmxBone],
    vertices: &mut [PmxVertex],
    config: &ConversionConfig,
) -> Result<bool> {
    if !config.fix_tda_binding_pose {
        return Ok(false);
    }

    match config.skeleton_format {
        Some(SkeletonFormat::Mmd) if config.translate_bone_names_to_mmd => {
            fix_tda_bones_and_vertices(bones, vertices)?;
            Ok(true)
        }
        Some(SkeletonFormat::Mmd) | Some(SkeletonFormat::Native) => Ok(false),
        None => Err(ConvertError::UnsupportedConfiguration(
            "a skeleton format must be chosen to fix the binding pose".to_string(),
        )),
    }
}

/// Pose both upper arms by ±34.5° about Z and bake that pose as the new rest pose.
pub(super) fn fix_tda_bones_and_vertices(
    bones: &mut [PmxBone],
    vertices: &mut [PmxVertex],
) -> Result<()> {
    for (name, degrees) in TDA_ARM_CORRECTIONS {
        let arm = bones
            .iter_mut()
            .find(|bone| bone.name == name)
            .ok_or_else(|| ConvertError::MissingBone {
                what: "arm",
                name: name.to_string(),
            })?;
        arm.current_rotation = UnitQuaternion::from_euler_angles(0.0, 0.0, degrees.to_radians());
    }

    rebind_rest_pose(bones, vertices)
}

/// Bake the current bone pose into the rest pose.
///
/// Bones are posed by forward kinematics from their rest positions and pose
/// rotations; vertices are deformed by linear blend skinning and afterwards
/// every bone's rest position is its posed world position and its pose
/// rotation is identity. Vertices without influences stay where they are.
pub(super) fn rebind_rest_pose(bones: &mut [PmxBone], vertices: &mut [PmxVertex]) -> Result<()> {
    let parents: Vec<Option<usize>> = bones.iter().map(|bone| bone.parent_index).collect();
    if let Some((index, parent)) = parents
        .iter()
        .enumerate()
        .find_map(|(index, parent)| parent.filter(|p| *p >= bones.len()).map(|p| (index, p)))
    {
        return Err(ConvertError::DanglingBoneReference {
            site: format!("parent of bone '{}'", bones[index].name),
            index: parent,
            bone_count: bones.len(),
        });
    }

    let locals: Vec<Matrix4<f32>> = bones
        .iter()
        .map(|bone| {
            let parent_rest = bone
                .parent_index
                .map(|parent| bones[parent].initial_position)
                .unwrap_or_else(Vector3::zeros);
            local_pose_matrix(bone.initial_position, parent_rest, bone.current_rotation)
        })
        .collect();
    let worlds = compute_world_matrices(&locals, &parents)?;
    let skins: Vec<Matrix4<f32>> = worlds
        .iter()
        .zip(bones.iter())
        .map(|(world, bone)| skin_matrix(*world, bone.initial_position))
        .collect();

    for (v, vertex) in vertices.iter_mut().enumerate() {
        if vertex.weights().next().is_none() {
            continue;
        }

        let mut influences = Vec::with_capacity(4);
        for (slot, weight) in vertex.bone_weights.iter().enumerate() {
            let Some(weight) = weight else {
                continue;
            };
            let skin = skins
                .get(weight.bone_index)
                .ok_or_else(|| ConvertError::DanglingBoneReference {
                    site: format!("vertex #{} slot {}", v, slot),
                    index: weight.bone_index,
                    bone_count: bones.len(),
                })?;
            influences.push((skin, weight.weight));
        }

        let blended = blend_skin_matrices(influences);
        vertex.position = skin_position(vertex.position, &blended);
        vertex.normal = skin_normal(vertex.normal, &blended);
    }

    for (bone, world) in bones.iter_mut().zip(&worlds) {
        let posed = matrix_translation(world);
        bone.initial_position = posed;
        bone.current_position = posed;
        bone.current_rotation = UnitQuaternion::identity();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector2;

    use super::*;
    use crate::pmx::{BoneFlags, BoneTail, BoneWeight, Deformation};

    fn bone(name: &str, parent: Option<usize>, position: Vector3<f32>) -> PmxBone {
        PmxBone {
            name: name.to_string(),
            name_english: String::new(),
            initial_position: position,
            current_position: position,
            initial_rotation: UnitQuaternion::identity(),
            current_rotation: UnitQuaternion::identity(),
            parent_index: parent,
            bone_index: 0,
            tail: BoneTail::Bone(None),
            flags: BoneFlags::default(),
            level: 0,
            ik: None,
            append_parent: None,
        }
    }

    fn vertex(position: Vector3<f32>, weights: &[(usize, f32)]) -> PmxVertex {
        let mut bone_weights = [None; 4];
        for (slot, (bone_index, weight)) in weights.iter().enumerate() {
            bone_weights[slot] = Some(BoneWeight {
                bone_index: *bone_index,
                weight: *weight,
            });
        }
        PmxVertex {
            position,
            normal: Vector3::new(0.0, 1.0, 0.0),
            uv: Vector2::zeros(),
            edge_scale: 1.0,
            deformation: Deformation::from_influence_count(weights.len())
                .unwrap_or(Deformation::None),
            bone_weights,
        }
    }

    /// Shoulders at (±1, 10, 0), arms at (±2, 10, 0), hands at (±4, 10, 0).
    fn arms_rig() -> Vec<PmxBone> {
        vec![
            bone("上半身", None, Vector3::new(0.0, 10.0, 0.0)),
            bone("左肩", Some(0), Vector3::new(1.0, 10.0, 0.0)),
            bone("左腕", Some(1), Vector3::new(2.0, 10.0, 0.0)),
            bone("左手首", Some(2), Vector3::new(4.0, 10.0, 0.0)),
            bone("右肩", Some(0), Vector3::new(-1.0, 10.0, 0.0)),
            bone("右腕", Some(4), Vector3::new(-2.0, 10.0, 0.0)),
            bone("右手首", Some(5), Vector3::new(-4.0, 10.0, 0.0)),
        ]
    }

    fn tda_config() -> ConversionConfig {
        ConversionConfig {
            fix_tda_binding_pose: true,
            ..ConversionConfig::default()
        }
    }

    #[test]
    fn given_tda_fix_when_rebinding_then_arm_children_orbit_the_arm() {
        let mut bones = arms_rig();
        let mut vertices = vec![vertex(Vector3::new(4.0, 10.0, 0.0), &[(2, 1.0)])];

        let fixed = apply_binding_pose_fix(&mut bones, &mut vertices, &tda_config())
            .expect("rebind should succeed");

        assert!(fixed);
        let angle = (-34.5f32).to_radians();
        let expected_hand = Vector3::new(2.0 + 2.0 * angle.cos(), 10.0 + 2.0 * angle.sin(), 0.0);
        assert!((bones[3].initial_position - expected_hand).norm() < 1e-4);
        assert_eq!(bones[3].current_position, bones[3].initial_position);
        assert!((vertices[0].position - expected_hand).norm() < 1e-4);
        // The arm's own pivot and unrelated bones stay put.
        assert!((bones[2].initial_position - Vector3::new(2.0, 10.0, 0.0)).norm() < 1e-5);
        assert!((bones[0].initial_position - Vector3::new(0.0, 10.0, 0.0)).norm() < 1e-5);
        // Right arm is mirrored and drops the same way.
        assert!((bones[6].initial_position.y - expected_hand.y).abs() < 1e-4);
        assert!((vertices[0].normal.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn given_rebind_when_applied_twice_then_pose_is_baked_again() {
        let mut bones = arms_rig();
        let mut vertices = vec![vertex(Vector3::new(4.0, 10.0, 0.0), &[(2, 1.0)])];

        fix_tda_bones_and_vertices(&mut bones, &mut vertices).expect("first rebind");
        let once = vertices[0].position;
        fix_tda_bones_and_vertices(&mut bones, &mut vertices).expect("second rebind");

        assert!((vertices[0].position - once).norm() > 0.1);
    }

    #[test]
    fn given_rebind_when_applied_then_weights_are_untouched() {
        let mut bones = arms_rig();
        let mut vertices = vec![
            vertex(Vector3::new(3.0, 10.0, 0.0), &[(2, 0.25), (1, 0.75)]),
            vertex(Vector3::new(0.0, 11.0, 0.0), &[]),
        ];
        let before: Vec<_> = vertices
            .iter()
            .map(|v| (v.deformation, v.bone_weights))
            .collect();

        fix_tda_bones_and_vertices(&mut bones, &mut vertices).expect("rebind should succeed");

        let after: Vec<_> = vertices
            .iter()
            .map(|v| (v.deformation, v.bone_weights))
            .collect();
        assert_eq!(before, after);
        assert_eq!(vertices[1].position, Vector3::new(0.0, 11.0, 0.0));
    }

    #[test]
    fn given_native_skeleton_when_fixing_pose_then_nothing_changes() {
        let mut bones = arms_rig();
        let mut vertices = vec![vertex(Vector3::new(4.0, 10.0, 0.0), &[(2, 1.0)])];
        let config = ConversionConfig {
            skeleton_format: Some(SkeletonFormat::Native),
            ..tda_config()
        };

        let fixed = apply_binding_pose_fix(&mut bones, &mut vertices, &config)
            .expect("native format should be accepted");

        assert!(!fixed);
        assert_eq!(bones, arms_rig());
    }

    #[test]
    fn given_no_skeleton_format_when_fixing_pose_then_configuration_error() {
        let mut bones = arms_rig();
        let config = ConversionConfig {
            skeleton_format: None,
            ..tda_config()
        };

        let result = apply_binding_pose_fix(&mut bones, &mut [], &config);

        assert!(matches!(
            result,
            Err(ConvertError::UnsupportedConfiguration(_))
        ));
    }

    #[test]
    fn given_missing_arm_when_fixing_pose_then_error_is_returned() {
        let mut bones = arms_rig();
        bones.truncate(4);

        let result = fix_tda_bones_and_vertices(&mut bones, &mut []);

        assert_eq!(
            result,
            Err(ConvertError::MissingBone {
                what: "arm",
                name: "右腕".to_string()
            })
        );
    }
}
