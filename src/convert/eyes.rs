use std::ops::Range;

use nalgebra::Vector3;

use super::types::{
    EYE_WEIGHT_TOLERANCE, EYES_BONE_DEPTH, EYES_BONE_HEIGHT_OFFSET, EYES_MESH_NAME, Side,
    ValidationIssue,
};
use crate::error::{ConvertError, Result};
use crate::pmx::{BoneWeight, Deformation, PmxVertex};
use crate::source::SourceMesh;

/// Below this, a normal is treated as parallel to the Z axis and two slopes
/// as equal.
const RAY_EPSILON: f32 = 1e-6;

/// Vertex ranges of the two eyeballs; the first sub mesh is the left eye.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct EyeRanges {
    pub(super) left: Range<usize>,
    pub(super) right: Range<usize>,
}

impl EyeRanges {
    pub(super) fn range(&self, side: Side) -> Range<usize> {
        match side {
            Side::Left => self.left.clone(),
            Side::Right => self.right.clone(),
        }
    }
}

/// Where the synthesized eye bones go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct EyeBonePositions {
    pub(super) eyes: Vector3<f32>,
    pub(super) left: Vector3<f32>,
    pub(super) right: Vector3<f32>,
}

impl EyeBonePositions {
    pub(super) fn eye(&self, side: Side) -> Vector3<f32> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Find the two consecutive sub meshes belonging to the `"eyes"` mesh.
pub(super) fn find_eye_ranges(mesh: &SourceMesh) -> Result<EyeRanges> {
    let name_index = mesh
        .names
        .iter()
        .position(|name| name == EYES_MESH_NAME)
        .ok_or_else(|| ConvertError::MissingSubMesh {
            name: EYES_MESH_NAME.to_string(),
        })?;

    let sub_meshes: Vec<usize> = mesh
        .parent_mesh_indices
        .iter()
        .enumerate()
        .filter(|(_, parent)| **parent == name_index)
        .map(|(index, _)| index)
        .collect();

    let [first, second] = sub_meshes[..] else {
        return Err(ConvertError::EyeSubMeshLayout {
            found: sub_meshes.len(),
        });
    };
    if second != first + 1 {
        return Err(ConvertError::EyeSubMeshesNotConsecutive { first, second });
    }

    let vertex_range = |index: usize| -> Result<Range<usize>> {
        let sub_mesh = mesh.sub_meshes.get(index).ok_or_else(|| {
            ConvertError::InvalidSourceData(format!("sub mesh #{} does not exist", index))
        })?;
        let start = sub_mesh.first_vertex as usize;
        let end = start + sub_mesh.vertex_count as usize;
        if start == end || end > mesh.vertex_count() {
            return Err(ConvertError::InvalidSourceData(format!(
                "eye sub mesh #{} covers vertices {}..{} (vertex count: {})",
                index,
                start,
                end,
                mesh.vertex_count()
            )));
        }
        Ok(start..end)
    };

    Ok(EyeRanges {
        left: vertex_range(first)?,
        right: vertex_range(second)?,
    })
}

/// Compute eye bone positions from the converted eye vertices.
pub(super) fn locate_eye_bones(
    vertices: &[PmxVertex],
    ranges: &EyeRanges,
) -> (EyeBonePositions, Vec<ValidationIssue>) {
    let mut issues = Vec::new();
    let mut pivot = |side: Side| {
        let (position, issue) = eye_pivot(&vertices[ranges.range(side)], side);
        issues.extend(issue);
        position
    };
    let left = pivot(Side::Left);
    let right = pivot(Side::Right);

    let eye_vertices = vertices[ranges.left.clone()]
        .iter()
        .chain(&vertices[ranges.right.clone()]);
    let count = ranges.left.len() + ranges.right.len();
    let mean_y = eye_vertices.map(|vertex| vertex.position.y).sum::<f32>() / count as f32;

    let positions = EyeBonePositions {
        eyes: Vector3::new(0.0, mean_y + EYES_BONE_HEIGHT_OFFSET, EYES_BONE_DEPTH),
        left,
        right,
    };
    (positions, issues)
}

/// Estimate an eyeball's rotation pivot.
///
/// The rays cast along the normals of the +X-most and -X-most vertices are
/// intersected in the XZ plane; Y is the mean height of the eye. When the
/// rays are parallel the midpoint of the two extremal vertices is used.
fn eye_pivot(eye: &[PmxVertex], side: Side) -> (Vector3<f32>, Option<ValidationIssue>) {
    let mut leftmost = &eye[0];
    let mut rightmost = &eye[0];
    let mut sum = Vector3::zeros();

    for vertex in eye {
        sum += vertex.position;
        if vertex.position.x > leftmost.position.x {
            leftmost = vertex;
        }
        if vertex.position.x < rightmost.position.x {
            rightmost = vertex;
        }
    }

    let center_y = sum.y / eye.len() as f32;
    let (x1, z1) = (leftmost.position.x, leftmost.position.z);
    let (x2, z2) = (rightmost.position.x, rightmost.position.z);
    let (n1, n2) = (leftmost.normal, rightmost.normal);

    if n1.x.abs() >= RAY_EPSILON && n2.x.abs() >= RAY_EPSILON {
        let k1 = n1.z / n1.x;
        let k2 = n2.z / n2.x;
        if (k1 - k2).abs() >= RAY_EPSILON {
            let d1 = (z2 - k2 * x2 + k2 * x1 - z1) / (k1 - k2);
            return (Vector3::new(x1 + d1, center_y, z1 + k1 * d1), None);
        }
    }

    let issue = ValidationIssue::warning(
        "EYE_PIVOT_DEGENERATE",
        format!(
            "{} eye normals do not intersect; using the midpoint of its extremal vertices",
            side.english()
        ),
    );
    (
        Vector3::new((x1 + x2) / 2.0, center_y, (z1 + z2) / 2.0),
        Some(issue),
    )
}

/// Point slot 0 of every vertex in `range` at `eye_bone`.
///
/// Eye vertices are expected to carry a single full-weight influence. Any
/// vertex that does not is collapsed to a full-weight Bdef1 on the eye bone
/// and reported.
pub(super) fn reassign_eye_weights(
    vertices: &mut [PmxVertex],
    range: Range<usize>,
    eye_bone: usize,
    side: Side,
) -> Option<ValidationIssue> {
    let mut collapsed = 0usize;

    for vertex in &mut vertices[range] {
        match vertex.bone_weights[0] {
            Some(weight) if (weight.weight - 1.0).abs() < EYE_WEIGHT_TOLERANCE => {
                vertex.bone_weights[0] = Some(BoneWeight {
                    bone_index: eye_bone,
                    weight: weight.weight,
                });
            }
            _ => {
                vertex.bone_weights = [
                    Some(BoneWeight {
                        bone_index: eye_bone,
                        weight: 1.0,
                    }),
                    None,
                    None,
                    None,
                ];
                vertex.deformation = Deformation::Bdef1;
                collapsed += 1;
            }
        }
    }

    (collapsed > 0).then(|| {
        ValidationIssue::warning(
            "EYE_WEIGHT_NOT_UNIT",
            format!(
                "{} {} eye vertices did not have a single full weight and were bound to the eye bone",
                collapsed,
                side.english()
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use nalgebra::Vector2;

    use super::*;
    use crate::config::ConversionConfig;
    use crate::convert::fixtures::{EYE_CENTERS, EYE_VERTEX_STARTS, mltd_scene};
    use crate::convert::geometry::add_vertices;
    use crate::source::SubMesh;

    fn vertex(position: Vector3<f32>, normal: Vector3<f32>) -> PmxVertex {
        PmxVertex {
            position,
            normal,
            uv: Vector2::zeros(),
            edge_scale: 1.0,
            deformation: Deformation::Bdef1,
            bone_weights: [
                Some(BoneWeight {
                    bone_index: 0,
                    weight: 1.0,
                }),
                None,
                None,
                None,
            ],
        }
    }

    #[test]
    fn given_mltd_mesh_when_finding_eyes_then_two_ranges_are_returned() {
        let ranges = find_eye_ranges(&mltd_scene().mesh).expect("eyes should be found");
        assert_eq!(ranges.left, EYE_VERTEX_STARTS[0]..EYE_VERTEX_STARTS[0] + 3);
        assert_eq!(ranges.right, EYE_VERTEX_STARTS[1]..EYE_VERTEX_STARTS[1] + 3);
    }

    #[test]
    fn given_missing_eyes_mesh_when_finding_eyes_then_error_is_returned() {
        let mut mesh = mltd_scene().mesh;
        mesh.names[1] = "eyes_old".to_string();
        assert_eq!(
            find_eye_ranges(&mesh),
            Err(ConvertError::MissingSubMesh {
                name: "eyes".to_string()
            })
        );
    }

    #[test]
    fn given_zero_one_or_three_eye_sub_meshes_when_finding_eyes_then_layout_error_is_returned() {
        let mut mesh = mltd_scene().mesh;
        mesh.parent_mesh_indices = vec![0, 0, 0];
        assert_eq!(
            find_eye_ranges(&mesh),
            Err(ConvertError::EyeSubMeshLayout { found: 0 })
        );

        let mut mesh = mltd_scene().mesh;
        mesh.parent_mesh_indices = vec![0, 0, 1];
        assert_eq!(
            find_eye_ranges(&mesh),
            Err(ConvertError::EyeSubMeshLayout { found: 1 })
        );

        let mut mesh = mltd_scene().mesh;
        mesh.sub_meshes.push(SubMesh::default());
        mesh.parent_mesh_indices.push(1);
        assert_eq!(
            find_eye_ranges(&mesh),
            Err(ConvertError::EyeSubMeshLayout { found: 3 })
        );
    }

    #[test]
    fn given_non_consecutive_eye_sub_meshes_when_finding_eyes_then_layout_error_is_returned() {
        let mut mesh = mltd_scene().mesh;
        mesh.sub_meshes.swap(0, 1);
        mesh.parent_mesh_indices = vec![1, 0, 1];
        assert_eq!(
            find_eye_ranges(&mesh),
            Err(ConvertError::EyeSubMeshesNotConsecutive {
                first: 0,
                second: 2
            })
        );
    }

    #[test]
    fn given_spherical_eyes_when_locating_then_pivots_are_eyeball_centers() {
        let scene = mltd_scene();
        let vertices = add_vertices(
            &scene.avatar,
            &scene.mesh,
            scene.body_mesh_vertex_count,
            &ConversionConfig::default(),
        )
        .expect("vertices should convert");
        let ranges = find_eye_ranges(&scene.mesh).expect("eyes should be found");

        let (positions, issues) = locate_eye_bones(&vertices, &ranges);

        assert!(issues.is_empty());
        assert!((positions.left - Vector3::from(EYE_CENTERS[0])).norm() < 1e-3);
        assert!((positions.right - Vector3::from(EYE_CENTERS[1])).norm() < 1e-3);
        assert!((positions.eyes - Vector3::new(0.0, 19.5, -0.6)).norm() < 1e-3);
    }

    #[test]
    fn given_parallel_normals_when_locating_pivot_then_midpoint_is_used_with_warning() {
        let eye = vec![
            vertex(Vector3::new(1.0, 2.0, 0.0), Vector3::new(0.0, 0.0, -1.0)),
            vertex(Vector3::new(-1.0, 4.0, 2.0), Vector3::new(0.0, 0.0, -1.0)),
        ];

        let (pivot, issue) = eye_pivot(&eye, Side::Left);

        assert_eq!(pivot, Vector3::new(0.0, 3.0, 1.0));
        assert_eq!(
            issue.map(|issue| issue.code),
            Some("EYE_PIVOT_DEGENERATE".to_string())
        );
    }

    #[test]
    fn given_split_weight_when_reassigning_eye_then_vertex_is_collapsed_and_reported() {
        let mut vertices = vec![
            vertex(Vector3::zeros(), Vector3::z()),
            vertex(Vector3::zeros(), Vector3::z()),
        ];
        vertices[1].bone_weights = [
            Some(BoneWeight {
                bone_index: 3,
                weight: 0.6,
            }),
            Some(BoneWeight {
                bone_index: 4,
                weight: 0.4,
            }),
            None,
            None,
        ];
        vertices[1].deformation = Deformation::Bdef2;

        let issue = reassign_eye_weights(&mut vertices, 0..2, 9, Side::Right);

        assert_eq!(vertices[0].bone_weights[0].map(|w| w.bone_index), Some(9));
        assert_eq!(vertices[1].deformation, Deformation::Bdef1);
        assert_eq!(vertices[1].bone_weights[1], None);
        assert!((vertices[1].weight_sum() - 1.0).abs() < 1e-6);
        assert_eq!(
            issue.map(|issue| issue.code),
            Some("EYE_WEIGHT_NOT_UNIT".to_string())
        );
    }
}
