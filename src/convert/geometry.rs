use std::collections::HashMap;

use crate::config::ConversionConfig;
use crate::coords::{to_pmx_normal, to_pmx_position, to_pmx_uv};
use crate::error::{ConvertError, Result};
use crate::pmx::{BoneWeight, Deformation, PmxVertex};
use crate::source::{SourceAvatar, SourceMesh};

// ─── Vertices ─────────────────────────────────────────────────────────────────

/// Convert every mesh vertex into a PMX vertex.
///
/// Weight slots hold *skeleton* indices at this point; the bone assembler
/// remaps them to final bone indices once the bone list is complete.
/// Influences are packed into the leading slots in their original order.
pub(super) fn add_vertices(
    avatar: &SourceAvatar,
    mesh: &SourceMesh,
    body_mesh_vertex_count: usize,
    config: &ConversionConfig,
) -> Result<Vec<PmxVertex>> {
    let scale = config.position_scale();
    let skeleton_index_by_id: HashMap<u32, usize> = avatar
        .skeleton
        .node_ids
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, index))
        .collect();

    let mut vertices = Vec::with_capacity(mesh.vertex_count());

    for (i, position) in mesh.vertices.iter().enumerate() {
        let influences: Vec<_> = mesh
            .skin
            .get(i)
            .map(|skin| skin.iter().flatten().copied().collect())
            .unwrap_or_default();

        let deformation = match Deformation::from_influence_count(influences.len()) {
            Some(deformation) => deformation,
            None if influences.len() == 3 => {
                return Err(ConvertError::UnsupportedInfluenceCount { vertex: i });
            }
            None => {
                return Err(ConvertError::InfluenceCountOutOfRange {
                    vertex: i,
                    count: influences.len(),
                });
            }
        };

        let mut bone_weights = [None; 4];
        for (slot, influence) in influences.iter().enumerate() {
            let bone_id = *mesh.bone_name_hashes.get(influence.bone_index).ok_or(
                ConvertError::SkinBoneSlotOutOfRange {
                    vertex: i,
                    slot: influence.bone_index,
                    count: mesh.bone_name_hashes.len(),
                },
            )?;
            let bone_index = *skeleton_index_by_id
                .get(&bone_id)
                .ok_or(ConvertError::UnknownBoneId { vertex: i, bone_id })?;

            bone_weights[slot] = Some(BoneWeight {
                bone_index,
                weight: influence.weight,
            });
        }

        vertices.push(PmxVertex {
            position: to_pmx_position(*position, scale),
            normal: to_pmx_normal(mesh.normals[i]),
            uv: to_pmx_uv(mesh.uv1[i], i < body_mesh_vertex_count),
            edge_scale: 1.0,
            deformation,
            bone_weights,
        });
    }

    Ok(vertices)
}

// ─── Faces ────────────────────────────────────────────────────────────────────

/// Copy the triangle list unchanged; winding is preserved.
pub(super) fn add_indices(mesh: &SourceMesh) -> Vec<u32> {
    mesh.indices.clone()
}
