use crate::error::{ConvertError, Result};
use crate::pmx::{BoneTail, PmxBone, PmxRigidBody, PmxVertex};
use crate::source::SourceMesh;

// ─── Source mesh validation ───────────────────────────────────────────────────

/// Validate that the per-vertex and per-sub-mesh arrays of a mesh line up.
pub(super) fn validate_source_mesh(mesh: &SourceMesh) -> Result<()> {
    let vertex_count = mesh.vertex_count();

    if mesh.normals.len() != vertex_count {
        return Err(ConvertError::InvalidSourceData(format!(
            "mesh has {} vertices but {} normals",
            vertex_count,
            mesh.normals.len()
        )));
    }
    if mesh.uv1.len() != vertex_count {
        return Err(ConvertError::InvalidSourceData(format!(
            "mesh has {} vertices but {} UVs",
            vertex_count,
            mesh.uv1.len()
        )));
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(ConvertError::InvalidSourceData(format!(
            "index count {} is not a multiple of 3",
            mesh.indices.len()
        )));
    }
    if let Some(index) = mesh
        .indices
        .iter()
        .find(|&&index| index as usize >= vertex_count)
    {
        return Err(ConvertError::InvalidSourceData(format!(
            "face index {} is out of range (vertex count: {})",
            index, vertex_count
        )));
    }
    if mesh.parent_mesh_indices.len() != mesh.sub_meshes.len() {
        return Err(ConvertError::InvalidSourceData(format!(
            "mesh has {} sub meshes but {} parent mesh indices",
            mesh.sub_meshes.len(),
            mesh.parent_mesh_indices.len()
        )));
    }

    for (index, sub_mesh) in mesh.sub_meshes.iter().enumerate() {
        let end = sub_mesh.first_index as usize + sub_mesh.index_count as usize;
        if end > mesh.indices.len() {
            return Err(ConvertError::InvalidSourceData(format!(
                "sub mesh #{} covers indices up to {} (index count: {})",
                index,
                end,
                mesh.indices.len()
            )));
        }
    }

    Ok(())
}

// ─── Output invariants ────────────────────────────────────────────────────────

/// Check that every bone reference in the finished model resolves.
///
/// Covers parent links, bone tails, IK targets and links, append parents,
/// vertex weight slots and rigid body anchors.
pub(super) fn check_bone_references(
    bones: &[PmxBone],
    vertices: &[PmxVertex],
    rigid_bodies: &[PmxRigidBody],
) -> Result<()> {
    let bone_count = bones.len();
    let check = |site: &dyn Fn() -> String, index: usize| {
        if index < bone_count {
            Ok(())
        } else {
            Err(ConvertError::DanglingBoneReference {
                site: site(),
                index,
                bone_count,
            })
        }
    };

    for (i, bone) in bones.iter().enumerate() {
        if let Some(parent) = bone.parent_index {
            check(&|| format!("parent of bone '{}'", bone.name), parent)?;
        }
        if let BoneTail::Bone(Some(tail)) = bone.tail {
            check(&|| format!("tail of bone '{}'", bone.name), tail)?;
        }
        if bone.bone_index != i {
            return Err(ConvertError::InvalidSourceData(format!(
                "bone '{}' is stored at #{} but claims index {}",
                bone.name, i, bone.bone_index
            )));
        }
        if let Some(ik) = &bone.ik {
            check(&|| format!("IK target of bone '{}'", bone.name), ik.target_bone_index)?;
            for link in &ik.links {
                check(&|| format!("IK link of bone '{}'", bone.name), link.bone_index)?;
            }
        }
        if let Some(append) = &bone.append_parent {
            check(&|| format!("append parent of bone '{}'", bone.name), append.bone_index)?;
        }
    }

    for (v, vertex) in vertices.iter().enumerate() {
        for (slot, weight) in vertex.bone_weights.iter().enumerate() {
            if let Some(weight) = weight {
                check(&|| format!("vertex #{} slot {}", v, slot), weight.bone_index)?;
            }
        }
    }

    for body in rigid_bodies {
        if let Some(bone) = body.bone_index {
            check(&|| format!("rigid body '{}'", body.name), bone)?;
        }
    }

    Ok(())
}
