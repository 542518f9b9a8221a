//! Source-side data as supplied by asset extraction.
//!
//! All vectors are in Unity's convention; nothing here is converted yet.

use std::collections::HashMap;

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// One node of the avatar skeleton.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkeletonNode {
    /// Index of the parent node, `None` for the root.
    pub parent: Option<usize>,
}

/// Skeleton: stable bone ids defining the index space `[0..N)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceSkeleton {
    pub nodes: Vec<SkeletonNode>,
    pub node_ids: Vec<u32>,
}

impl SourceSkeleton {
    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }
}

/// Local rest transform of one bone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceTransform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Default for SourceTransform {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

/// Rest pose, index-aligned with [`SourceSkeleton`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourcePose {
    pub transforms: Vec<SourceTransform>,
}

/// Combined avatar: skeleton, rest pose and bone display paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceAvatar {
    pub name: String,
    pub skeleton: SourceSkeleton,
    pub pose: SourcePose,
    /// Bone id to display path, e.g. `"MODEL_00/BASE/MUNE1"`.
    pub bone_names: HashMap<u32, String>,
}

/// One skin influence: an index into [`SourceMesh::bone_name_hashes`] and a weight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoneInfluence {
    pub bone_index: usize,
    pub weight: f32,
}

/// A contiguous range of the merged mesh.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubMesh {
    pub first_index: u32,
    pub index_count: u32,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// A blend-shape channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlendShapeChannel {
    /// Full channel name, e.g. `"blendShape1.E_metoji_l"`.
    pub name: String,
}

/// A shape: a range over the shared delta-vertex pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlendShape {
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// One delta vertex.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BlendShapeVertex {
    /// Mesh vertex the delta applies to.
    pub index: u32,
    pub vertex: Vector3<f32>,
}

/// Blend-shape block of a mesh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlendShapeData {
    pub channels: Vec<BlendShapeChannel>,
    pub shapes: Vec<BlendShape>,
    pub vertices: Vec<BlendShapeVertex>,
}

/// Merged geometry of every mesh making up the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceMesh {
    pub vertices: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub uv1: Vec<Vector2<f32>>,
    /// Per-vertex influences. May be shorter than `vertices` for ill-formed
    /// models; missing entries mean "no influence".
    pub skin: Vec<[Option<BoneInfluence>; 4]>,
    /// Skin bone slot to bone id.
    pub bone_name_hashes: Vec<u32>,
    pub indices: Vec<u32>,
    pub sub_meshes: Vec<SubMesh>,
    /// Names of the meshes merged into this one.
    pub names: Vec<String>,
    /// For each sub mesh, the index into `names` it came from.
    pub parent_mesh_indices: Vec<usize>,
    pub shape: Option<BlendShapeData>,
}

impl SourceMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Sway (secondary motion) settings consumed by physics import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SwayController {
    pub name: String,
    pub bones: Vec<SwayBone>,
}

/// One swaying bone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwayBone {
    /// Display path of the bone.
    pub path: String,
    pub radius: f32,
    #[serde(default)]
    pub is_skirt: bool,
}

/// Everything one conversion reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceScene {
    pub avatar: SourceAvatar,
    pub mesh: SourceMesh,
    /// Vertices below this index belong to the body mesh; the rest to the head.
    pub body_mesh_vertex_count: usize,
    pub texture_prefix: String,
    #[serde(default)]
    pub body_sway: SwayController,
    #[serde(default)]
    pub head_sway: SwayController,
}
