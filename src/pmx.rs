//! PMX model description produced by the converter.
//!
//! Binary serialization is left to the host; everything here derives
//! `Serialize` so the model can be inspected as JSON.

use nalgebra::{UnitQuaternion, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Bone capability flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct BoneFlags: u16 {
        /// Tail points at another bone instead of a fixed offset.
        const TO_BONE = 0x0001;
        const ROTATION = 0x0002;
        const TRANSLATION = 0x0004;
        const VISIBLE = 0x0008;
        const ENABLED = 0x0010;
        const IK = 0x0020;
        /// Inherits rotation from the append parent.
        const APPEND_ROTATION = 0x0100;
        const APPEND_TRANSLATION = 0x0200;
    }
}

impl Default for BoneFlags {
    fn default() -> Self {
        BoneFlags::VISIBLE | BoneFlags::ENABLED
    }
}

bitflags::bitflags! {
    /// Material drawing flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MaterialFlags: u8 {
        const CULL_NONE = 0x01;
        const SHADOW = 0x02;
        const SELF_SHADOW_MAP = 0x04;
        const SELF_SHADOW = 0x08;
        const EDGE = 0x10;
    }
}

/// Where a bone's display tail points. Never affects skinning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum BoneTail {
    /// Another bone, or no bone at all (`None`).
    Bone(Option<usize>),
    /// Fixed offset from the bone's own position.
    Offset(Vector3<f32>),
}

/// One IK chain link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IkLink {
    pub bone_index: usize,
    /// Angular box `(lower, upper)` in radians, `None` when unconstrained.
    pub limit: Option<(Vector3<f32>, Vector3<f32>)>,
}

/// IK solver settings attached to an IK bone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmxIk {
    pub target_bone_index: usize,
    pub loop_count: u32,
    /// Per-iteration angle limit in radians.
    pub angle_limit: f32,
    pub links: Vec<IkLink>,
}

/// Rotation inherited from another bone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AppendParent {
    pub bone_index: usize,
    pub ratio: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmxBone {
    pub name: String,
    pub name_english: String,
    /// World-space rest position.
    pub initial_position: Vector3<f32>,
    /// World-space posed position.
    pub current_position: Vector3<f32>,
    pub initial_rotation: UnitQuaternion<f32>,
    /// Pose rotation relative to the rest pose.
    pub current_rotation: UnitQuaternion<f32>,
    pub parent_index: Option<usize>,
    pub bone_index: usize,
    pub tail: BoneTail,
    pub flags: BoneFlags,
    pub level: i32,
    pub ik: Option<PmxIk>,
    pub append_parent: Option<AppendParent>,
}

impl PmxBone {
    pub fn has_flag(&self, flag: BoneFlags) -> bool {
        self.flags.contains(flag)
    }
}

/// Vertex deformation scheme, derived from the number of set weight slots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Deformation {
    /// Static vertex, not attached to any bone.
    None,
    Bdef1,
    Bdef2,
    Bdef4,
}

impl Deformation {
    /// Scheme for an influence count; `None` for counts PMX cannot express.
    pub fn from_influence_count(count: usize) -> Option<Self> {
        match count {
            0 => Some(Deformation::None),
            1 => Some(Deformation::Bdef1),
            2 => Some(Deformation::Bdef2),
            4 => Some(Deformation::Bdef4),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoneWeight {
    pub bone_index: usize,
    pub weight: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmxVertex {
    pub position: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub uv: Vector2<f32>,
    pub edge_scale: f32,
    pub deformation: Deformation,
    pub bone_weights: [Option<BoneWeight>; 4],
}

impl PmxVertex {
    /// Set weight slots in slot order.
    pub fn weights(&self) -> impl Iterator<Item = &BoneWeight> {
        self.bone_weights.iter().flatten()
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights().map(|w| w.weight).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmxMaterial {
    pub name: String,
    pub name_english: String,
    pub diffuse: Vector4<f32>,
    pub specular: Vector3<f32>,
    pub specular_power: f32,
    pub ambient: Vector3<f32>,
    pub flags: MaterialFlags,
    pub edge_color: Vector4<f32>,
    pub edge_size: f32,
    pub texture_file_name: String,
    /// Number of face indices drawn with this material.
    pub applied_face_vertex_count: u32,
}

/// Control panel a morph appears in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MorphPanel {
    Eyebrow,
    Eye,
    Mouth,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VertexMorphOffset {
    pub index: usize,
    pub offset: Vector3<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmxMorph {
    pub name: String,
    pub name_english: String,
    pub panel: MorphPanel,
    pub offsets: Vec<VertexMorphOffset>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeElement {
    Bone(usize),
    Morph(usize),
}

/// Display group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmxNode {
    pub name: String,
    pub name_english: String,
    pub is_special: bool,
    pub elements: Vec<NodeElement>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RigidBodyShape {
    Sphere,
    Box,
    Capsule,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmxRigidBody {
    pub name: String,
    pub name_english: String,
    pub bone_index: Option<usize>,
    pub shape: RigidBodyShape,
    pub size: Vector3<f32>,
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub mass: f32,
    pub is_dynamic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PmxJoint {
    pub name: String,
    pub name_english: String,
    pub body_a: usize,
    pub body_b: usize,
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PmxModel {
    pub name: String,
    pub name_english: String,
    pub comment: String,
    pub comment_english: String,
    pub vertices: Vec<PmxVertex>,
    pub face_triangles: Vec<u32>,
    pub materials: Vec<PmxMaterial>,
    pub bones: Vec<PmxBone>,
    pub morphs: Vec<PmxMorph>,
    pub nodes: Vec<PmxNode>,
    pub rigid_bodies: Vec<PmxRigidBody>,
    pub joints: Vec<PmxJoint>,
}

impl PmxModel {
    /// Index of the first bone with the given local name.
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }
}
