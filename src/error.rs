use thiserror::Error;

/// Fatal validation errors raised while building a PMX model.
///
/// Every variant aborts the whole conversion; soft problems are reported as
/// [`ValidationIssue`](crate::convert::ValidationIssue)s instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Not supported: vertex #{vertex} has 3 influences")]
    UnsupportedInfluenceCount { vertex: usize },

    #[error("Unsupported number of bones: vertex #{vertex} has {count} influences")]
    InfluenceCountOutOfRange { vertex: usize, count: usize },

    #[error("Vertex #{vertex} references bone id {bone_id:#010x}, which is not in the skeleton")]
    UnknownBoneId { vertex: usize, bone_id: u32 },

    #[error("Vertex #{vertex} references skin bone slot {slot} (skin bone count: {count})")]
    SkinBoneSlotOutOfRange {
        vertex: usize,
        slot: usize,
        count: usize,
    },

    #[error("Missing {what} bone '{name}'")]
    MissingBone { what: &'static str, name: String },

    #[error("Mesh \"{name}\" is missing")]
    MissingSubMesh { name: String },

    #[error("Mesh \"eyes\" must own exactly 2 consecutive sub meshes (found {found})")]
    EyeSubMeshLayout { found: usize },

    #[error("Eye sub meshes #{first} and #{second} are not consecutive")]
    EyeSubMeshesNotConsecutive { first: usize, second: usize },

    #[error("Bone id {bone_id:#010x} has no entry in the bone name map")]
    UnnamedBone { bone_id: u32 },

    #[error("Invalid source data: {0}")]
    InvalidSourceData(String),

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("{site} references bone #{index}, but the model has {bone_count} bones")]
    DanglingBoneReference {
        site: String,
        index: usize,
        bone_count: usize,
    },

    #[error("{site} references bone {bone}, which was never added to the model")]
    UnresolvedBoneReference { site: String, bone: String },

    #[error("Physics import failed: {0}")]
    Physics(String),
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;
