use serde::{Deserialize, Serialize};

use crate::log_warn;

// ─── Synthesized bone names ───────────────────────────────────────────────────

pub(super) const MASTER_BONE: (&str, &str) = ("全ての親", "master");
pub(super) const CENTER_BONE: (&str, &str) = ("センター", "center");
pub(super) const EYES_BONE: (&str, &str) = ("両目", "eyes");
pub(super) const HEAD_BONE: &str = "頭";

/// Bone names the binding-pose fix rotates, with their corrective angle (deg)
/// about Z.
pub(super) const TDA_ARM_CORRECTIONS: [(&str, f32); 2] = [("左腕", -34.5), ("右腕", 34.5)];

// ─── IK constants ─────────────────────────────────────────────────────────────

pub(super) const IK_LOOP_COUNT: u32 = 10;
/// Per-iteration IK angle limit in degrees.
pub(super) const IK_ANGLE_LIMIT_DEG: f32 = 114.5916;
/// Knee link limit about X, in degrees.
pub(super) const KNEE_LIMIT_DEG: (f32, f32) = (-180.0, -0.5);

// ─── Eye constants ────────────────────────────────────────────────────────────

/// Mesh group holding both eyeballs.
pub(super) const EYES_MESH_NAME: &str = "eyes";
/// The shared eyes bone sits this far above the eyes' centroid.
pub(super) const EYES_BONE_HEIGHT_OFFSET: f32 = 0.5;
/// Fixed depth of the shared eyes bone (in front of the face).
pub(super) const EYES_BONE_DEPTH: f32 = -0.6;
pub(super) const EYE_WEIGHT_TOLERANCE: f32 = 1e-6;

// ─── Model header ─────────────────────────────────────────────────────────────

pub(super) const MODEL_NAME: &str = "ミリシタ モデル00";
pub(super) const MODEL_NAME_ENGLISH: &str = "MODEL_00";
pub(super) const MODEL_COMMENT: &str = "製作：mltd2pmx\n©BANDAI NAMCO Entertainment Inc.";
pub(super) const MODEL_COMMENT_ENGLISH: &str =
    "Generated by mltd2pmx\n©BANDAI NAMCO Entertainment Inc.";

// ─── Public types ─────────────────────────────────────────────────────────────

/// Left or right half of the body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Prefix used by MMD bone names.
    pub fn japanese(self) -> &'static str {
        match self {
            Side::Left => "左",
            Side::Right => "右",
        }
    }

    /// Suffix used by English bone names.
    pub fn english(self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

/// Severity level used by validation issues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A non-fatal problem found during conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    /// Create a warning and log it.
    pub(super) fn warning(code: &str, message: String) -> Self {
        log_warn!("[{}] {}", code, message);
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            message,
        }
    }
}

/// Summary returned alongside the converted model.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub model_name: String,
    pub source_bone_count: usize,
    pub bone_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub material_count: usize,
    pub morph_count: usize,
    pub node_count: usize,
    pub rigid_body_count: usize,
    /// Local names of the bones that were not in the source skeleton.
    pub synthesized_bones: Vec<String>,
    pub binding_pose_fixed: bool,
    pub issues: Vec<ValidationIssue>,
}
