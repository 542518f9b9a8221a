//! Bone and morph naming.
//!
//! MLTD bone paths (`MODEL_00/BASE/MUNE1/...`) are mapped onto MMD's standard
//! Japanese bone names so that stock VMD motions drive the converted model.

// ─── Bone name tables ─────────────────────────────────────────────────────────

/// MLTD bone name (last path segment) to MMD bone name.
pub const MMD_BONE_MAP: [(&str, &str); 54] = [
    ("", "操作中心"),
    ("MODEL_00", "グルーブ"),
    ("BASE", "腰"),
    ("KOSHI", "下半身"),
    ("MUNE1", "上半身"),
    ("MUNE2", "上半身2"),
    ("KUBI", "首"),
    ("ATAMA", "頭"),
    ("KATA_L", "左肩"),
    ("UDE_L", "左腕"),
    ("HIJI_L", "左ひじ"),
    ("TE_L", "左手首"),
    ("KATA_R", "右肩"),
    ("UDE_R", "右腕"),
    ("HIJI_R", "右ひじ"),
    ("TE_R", "右手首"),
    ("MOMO_L", "左足"),
    ("HIZA_L", "左ひざ"),
    ("ASHI_L", "左足首"),
    ("TSUMASAKI_L", "左つま先"),
    ("MOMO_R", "右足"),
    ("HIZA_R", "右ひざ"),
    ("ASHI_R", "右足首"),
    ("TSUMASAKI_R", "右つま先"),
    ("OYA1_L", "左親指１"),
    ("OYA2_L", "左親指２"),
    ("OYA3_L", "左親指３"),
    ("HITO1_L", "左人指１"),
    ("HITO2_L", "左人指２"),
    ("HITO3_L", "左人指３"),
    ("NAKA1_L", "左中指１"),
    ("NAKA2_L", "左中指２"),
    ("NAKA3_L", "左中指３"),
    ("KUSU1_L", "左薬指１"),
    ("KUSU2_L", "左薬指２"),
    ("KUSU3_L", "左薬指３"),
    ("KO1_L", "左小指１"),
    ("KO2_L", "左小指２"),
    ("KO3_L", "左小指３"),
    ("OYA1_R", "右親指１"),
    ("OYA2_R", "右親指２"),
    ("OYA3_R", "右親指３"),
    ("HITO1_R", "右人指１"),
    ("HITO2_R", "右人指２"),
    ("HITO3_R", "右人指３"),
    ("NAKA1_R", "右中指１"),
    ("NAKA2_R", "右中指２"),
    ("NAKA3_R", "右中指３"),
    ("KUSU1_R", "右薬指１"),
    ("KUSU2_R", "右薬指２"),
    ("KUSU3_R", "右薬指３"),
    ("KO1_R", "右小指１"),
    ("KO2_R", "右小指２"),
    ("KO3_R", "右小指３"),
];

/// MMD bone name to its conventional English name.
const ENGLISH_BONE_MAP: [(&str, &str); 27] = [
    ("操作中心", "view cnt"),
    ("全ての親", "master"),
    ("センター", "center"),
    ("グルーブ", "groove"),
    ("腰", "waist"),
    ("下半身", "lower body"),
    ("上半身", "upper body"),
    ("上半身2", "upper body2"),
    ("首", "neck"),
    ("頭", "head"),
    ("両目", "eyes"),
    ("左目", "eye_L"),
    ("右目", "eye_R"),
    ("左肩", "shoulder_L"),
    ("左腕", "arm_L"),
    ("左ひじ", "elbow_L"),
    ("左手首", "wrist_L"),
    ("右肩", "shoulder_R"),
    ("右腕", "arm_R"),
    ("右ひじ", "elbow_R"),
    ("右手首", "wrist_R"),
    ("左足", "leg_L"),
    ("左ひざ", "knee_L"),
    ("左足首", "ankle_L"),
    ("右足", "leg_R"),
    ("右ひざ", "knee_R"),
    ("右足首", "ankle_R"),
];

/// Bones a user may translate: the root and the body-placement bones.
const MOVABLE_BONES: [&str; 5] = ["", "POSITION", "SCALE_POINT", "MODEL_00", "BASE"];

/// Name fragments Unity uses for bones it generated itself.
const GENERATED_SUFFIXES: [&str; 3] = ["_null", "_pos", "_rot"];

// ─── Morph name table ─────────────────────────────────────────────────────────

/// MLTD facial expression name to MMD morph name.
const MMD_MORPH_MAP: [(&str, &str); 14] = [
    ("E_metoji", "まばたき"),
    ("E_metoji_l", "ウィンク"),
    ("E_metoji_r", "ウィンク右"),
    ("E_egao", "笑い"),
    ("E_bikkuri", "びっくり"),
    ("E_jitome", "じと目"),
    ("M_a", "あ"),
    ("M_i", "い"),
    ("M_u", "う"),
    ("M_e", "え"),
    ("M_o", "お"),
    ("M_n", "ん"),
    ("B_komari", "困る"),
    ("B_ikari", "怒り"),
];

// ─── Collaborator traits ──────────────────────────────────────────────────────

/// Naming rules the bone assembler relies on.
pub trait BoneNaming {
    /// Whether the bone at `path` was generated by Unity rather than authored.
    fn is_generated(&self, path: &str) -> bool;
    /// Whether the bone at `path` may be translated in the authoring tool.
    fn is_movable(&self, path: &str) -> bool;
    /// Local (Japanese) bone name for `path`.
    fn pmx_bone_name(&self, path: &str, translate_to_mmd: bool) -> String;
    /// English name for a local bone name.
    fn translate_bone_name(&self, local_name: &str) -> String;
}

/// Naming rules the morph extractor relies on.
pub trait MorphNaming {
    /// MMD morph name for a raw expression name; unknown names are returned as-is.
    fn morph_name(&self, raw_name: &str) -> String;
}

/// Default naming tables for MLTD models.
#[derive(Debug, Clone, Copy, Default)]
pub struct MltdNaming;

/// Last segment of a bone path.
pub fn path_leaf(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

impl BoneNaming for MltdNaming {
    fn is_generated(&self, path: &str) -> bool {
        let leaf = path_leaf(path);
        leaf.contains("__")
            || GENERATED_SUFFIXES
                .iter()
                .any(|suffix| leaf.ends_with(suffix))
    }

    fn is_movable(&self, path: &str) -> bool {
        MOVABLE_BONES.contains(&path_leaf(path))
    }

    fn pmx_bone_name(&self, path: &str, translate_to_mmd: bool) -> String {
        let leaf = path_leaf(path);
        if !translate_to_mmd {
            return leaf.to_string();
        }

        MMD_BONE_MAP
            .iter()
            .find(|(mltd, _)| *mltd == leaf)
            .map(|(_, mmd)| mmd.to_string())
            .unwrap_or_else(|| leaf.to_string())
    }

    fn translate_bone_name(&self, local_name: &str) -> String {
        ENGLISH_BONE_MAP
            .iter()
            .find(|(local, _)| *local == local_name)
            .map(|(_, english)| english.to_string())
            .unwrap_or_else(|| local_name.to_string())
    }
}

impl MorphNaming for MltdNaming {
    fn morph_name(&self, raw_name: &str) -> String {
        MMD_MORPH_MAP
            .iter()
            .find(|(mltd, _)| *mltd == raw_name)
            .map(|(_, mmd)| mmd.to_string())
            .unwrap_or_else(|| raw_name.to_string())
    }
}
