use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Uniform scale from Unity meters to PMX units.
pub const PMX_SCALE: f32 = 12.5;

/// Skeleton convention the produced model is meant to be animated with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonFormat {
    /// MMD-like skeleton driven by standard VMD motions.
    Mmd,
    /// The game's own skeleton layout.
    Native,
}

/// Conversion options, passed by reference into every build step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversionConfig {
    /// Rebinds the rest pose to the TDA-style arm angle.
    pub fix_tda_binding_pose: bool,
    /// Target skeleton convention; required when `fix_tda_binding_pose` is set.
    pub skeleton_format: Option<SkeletonFormat>,
    /// Names bones with MMD's standard Japanese names.
    pub translate_bone_names_to_mmd: bool,
    /// Scales positions and offsets by [`PMX_SCALE`].
    pub scale_to_pmx_size: bool,
    /// Inserts the master/center bones below the root.
    pub fix_mmd_center_bones: bool,
    /// Appends leg and toe IK bones.
    pub append_ik_bones: bool,
    /// Appends the shared eyes bone and per-eye bones.
    pub append_eye_bones: bool,
    /// Hides bones Unity generated for its own bookkeeping.
    pub hide_unity_generated_bones: bool,
    /// Names morphs with MMD's standard facial expression names.
    pub translate_facial_expression_names_to_mmd: bool,
    /// Runs the physics importer.
    pub import_physics: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            fix_tda_binding_pose: false,
            skeleton_format: Some(SkeletonFormat::Mmd),
            translate_bone_names_to_mmd: true,
            scale_to_pmx_size: true,
            fix_mmd_center_bones: true,
            append_ik_bones: true,
            append_eye_bones: true,
            hide_unity_generated_bones: true,
            translate_facial_expression_names_to_mmd: true,
            import_physics: false,
        }
    }
}

impl ConversionConfig {
    /// A configuration with every optional feature turned off.
    pub fn minimal() -> Self {
        Self {
            fix_tda_binding_pose: false,
            skeleton_format: None,
            translate_bone_names_to_mmd: false,
            scale_to_pmx_size: false,
            fix_mmd_center_bones: false,
            append_ik_bones: false,
            append_eye_bones: false,
            hide_unity_generated_bones: false,
            translate_facial_expression_names_to_mmd: false,
            import_physics: false,
        }
    }

    /// Scale applied to positions and offsets.
    pub fn position_scale(&self) -> f32 {
        if self.scale_to_pmx_size {
            PMX_SCALE
        } else {
            1.0
        }
    }
}

/// Save a conversion configuration to a JSON file.
pub fn save_conversion_config(path: &Path, config: &ConversionConfig) -> Result<()> {
    let content = serde_json::to_string_pretty(config)
        .context("failed to serialize conversion config as JSON")?;
    fs::write(path, content)
        .with_context(|| format!("failed to save conversion config: {}", path.display()))?;
    Ok(())
}

/// Load a conversion configuration from a JSON file.
///
/// Missing keys fall back to [`ConversionConfig::default`].
pub fn load_conversion_config(path: &Path) -> Result<ConversionConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to load conversion config: {}", path.display()))?;
    let config: ConversionConfig =
        serde_json::from_str(&content).context("failed to parse conversion config JSON")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_config_when_serialize_then_json_contains_feature_toggles() {
        let config = ConversionConfig::default();
        let json = serde_json::to_string(&config).expect("serialize config");
        assert!(json.contains("append_ik_bones"));
        assert!(json.contains("\"skeleton_format\":\"mmd\""));
    }

    #[test]
    fn given_partial_json_when_deserialize_then_missing_keys_use_defaults() {
        let config: ConversionConfig =
            serde_json::from_str(r#"{"append_eye_bones": false, "skeleton_format": null}"#)
                .expect("parse config");

        assert!(!config.append_eye_bones);
        assert!(config.append_ik_bones);
        assert_eq!(config.skeleton_format, None);
    }

    #[test]
    fn given_scale_toggle_when_reading_scale_then_pmx_scale_is_used() {
        let mut config = ConversionConfig::minimal();
        assert_eq!(config.position_scale(), 1.0);
        config.scale_to_pmx_size = true;
        assert_eq!(config.position_scale(), PMX_SCALE);
    }

    #[test]
    fn given_saved_config_when_loading_then_values_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "mltd2pmx-config-{}.json",
            std::process::id()
        ));
        let mut config = ConversionConfig::minimal();
        config.append_ik_bones = true;

        save_conversion_config(&path, &config).expect("save config");
        let loaded = load_conversion_config(&path).expect("load config");
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, config);
    }
}
