mod eyes;
#[cfg(test)]
mod fixtures;
mod geometry;
mod materials;
mod morphs;
mod nodes;
mod skeleton;
mod skinning;
mod types;
mod validation;

use serde::Serialize;

use crate::config::ConversionConfig;
use crate::error::{ConvertError, Result};
use crate::hierarchy::build_hierarchy;
use crate::logging::ResultExt;
use crate::naming::{BoneNaming, MltdNaming, MorphNaming};
use crate::physics::{PhysicsData, PhysicsImporter};
use crate::pmx::PmxModel;
use crate::source::SourceScene;
use crate::{log_debug, log_info};

// Re-export public types for callers of this module.
pub use types::{ConversionReport, Severity, Side, ValidationIssue};

// Pull in sub-module helpers used in the orchestration below.
use geometry::{add_indices, add_vertices};
use materials::add_materials;
use morphs::add_emotion_morphs;
use nodes::add_nodes;
use skeleton::assemble_bones;
use skinning::apply_binding_pose_fix;
use types::{MODEL_COMMENT, MODEL_COMMENT_ENGLISH, MODEL_NAME, MODEL_NAME_ENGLISH};
use validation::{check_bone_references, validate_source_mesh};

static MLTD_NAMING: MltdNaming = MltdNaming;

// ─── Public API ───────────────────────────────────────────────────────────────

/// A converted model together with its conversion report.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    pub model: PmxModel,
    pub report: ConversionReport,
}

/// Builds PMX models from source scenes.
///
/// Naming rules default to [`MltdNaming`]; a physics importer is only needed
/// when `import_physics` is enabled.
pub struct PmxBuilder<'a> {
    config: &'a ConversionConfig,
    bone_naming: &'a dyn BoneNaming,
    morph_naming: &'a dyn MorphNaming,
    physics: Option<&'a dyn PhysicsImporter>,
}

impl<'a> PmxBuilder<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self {
            config,
            bone_naming: &MLTD_NAMING,
            morph_naming: &MLTD_NAMING,
            physics: None,
        }
    }

    pub fn with_bone_naming(mut self, naming: &'a dyn BoneNaming) -> Self {
        self.bone_naming = naming;
        self
    }

    pub fn with_morph_naming(mut self, naming: &'a dyn MorphNaming) -> Self {
        self.morph_naming = naming;
        self
    }

    pub fn with_physics(mut self, importer: &'a dyn PhysicsImporter) -> Self {
        self.physics = Some(importer);
        self
    }

    /// Build a PMX model from a source scene.
    ///
    /// Steps run in a fixed order: vertices, faces, bones, binding pose fix,
    /// materials, morphs, display groups, physics. Any fatal problem aborts
    /// the whole build; soft problems end up in the report.
    pub fn build(&self, scene: &SourceScene) -> Result<ConversionOutput> {
        let config = self.config;
        if config.import_physics && self.physics.is_none() {
            return Err(ConvertError::UnsupportedConfiguration(
                "physics import is enabled but no physics importer was provided".to_string(),
            ));
        }

        log_info!(
            "Building PMX model from avatar '{}' ({} bones, {} vertices)",
            scene.avatar.name,
            scene.avatar.skeleton.len(),
            scene.mesh.vertex_count()
        );

        validate_source_mesh(&scene.mesh).log_error(Some("source mesh"))?;
        let hierarchy = build_hierarchy(&scene.avatar, config).log_error(Some("skeleton"))?;
        if hierarchy.is_empty() {
            return Err(ConvertError::InvalidSourceData(format!(
                "avatar '{}' has no bones",
                scene.avatar.name
            )));
        }

        let mut vertices = add_vertices(
            &scene.avatar,
            &scene.mesh,
            scene.body_mesh_vertex_count,
            config,
        )
        .log_error(Some("vertices"))?;
        let face_triangles = add_indices(&scene.mesh);

        let assembled = assemble_bones(
            &hierarchy,
            &scene.mesh,
            &mut vertices,
            config,
            self.bone_naming,
        )
        .log_error(Some("bones"))?;
        let mut bones = assembled.bones;
        let mut issues = assembled.issues;
        log_debug!(
            "Assembled {} bones ({} synthesized)",
            bones.len(),
            assembled.synthesized.len()
        );

        let binding_pose_fixed = apply_binding_pose_fix(&mut bones, &mut vertices, config)
            .log_error(Some("binding pose"))?;
        if binding_pose_fixed {
            log_debug!("Rebound rest pose to the TDA arm angle");
        }

        let materials = add_materials(&scene.mesh, &scene.texture_prefix);
        let (morphs, morph_issues) = add_emotion_morphs(&scene.mesh, config, self.morph_naming)
            .log_error(Some("morphs"))?;
        issues.extend(morph_issues);
        let (nodes, node_issues) = add_nodes(&bones, &morphs);
        issues.extend(node_issues);

        let physics = match self.physics {
            Some(importer) if config.import_physics => {
                importer.import(&bones, &scene.body_sway, &scene.head_sway)?
            }
            _ => PhysicsData::default(),
        };

        check_bone_references(&bones, &vertices, &physics.rigid_bodies)?;

        let model = PmxModel {
            name: MODEL_NAME.to_string(),
            name_english: MODEL_NAME_ENGLISH.to_string(),
            comment: MODEL_COMMENT.to_string(),
            comment_english: MODEL_COMMENT_ENGLISH.to_string(),
            vertices,
            face_triangles,
            materials,
            bones,
            morphs,
            nodes,
            rigid_bodies: physics.rigid_bodies,
            joints: physics.joints,
        };

        let report = ConversionReport {
            model_name: model.name.clone(),
            source_bone_count: hierarchy.len(),
            bone_count: model.bones.len(),
            vertex_count: model.vertices.len(),
            triangle_count: model.face_triangles.len() / 3,
            material_count: model.materials.len(),
            morph_count: model.morphs.len(),
            node_count: model.nodes.len(),
            rigid_body_count: model.rigid_bodies.len(),
            synthesized_bones: assembled.synthesized,
            binding_pose_fixed,
            issues,
        };

        log_info!(
            "Built PMX model: {} bones, {} vertices, {} morphs, {} warnings",
            report.bone_count,
            report.vertex_count,
            report.morph_count,
            report.issues.len()
        );

        Ok(ConversionOutput { model, report })
    }
}

/// Build a PMX model with the default naming rules and no physics importer.
pub fn build_pmx_model(scene: &SourceScene, config: &ConversionConfig) -> Result<ConversionOutput> {
    PmxBuilder::new(config).build(scene)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
