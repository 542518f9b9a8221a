use std::collections::HashMap;

use nalgebra::{UnitQuaternion, Vector3};

use super::eyes::{EyeBonePositions, find_eye_ranges, locate_eye_bones, reassign_eye_weights};
use super::types::{
    CENTER_BONE, EYES_BONE, HEAD_BONE, IK_ANGLE_LIMIT_DEG, IK_LOOP_COUNT, KNEE_LIMIT_DEG,
    MASTER_BONE, Side, ValidationIssue,
};
use crate::config::ConversionConfig;
use crate::error::{ConvertError, Result};
use crate::hierarchy::{BoneHierarchy, BoneNode};
use crate::naming::BoneNaming;
use crate::pmx::{AppendParent, BoneFlags, BoneTail, IkLink, PmxBone, PmxIk, PmxVertex};
use crate::source::SourceMesh;

// ─── Bone drafts ──────────────────────────────────────────────────────────────

/// Stable identity of a bone while the bone list is still being edited.
///
/// References between drafts use keys, so inserting bones never shifts
/// them; indices are assigned once in [`SkeletonDraft::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum BoneKey {
    /// Bone from the source skeleton, by skeleton index.
    Source(usize),
    Master,
    Center,
    LegIkParent(Side),
    LegIk(Side),
    ToeIk(Side),
    Eyes,
    Eye(Side),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DraftTail {
    Bone(Option<BoneKey>),
    Offset(Vector3<f32>),
}

#[derive(Debug, Clone, PartialEq)]
struct DraftIkLink {
    bone: BoneKey,
    limit: Option<(Vector3<f32>, Vector3<f32>)>,
}

#[derive(Debug, Clone, PartialEq)]
struct DraftIk {
    target: BoneKey,
    links: Vec<DraftIkLink>,
}

#[derive(Debug, Clone, PartialEq)]
struct BoneDraft {
    key: BoneKey,
    name: String,
    name_english: String,
    position: Vector3<f32>,
    rotation: UnitQuaternion<f32>,
    parent: Option<BoneKey>,
    tail: DraftTail,
    flags: BoneFlags,
    ik: Option<DraftIk>,
    append_parent: Option<(BoneKey, f32)>,
}

impl BoneDraft {
    fn synthesized(
        key: BoneKey,
        name: String,
        name_english: String,
        position: Vector3<f32>,
        parent: Option<BoneKey>,
        flags: BoneFlags,
    ) -> Self {
        Self {
            key,
            name,
            name_english,
            position,
            rotation: UnitQuaternion::identity(),
            parent,
            tail: DraftTail::Bone(None),
            flags,
            ik: None,
            append_parent: None,
        }
    }
}

/// Ordered bone list under construction.
#[derive(Debug, Clone, Default)]
pub(super) struct SkeletonDraft {
    bones: Vec<BoneDraft>,
}

impl SkeletonDraft {
    /// One draft per hierarchy node, in skeleton order.
    pub(super) fn from_hierarchy(
        hierarchy: &BoneHierarchy,
        config: &ConversionConfig,
        naming: &dyn BoneNaming,
    ) -> Self {
        let bones = hierarchy
            .nodes
            .iter()
            .map(|node| {
                let name = naming.pmx_bone_name(&node.path, config.translate_bone_names_to_mmd);
                let name_english = naming.translate_bone_name(&name);

                let tail = match single_authored_child(hierarchy, node, naming) {
                    Some(child) => DraftTail::Bone(Some(BoneKey::Source(child))),
                    None => DraftTail::Offset(node.local_position),
                };

                let mut flags = BoneFlags::default() | BoneFlags::ROTATION;
                if naming.is_movable(&node.path) {
                    flags |= BoneFlags::TRANSLATION;
                }
                if config.hide_unity_generated_bones && naming.is_generated(&node.path) {
                    flags.remove(BoneFlags::VISIBLE);
                }

                BoneDraft {
                    key: BoneKey::Source(node.index),
                    name,
                    name_english,
                    position: node.world_position,
                    rotation: node.local_rotation,
                    parent: node.parent.map(BoneKey::Source),
                    tail,
                    flags,
                    ik: None,
                    append_parent: None,
                }
            })
            .collect();

        Self { bones }
    }

    fn find(&self, name: &str) -> Option<&BoneDraft> {
        self.bones.iter().find(|bone| bone.name == name)
    }

    fn require(&self, name: &str, what: &'static str) -> Result<&BoneDraft> {
        self.find(name).ok_or_else(|| ConvertError::MissingBone {
            what,
            name: name.to_string(),
        })
    }

    /// Insert master and center bones right after the root and hang the
    /// root's children under center.
    pub(super) fn insert_center_bones(&mut self) -> Result<()> {
        let root = self.bones.first().map(|bone| bone.key).ok_or_else(|| {
            ConvertError::InvalidSourceData(
                "cannot insert center bones into an empty skeleton".to_string(),
            )
        })?;

        for bone in &mut self.bones {
            if bone.parent == Some(root) {
                bone.parent = Some(BoneKey::Center);
            }
        }

        let flags = BoneFlags::default() | BoneFlags::TRANSLATION | BoneFlags::ROTATION;
        let mut master = BoneDraft::synthesized(
            BoneKey::Master,
            MASTER_BONE.0.to_string(),
            MASTER_BONE.1.to_string(),
            Vector3::zeros(),
            Some(root),
            flags,
        );
        let mut center = BoneDraft::synthesized(
            BoneKey::Center,
            CENTER_BONE.0.to_string(),
            CENTER_BONE.1.to_string(),
            Vector3::zeros(),
            Some(BoneKey::Master),
            flags,
        );
        master.tail = DraftTail::Offset(Vector3::zeros());
        center.tail = DraftTail::Offset(Vector3::zeros());

        self.bones.insert(1, master);
        self.bones.insert(2, center);
        Ok(())
    }

    /// Append leg IK (parent + IK, left then right) and toe IK bones.
    pub(super) fn append_ik_bones(&mut self) -> Result<()> {
        let master = self.require(MASTER_BONE.0, "master")?.key;

        for side in Side::BOTH {
            self.append_leg_ik(side, master)?;
        }
        for side in Side::BOTH {
            self.append_toe_ik(side)?;
        }
        Ok(())
    }

    fn append_leg_ik(&mut self, side: Side, master: BoneKey) -> Result<()> {
        let prefix = side.japanese();
        let ankle = self.require(&format!("{prefix}足首"), "ankle")?;
        let (ankle_key, ankle_position) = (ankle.key, ankle.position);
        let knee = self.require(&format!("{prefix}ひざ"), "knee")?.key;
        let leg = self.require(&format!("{prefix}足"), "leg")?.key;

        let flags = BoneFlags::default() | BoneFlags::TRANSLATION | BoneFlags::ROTATION;

        let mut ik_parent = BoneDraft::synthesized(
            BoneKey::LegIkParent(side),
            format!("{prefix}足IK親"),
            format!("leg IKP_{}", side.english()),
            Vector3::new(ankle_position.x, 0.0, ankle_position.z),
            Some(master),
            flags,
        );
        ik_parent.tail = DraftTail::Bone(Some(BoneKey::LegIk(side)));

        let (lower, upper) = KNEE_LIMIT_DEG;
        let mut ik_bone = BoneDraft::synthesized(
            BoneKey::LegIk(side),
            format!("{prefix}足ＩＫ"),
            format!("leg IK_{}", side.english()),
            ankle_position,
            Some(BoneKey::LegIkParent(side)),
            flags | BoneFlags::IK,
        );
        ik_bone.ik = Some(DraftIk {
            target: ankle_key,
            links: vec![
                DraftIkLink {
                    bone: knee,
                    limit: Some((
                        Vector3::new(lower.to_radians(), 0.0, 0.0),
                        Vector3::new(upper.to_radians(), 0.0, 0.0),
                    )),
                },
                DraftIkLink {
                    bone: leg,
                    limit: None,
                },
            ],
        });

        self.bones.push(ik_parent);
        self.bones.push(ik_bone);
        Ok(())
    }

    fn append_toe_ik(&mut self, side: Side) -> Result<()> {
        let prefix = side.japanese();
        let toe = self.require(&format!("{prefix}つま先"), "toe")?;
        let (toe_key, toe_position) = (toe.key, toe.position);
        let ankle = self.require(&format!("{prefix}足首"), "ankle")?.key;

        let mut ik_bone = BoneDraft::synthesized(
            BoneKey::ToeIk(side),
            format!("{prefix}つま先ＩＫ"),
            format!("toe IK_{}", side.english()),
            toe_position,
            Some(BoneKey::LegIk(side)),
            BoneFlags::default() | BoneFlags::TRANSLATION | BoneFlags::ROTATION | BoneFlags::IK,
        );
        ik_bone.ik = Some(DraftIk {
            target: toe_key,
            links: vec![DraftIkLink {
                bone: ankle,
                limit: None,
            }],
        });

        self.bones.push(ik_bone);
        Ok(())
    }

    /// Append the shared eyes bone and one bone per eye, all under the head.
    pub(super) fn append_eye_bones(&mut self, positions: &EyeBonePositions) -> Result<()> {
        let head = self.require(HEAD_BONE, "head")?.key;

        self.bones.push(BoneDraft::synthesized(
            BoneKey::Eyes,
            EYES_BONE.0.to_string(),
            EYES_BONE.1.to_string(),
            positions.eyes,
            Some(head),
            BoneFlags::default() | BoneFlags::ROTATION,
        ));

        for side in Side::BOTH {
            let mut eye = BoneDraft::synthesized(
                BoneKey::Eye(side),
                format!("{}目", side.japanese()),
                format!("eye_{}", side.english()),
                positions.eye(side),
                Some(head),
                BoneFlags::default() | BoneFlags::ROTATION | BoneFlags::APPEND_ROTATION,
            );
            eye.append_parent = Some((BoneKey::Eyes, 1.0));
            self.bones.push(eye);
        }
        Ok(())
    }

    /// Assign final indices and resolve every key reference.
    pub(super) fn finalize(self) -> Result<FinalizedSkeleton> {
        let keys: Vec<BoneKey> = self.bones.iter().map(|bone| bone.key).collect();
        let index_of: HashMap<BoneKey, usize> = keys
            .iter()
            .enumerate()
            .map(|(index, key)| (*key, index))
            .collect();

        if index_of.len() != keys.len() {
            return Err(ConvertError::InvalidSourceData(
                "bone list contains the same bone twice".to_string(),
            ));
        }

        let resolve = |key: BoneKey, site: &str, bone: &BoneDraft| -> Result<usize> {
            index_of
                .get(&key)
                .copied()
                .ok_or_else(|| ConvertError::UnresolvedBoneReference {
                    site: format!("{} of bone '{}'", site, bone.name),
                    bone: format!("{:?}", key),
                })
        };

        let mut bones = Vec::with_capacity(self.bones.len());
        for (index, draft) in self.bones.iter().enumerate() {
            let parent_index = match draft.parent {
                Some(parent) => Some(resolve(parent, "parent", draft)?),
                None => None,
            };

            let (tail, flags) = match draft.tail {
                DraftTail::Bone(Some(target)) => (
                    BoneTail::Bone(Some(resolve(target, "tail", draft)?)),
                    draft.flags | BoneFlags::TO_BONE,
                ),
                DraftTail::Bone(None) => (BoneTail::Bone(None), draft.flags | BoneFlags::TO_BONE),
                DraftTail::Offset(offset) => {
                    (BoneTail::Offset(offset), draft.flags - BoneFlags::TO_BONE)
                }
            };

            let ik = match &draft.ik {
                Some(ik) => Some(PmxIk {
                    target_bone_index: resolve(ik.target, "IK target", draft)?,
                    loop_count: IK_LOOP_COUNT,
                    angle_limit: IK_ANGLE_LIMIT_DEG.to_radians(),
                    links: ik
                        .links
                        .iter()
                        .map(|link| -> Result<IkLink> {
                            Ok(IkLink {
                                bone_index: resolve(link.bone, "IK link", draft)?,
                                limit: link.limit,
                            })
                        })
                        .collect::<Result<Vec<_>>>()?,
                }),
                None => None,
            };

            let append_parent = match draft.append_parent {
                Some((key, ratio)) => Some(AppendParent {
                    bone_index: resolve(key, "append parent", draft)?,
                    ratio,
                }),
                None => None,
            };

            bones.push(PmxBone {
                name: draft.name.clone(),
                name_english: draft.name_english.clone(),
                initial_position: draft.position,
                current_position: draft.position,
                initial_rotation: draft.rotation,
                current_rotation: UnitQuaternion::identity(),
                parent_index,
                bone_index: index,
                tail,
                flags,
                level: 0,
                ik,
                append_parent,
            });
        }

        Ok(FinalizedSkeleton {
            bones,
            keys,
            index_of,
        })
    }
}

/// The single child of `node` that is not Unity-generated, if there is exactly one.
fn single_authored_child(
    hierarchy: &BoneHierarchy,
    node: &BoneNode,
    naming: &dyn BoneNaming,
) -> Option<usize> {
    let mut authored = hierarchy
        .children_of(node)
        .filter(|child| !naming.is_generated(&child.path));

    match (authored.next(), authored.next()) {
        (Some(child), None) => Some(child.index),
        _ => None,
    }
}

// ─── Finalized skeleton ───────────────────────────────────────────────────────

/// Bone list with final indices.
#[derive(Debug, Clone)]
pub(super) struct FinalizedSkeleton {
    pub(super) bones: Vec<PmxBone>,
    keys: Vec<BoneKey>,
    index_of: HashMap<BoneKey, usize>,
}

impl FinalizedSkeleton {
    pub(super) fn index_of(&self, key: BoneKey) -> Option<usize> {
        self.index_of.get(&key).copied()
    }

    /// Rewrite vertex weight slots from skeleton indices to final indices.
    pub(super) fn remap_vertex_weights(&self, vertices: &mut [PmxVertex]) -> Result<()> {
        let source_count = self
            .keys
            .iter()
            .filter(|key| matches!(key, BoneKey::Source(_)))
            .count();

        for (v, vertex) in vertices.iter_mut().enumerate() {
            for (slot, weight) in vertex.bone_weights.iter_mut().enumerate() {
                let Some(weight) = weight else {
                    continue;
                };
                let source = weight.bone_index;
                let index = self.index_of(BoneKey::Source(source)).ok_or_else(|| {
                    ConvertError::DanglingBoneReference {
                        site: format!("vertex #{} slot {}", v, slot),
                        index: source,
                        bone_count: source_count,
                    }
                })?;
                weight.bone_index = index;
            }
        }
        Ok(())
    }

    /// Local names of bones that did not come from the source skeleton.
    pub(super) fn synthesized_names(&self) -> Vec<String> {
        self.keys
            .iter()
            .zip(&self.bones)
            .filter(|(key, _)| !matches!(key, BoneKey::Source(_)))
            .map(|(_, bone)| bone.name.clone())
            .collect()
    }
}

// ─── Bone assembly ────────────────────────────────────────────────────────────

/// Result of [`assemble_bones`].
#[derive(Debug, Clone)]
pub(super) struct AssembledBones {
    pub(super) bones: Vec<PmxBone>,
    pub(super) synthesized: Vec<String>,
    pub(super) issues: Vec<ValidationIssue>,
}

/// Build the final bone list and point vertex weights at it.
///
/// Vertices must come from the vertex assembler (weights in skeleton index
/// space); on return they reference final bone indices.
pub(super) fn assemble_bones(
    hierarchy: &BoneHierarchy,
    mesh: &SourceMesh,
    vertices: &mut [PmxVertex],
    config: &ConversionConfig,
    naming: &dyn BoneNaming,
) -> Result<AssembledBones> {
    let mut draft = SkeletonDraft::from_hierarchy(hierarchy, config, naming);
    let mut issues = Vec::new();

    if config.fix_mmd_center_bones {
        draft.insert_center_bones()?;
    }
    if config.append_ik_bones {
        draft.append_ik_bones()?;
    }

    let eye_ranges = if config.append_eye_bones {
        let ranges = find_eye_ranges(mesh)?;
        let (positions, eye_issues) = locate_eye_bones(vertices, &ranges);
        issues.extend(eye_issues);
        draft.append_eye_bones(&positions)?;
        Some(ranges)
    } else {
        None
    };

    let skeleton = draft.finalize()?;
    skeleton.remap_vertex_weights(vertices)?;

    if let Some(ranges) = eye_ranges {
        for side in Side::BOTH {
            let eye_bone = skeleton.index_of(BoneKey::Eye(side)).ok_or_else(|| {
                ConvertError::UnresolvedBoneReference {
                    site: "eye vertices".to_string(),
                    bone: format!("{:?}", BoneKey::Eye(side)),
                }
            })?;
            issues.extend(reassign_eye_weights(
                vertices,
                ranges.range(side),
                eye_bone,
                side,
            ));
        }
    }

    let synthesized = skeleton.synthesized_names();
    Ok(AssembledBones {
        bones: skeleton.bones,
        synthesized,
        issues,
    })
}
