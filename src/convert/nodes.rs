use crate::pmx::{NodeElement, PmxBone, PmxMorph, PmxNode};

use super::types::ValidationIssue;

/// One entry of the display group catalog.
enum DisplayGroup {
    /// Lists bones by local name.
    Bones {
        name: &'static str,
        name_english: &'static str,
        bones: &'static [&'static str],
    },
    /// Lists every morph in creation order.
    Expressions,
}

const HAND_BONES: [&str; 32] = [
    "左親指１", "左親指２", "左親指３", "左人指１", "左人指２", "左人指３", "左ダミー", "左中指１",
    "左中指２", "左中指３", "左薬指１", "左薬指２", "左薬指３", "左小指１", "左小指２", "左小指３",
    "右親指１", "右親指２", "右親指３", "右人指１", "右人指２", "右人指３", "右ダミー", "右中指１",
    "右中指２", "右中指３", "右薬指１", "右薬指２", "右薬指３", "右小指１", "右小指２", "右小指３",
];

const DISPLAY_GROUPS: [DisplayGroup; 10] = [
    DisplayGroup::Bones {
        name: "Root",
        name_english: "Root",
        bones: &["操作中心"],
    },
    DisplayGroup::Expressions,
    DisplayGroup::Bones {
        name: "センター",
        name_english: "center",
        bones: &["全ての親", "センター"],
    },
    DisplayGroup::Bones {
        name: "ＩＫ",
        name_english: "IK",
        bones: &[
            "左足IK親",
            "左足ＩＫ",
            "左つま先ＩＫ",
            "右足IK親",
            "右足ＩＫ",
            "右つま先ＩＫ",
        ],
    },
    DisplayGroup::Bones {
        name: "体(上)",
        name_english: "Upper Body",
        bones: &["上半身", "上半身2", "首", "頭"],
    },
    DisplayGroup::Bones {
        name: "腕",
        name_english: "Arms",
        bones: &[
            "左肩", "左腕", "左ひじ", "左手首", "右肩", "右腕", "右ひじ", "右手首",
        ],
    },
    DisplayGroup::Bones {
        name: "手",
        name_english: "Hands",
        bones: &HAND_BONES,
    },
    DisplayGroup::Bones {
        name: "体(下)",
        name_english: "Lower Body",
        bones: &["グルーブ", "腰", "下半身"],
    },
    DisplayGroup::Bones {
        name: "足",
        name_english: "Legs",
        bones: &[
            "左足", "左ひざ", "左足首", "左つま先", "右足", "右ひざ", "右足首", "右つま先",
        ],
    },
    DisplayGroup::Bones {
        name: "その他",
        name_english: "Others",
        bones: &["両目", "左目", "右目"],
    },
];

/// Build the display groups for the finished bone and morph lists.
///
/// Bones named in the catalog but absent from the model are skipped and
/// reported; a group never references a missing element.
pub(super) fn add_nodes(
    bones: &[PmxBone],
    morphs: &[PmxMorph],
) -> (Vec<PmxNode>, Vec<ValidationIssue>) {
    let mut issues = Vec::new();

    let nodes = DISPLAY_GROUPS
        .iter()
        .enumerate()
        .map(|(index, group)| match group {
            DisplayGroup::Expressions => PmxNode {
                name: "表情".to_string(),
                name_english: "Facial Expressions".to_string(),
                is_special: true,
                elements: (0..morphs.len()).map(NodeElement::Morph).collect(),
            },
            DisplayGroup::Bones {
                name,
                name_english,
                bones: names,
            } => {
                let mut elements = Vec::with_capacity(names.len());
                for bone_name in names.iter() {
                    match bones.iter().position(|bone| bone.name == *bone_name) {
                        Some(bone_index) => elements.push(NodeElement::Bone(bone_index)),
                        None => issues.push(ValidationIssue::warning(
                            "DISPLAY_BONE_MISSING",
                            format!("bone '{}' of display group '{}' was not found", bone_name, name),
                        )),
                    }
                }
                PmxNode {
                    name: name.to_string(),
                    name_english: name_english.to_string(),
                    is_special: index == 0,
                    elements,
                }
            }
        })
        .collect();

    (nodes, issues)
}
