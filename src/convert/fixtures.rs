//! Small source scenes shared by the conversion tests.

use std::collections::HashMap;

use nalgebra::{Vector2, Vector3};

use crate::config::PMX_SCALE;
use crate::coords::{to_source_normal, to_source_position};
use crate::source::{
    BlendShape, BlendShapeChannel, BlendShapeData, BlendShapeVertex, BoneInfluence, SkeletonNode,
    SourceAvatar, SourceMesh, SourcePose, SourceScene, SourceSkeleton, SourceTransform, SubMesh,
};

pub(crate) fn influence(slot: usize, weight: f32) -> BoneInfluence {
    BoneInfluence {
        bone_index: slot,
        weight,
    }
}

fn avatar_from(bones: &[(&str, Option<usize>, [f32; 3])]) -> SourceAvatar {
    let node_ids: Vec<u32> = (0..bones.len() as u32).map(|i| 1000 + i).collect();
    let mut paths: Vec<String> = Vec::with_capacity(bones.len());
    for (leaf, parent, _) in bones {
        let path = match parent {
            Some(parent) if !paths[*parent].is_empty() => format!("{}/{}", paths[*parent], leaf),
            _ => leaf.to_string(),
        };
        paths.push(path);
    }

    SourceAvatar {
        name: "test_avatar".to_string(),
        skeleton: SourceSkeleton {
            nodes: bones
                .iter()
                .map(|(_, parent, _)| SkeletonNode { parent: *parent })
                .collect(),
            node_ids: node_ids.clone(),
        },
        pose: SourcePose {
            transforms: bones
                .iter()
                .map(|(_, _, [x, y, z])| SourceTransform {
                    translation: Vector3::new(*x, *y, *z),
                    ..SourceTransform::default()
                })
                .collect(),
        },
        bone_names: node_ids.into_iter().zip(paths).collect::<HashMap<_, _>>(),
    }
}

/// Root -> A -> B, three vertices weighted fully to B.
pub(crate) fn three_bone_scene() -> SourceScene {
    let avatar = avatar_from(&[
        ("", None, [0.0, 0.0, 0.0]),
        ("A", Some(0), [0.0, 1.0, 0.0]),
        ("B", Some(1), [0.0, 1.0, 0.0]),
    ]);

    let mesh = SourceMesh {
        vertices: vec![
            Vector3::new(0.0, 2.0, 0.0),
            Vector3::new(0.5, 2.0, 0.0),
            Vector3::new(0.0, 2.5, 0.0),
        ],
        normals: vec![Vector3::new(0.0, 0.0, -1.0); 3],
        uv1: vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 0.25),
        ],
        skin: vec![[Some(influence(2, 1.0)), None, None, None]; 3],
        bone_name_hashes: avatar.skeleton.node_ids.clone(),
        indices: vec![0, 1, 2],
        sub_meshes: vec![SubMesh {
            first_index: 0,
            index_count: 3,
            first_vertex: 0,
            vertex_count: 3,
        }],
        names: vec!["body".to_string()],
        parent_mesh_indices: vec![0],
        shape: None,
    };

    SourceScene {
        avatar,
        mesh,
        body_mesh_vertex_count: 3,
        texture_prefix: "tex_".to_string(),
        ..SourceScene::default()
    }
}

// Skeleton indices of the MLTD fixture.
pub(crate) const ROOT: usize = 0;
pub(crate) const KOSHI: usize = 3;
pub(crate) const MOMO_L: usize = 4;
pub(crate) const HIZA_L: usize = 5;
pub(crate) const ATAMA: usize = 15;
pub(crate) const UDE_L: usize = 17;
pub(crate) const UDE_R: usize = 21;
pub(crate) const MLTD_BONE_COUNT: usize = 25;

/// Eye centers in PMX space, left then right.
pub(crate) const EYE_CENTERS: [[f32; 3]; 2] = [[0.4, 19.0, -0.5], [-0.4, 19.0, -0.5]];
pub(crate) const EYE_RADIUS: f32 = 0.15;
/// First vertex of each eye sub mesh.
pub(crate) const EYE_VERTEX_STARTS: [usize; 2] = [4, 7];

/// A trimmed MLTD skeleton with legs, arms, a head and both eyes.
///
/// Unity puts the character's left side at -X; PMX mirrors it to +X.
pub(crate) fn mltd_scene() -> SourceScene {
    let avatar = avatar_from(&[
        ("", None, [0.0, 0.0, 0.0]),
        ("MODEL_00", Some(0), [0.0, 0.0, 0.0]),
        ("BASE", Some(1), [0.0, 0.9, 0.0]),
        ("KOSHI", Some(2), [0.0, 0.0, 0.0]),
        ("MOMO_L", Some(3), [-0.1, -0.05, 0.0]),
        ("HIZA_L", Some(4), [0.0, -0.4, 0.0]),
        ("ASHI_L", Some(5), [0.0, -0.4, 0.0]),
        ("TSUMASAKI_L", Some(6), [0.0, -0.05, 0.1]),
        ("MOMO_R", Some(3), [0.1, -0.05, 0.0]),
        ("HIZA_R", Some(8), [0.0, -0.4, 0.0]),
        ("ASHI_R", Some(9), [0.0, -0.4, 0.0]),
        ("TSUMASAKI_R", Some(10), [0.0, -0.05, 0.1]),
        ("MUNE1", Some(2), [0.0, 0.1, 0.0]),
        ("MUNE2", Some(12), [0.0, 0.15, 0.0]),
        ("KUBI", Some(13), [0.0, 0.2, 0.0]),
        ("ATAMA", Some(14), [0.0, 0.1, 0.0]),
        ("KATA_L", Some(13), [-0.05, 0.15, 0.0]),
        ("UDE_L", Some(16), [-0.1, 0.0, 0.0]),
        ("HIJI_L", Some(17), [-0.25, 0.0, 0.0]),
        ("TE_L", Some(18), [-0.2, 0.0, 0.0]),
        ("KATA_R", Some(13), [0.05, 0.15, 0.0]),
        ("UDE_R", Some(20), [0.1, 0.0, 0.0]),
        ("HIJI_R", Some(21), [0.25, 0.0, 0.0]),
        ("TE_R", Some(22), [0.2, 0.0, 0.0]),
        ("ATAMA_null", Some(15), [0.0, 0.05, 0.0]),
    ]);

    // Body quad, then two eyes built in PMX space.
    let mut vertices = vec![
        Vector3::new(-0.3, 1.45, 0.0),
        Vector3::new(-0.1, 0.6, 0.0),
        Vector3::new(0.3, 1.45, 0.0),
        Vector3::new(0.0, 1.1, 0.0),
    ];
    let mut normals = vec![Vector3::new(0.0, 0.0, -1.0); 4];
    for center in EYE_CENTERS {
        let center = Vector3::from(center);
        for degrees in [-60.0f32, 0.0, 60.0] {
            let theta = degrees.to_radians();
            let direction = Vector3::new(theta.sin(), 0.0, -theta.cos());
            vertices.push(to_source_position(center + direction * EYE_RADIUS, PMX_SCALE));
            normals.push(to_source_normal(direction));
        }
    }

    let mut skin = vec![
        [Some(influence(UDE_L, 1.0)), None, None, None],
        [
            Some(influence(MOMO_L, 0.5)),
            Some(influence(HIZA_L, 0.5)),
            None,
            None,
        ],
        [Some(influence(UDE_R, 1.0)), None, None, None],
        [
            Some(influence(KOSHI, 0.5)),
            Some(influence(ROOT, 0.5)),
            None,
            None,
        ],
    ];
    skin.extend(std::iter::repeat_n([Some(influence(ATAMA, 1.0)), None, None, None], 6));

    let shape = BlendShapeData {
        channels: vec![
            BlendShapeChannel {
                name: "blendShape1.E_metoji_l".to_string(),
            },
            BlendShapeChannel {
                name: "blendShape1.E_metoji_r".to_string(),
            },
            BlendShapeChannel {
                name: "blendShape1.M_a".to_string(),
            },
        ],
        shapes: vec![
            BlendShape {
                first_vertex: 0,
                vertex_count: 2,
            },
            BlendShape {
                first_vertex: 2,
                vertex_count: 1,
            },
            BlendShape {
                first_vertex: 3,
                vertex_count: 1,
            },
        ],
        vertices: vec![
            BlendShapeVertex {
                index: 4,
                vertex: Vector3::new(0.0, -0.01, 0.0),
            },
            BlendShapeVertex {
                index: 5,
                vertex: Vector3::new(0.0, -0.02, 0.0),
            },
            BlendShapeVertex {
                index: 7,
                vertex: Vector3::new(0.0, -0.01, 0.0),
            },
            BlendShapeVertex {
                index: 3,
                vertex: Vector3::new(0.01, 0.0, 0.0),
            },
        ],
    };

    let mesh = SourceMesh {
        uv1: vec![Vector2::new(0.5, 0.5); vertices.len()],
        vertices,
        normals,
        skin,
        bone_name_hashes: avatar.skeleton.node_ids.clone(),
        indices: vec![0, 1, 2, 1, 3, 2, 4, 5, 6, 7, 8, 9],
        sub_meshes: vec![
            SubMesh {
                first_index: 0,
                index_count: 6,
                first_vertex: 0,
                vertex_count: 4,
            },
            SubMesh {
                first_index: 6,
                index_count: 3,
                first_vertex: 4,
                vertex_count: 3,
            },
            SubMesh {
                first_index: 9,
                index_count: 3,
                first_vertex: 7,
                vertex_count: 3,
            },
        ],
        names: vec!["body".to_string(), "eyes".to_string()],
        parent_mesh_indices: vec![0, 1, 1],
        shape: Some(shape),
    };

    SourceScene {
        avatar,
        mesh,
        body_mesh_vertex_count: 4,
        texture_prefix: "ch_ss_001_".to_string(),
        ..SourceScene::default()
    }
}
