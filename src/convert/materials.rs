use nalgebra::{Vector3, Vector4};

use crate::pmx::{MaterialFlags, PmxMaterial};
use crate::source::SourceMesh;

const AMBIENT: f32 = 0.5;
const EDGE_COLOR: [f32; 4] = [0.3, 0.3, 0.3, 0.8];
const EDGE_SIZE: f32 = 1.0;

/// One material per sub mesh, textured `"{texture_prefix}{NN}.png"`.
pub(super) fn add_materials(mesh: &SourceMesh, texture_prefix: &str) -> Vec<PmxMaterial> {
    mesh.sub_meshes
        .iter()
        .enumerate()
        .map(|(index, sub_mesh)| PmxMaterial {
            name: format!("Mat #{:02}", index),
            name_english: format!("Mat #{:02}", index),
            diffuse: Vector4::new(1.0, 1.0, 1.0, 1.0),
            specular: Vector3::zeros(),
            specular_power: 0.0,
            ambient: Vector3::repeat(AMBIENT),
            flags: MaterialFlags::SHADOW
                | MaterialFlags::SELF_SHADOW
                | MaterialFlags::SELF_SHADOW_MAP
                | MaterialFlags::CULL_NONE
                | MaterialFlags::EDGE,
            edge_color: Vector4::from(EDGE_COLOR),
            edge_size: EDGE_SIZE,
            texture_file_name: format!("{}{:02}.png", texture_prefix, index),
            applied_face_vertex_count: sub_mesh.index_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::fixtures::mltd_scene;

    #[test]
    fn given_sub_meshes_when_building_materials_then_one_per_sub_mesh() {
        let scene = mltd_scene();

        let materials = add_materials(&scene.mesh, &scene.texture_prefix);

        assert_eq!(materials.len(), 3);
        assert_eq!(materials[1].name, "Mat #01");
        assert_eq!(materials[1].texture_file_name, "ch_ss_001_01.png");
        assert_eq!(
            materials
                .iter()
                .map(|m| m.applied_face_vertex_count)
                .sum::<u32>() as usize,
            scene.mesh.indices.len()
        );
        assert!(materials[0].flags.contains(MaterialFlags::CULL_NONE | MaterialFlags::EDGE));
        assert_eq!(materials[0].ambient, Vector3::new(0.5, 0.5, 0.5));
    }
}
