use crate::config::ConversionConfig;
use crate::coords::to_pmx_position;
use crate::error::{ConvertError, Result};
use crate::naming::MorphNaming;
use crate::pmx::{MorphPanel, PmxMorph, VertexMorphOffset};
use crate::source::{BlendShape, BlendShapeData, SourceMesh};

use super::types::ValidationIssue;

/// Morphs assembled from several channels: `(raw name, part raw names)`.
const COMPOSITE_MORPHS: [(&str, &[&str]); 1] = [("E_metoji", &["E_metoji_l", "E_metoji_r"])];

/// Expression name without the `blendShapeN.` channel prefix.
fn strip_channel_prefix(channel_name: &str) -> &str {
    match channel_name.split_once('.') {
        Some((head, rest)) if head.starts_with("blendShape") => rest,
        _ => channel_name,
    }
}

fn morph_panel(raw_name: &str) -> MorphPanel {
    if raw_name.starts_with("E_") {
        MorphPanel::Eye
    } else if raw_name.starts_with("M_") {
        MorphPanel::Mouth
    } else if raw_name.starts_with("B_") {
        MorphPanel::Eyebrow
    } else {
        MorphPanel::Other
    }
}

/// Build one vertex morph per blend-shape channel, then the composite morphs.
pub(super) fn add_emotion_morphs(
    mesh: &SourceMesh,
    config: &ConversionConfig,
    naming: &dyn MorphNaming,
) -> Result<(Vec<PmxMorph>, Vec<ValidationIssue>)> {
    let Some(data) = &mesh.shape else {
        return Ok((Vec::new(), Vec::new()));
    };

    if data.channels.len() != data.shapes.len() {
        return Err(ConvertError::InvalidSourceData(format!(
            "blend shape block has {} channels but {} shapes",
            data.channels.len(),
            data.shapes.len()
        )));
    }

    let scale = config.position_scale();
    let vertex_count = mesh.vertex_count();
    let name_morph = |raw: &str| {
        if config.translate_facial_expression_names_to_mmd {
            naming.morph_name(raw)
        } else {
            raw.to_string()
        }
    };

    let mut morphs = Vec::with_capacity(data.channels.len() + COMPOSITE_MORPHS.len());
    for (channel, shape) in data.channels.iter().zip(&data.shapes) {
        let raw = strip_channel_prefix(&channel.name);
        morphs.push(PmxMorph {
            name: name_morph(raw),
            name_english: raw.to_string(),
            panel: morph_panel(raw),
            offsets: shape_offsets(data, shape, vertex_count, scale)?,
        });
    }

    let mut issues = Vec::new();
    for (raw, parts) in COMPOSITE_MORPHS {
        let mut offsets = Vec::new();
        for part in parts {
            match data
                .channels
                .iter()
                .position(|channel| channel.name.ends_with(part))
            {
                Some(index) => offsets.extend(shape_offsets(
                    data,
                    &data.shapes[index],
                    vertex_count,
                    scale,
                )?),
                None => issues.push(ValidationIssue::warning(
                    "MORPH_CHANNEL_MISSING",
                    format!("blend channel '{}' for morph '{}' was not found", part, raw),
                )),
            }
        }

        morphs.push(PmxMorph {
            name: name_morph(raw),
            name_english: raw.to_string(),
            panel: morph_panel(raw),
            offsets,
        });
    }

    Ok((morphs, issues))
}

fn shape_offsets(
    data: &BlendShapeData,
    shape: &BlendShape,
    vertex_count: usize,
    scale: f32,
) -> Result<Vec<VertexMorphOffset>> {
    let start = shape.first_vertex as usize;
    let end = start + shape.vertex_count as usize;
    let deltas = data.vertices.get(start..end).ok_or_else(|| {
        ConvertError::InvalidSourceData(format!(
            "blend shape covers deltas {}..{} (delta count: {})",
            start,
            end,
            data.vertices.len()
        ))
    })?;

    deltas
        .iter()
        .map(|delta| {
            let index = delta.index as usize;
            if index >= vertex_count {
                return Err(ConvertError::InvalidSourceData(format!(
                    "blend shape delta targets vertex #{} (vertex count: {})",
                    index, vertex_count
                )));
            }
            Ok(VertexMorphOffset {
                index,
                offset: to_pmx_position(delta.vertex, scale),
            })
        })
        .collect()
}
