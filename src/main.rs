use std::{env, fs, path::PathBuf, process};

use anyhow::Context;
use mltd2pmx::config::{ConversionConfig, load_conversion_config};
use mltd2pmx::convert::build_pmx_model;
use mltd2pmx::source::SourceScene;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if !(3..=4).contains(&args.len()) {
        eprintln!("Usage: mltd2pmx <scene.json> <output.json> [config.json]");
        process::exit(2);
    }

    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);
    let config = match args.get(3) {
        Some(path) => load_conversion_config(&PathBuf::from(path))?,
        None => ConversionConfig::default(),
    };

    let content = fs::read_to_string(&input)
        .with_context(|| format!("failed to read source scene: {}", input.display()))?;
    let scene: SourceScene =
        serde_json::from_str(&content).context("failed to parse source scene JSON")?;

    let converted = build_pmx_model(&scene, &config)
        .with_context(|| format!("failed to convert {}", input.display()))?;

    let json = serde_json::to_string_pretty(&converted)
        .context("failed to serialize converted model as JSON")?;
    fs::write(&output, json)
        .with_context(|| format!("failed to write output: {}", output.display()))?;

    let report = &converted.report;
    println!("Model: {}", report.model_name);
    println!(
        "Bones: {} -> {} ({} synthesized)",
        report.source_bone_count,
        report.bone_count,
        report.synthesized_bones.len()
    );
    println!(
        "Vertices: {}, Triangles: {}, Materials: {}",
        report.vertex_count, report.triangle_count, report.material_count
    );
    println!("Morphs: {}, Display groups: {}", report.morph_count, report.node_count);
    println!("Binding pose fixed: {}", report.binding_pose_fixed);
    for issue in &report.issues {
        println!("[{:?}] {}: {}", issue.severity, issue.code, issue.message);
    }

    Ok(())
}
