/// Example: Load a model and print what the viewer would do with it
///
/// Usage: cargo run --example inspect_model -- path/to/model.glb
use anyhow::{Context, Result};
use folio_core::loader::{parse_model, ModelFormat};
use folio_core::ViewerConfig;
use std::env;
use std::fs;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(path) = args.get(1) else {
        eprintln!("Usage: {} <model-file>", args[0]);
        std::process::exit(2);
    };

    let data = fs::read(path).with_context(|| format!("failed to read {}", path))?;
    println!("Format: {:?}", ModelFormat::detect(&data));

    let mut model = parse_model(&data).with_context(|| format!("failed to parse {}", path))?;
    let bounds = model.mesh.bounds();
    println!("Triangles: {}", model.mesh.triangles.len());
    println!("Bounds: min={:?} max={:?}", bounds.min, bounds.max);

    let fit = model.normalize(ViewerConfig::default().target_size)?;
    println!("Center: {:?}", fit.center);
    println!("Size: {:?}", fit.size);
    println!("Scale: {}", fit.scale);
    println!("Position after normalization: {:?}", model.transform.position);

    Ok(())
}
