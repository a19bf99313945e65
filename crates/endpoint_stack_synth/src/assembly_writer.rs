use std::fs;
use std::path::{Path, PathBuf};

use endpoint_stack_core::assembly::{MANIFEST_FILE, TREE_FILE};
use endpoint_stack_core::{CloudAssembly, SynthError};
use serde::Serialize;
use tracing::info;

/// Writes templates, asset manifests, `manifest.json` and `tree.json`.
///
/// Staged asset archives are expected to be in `out_dir` already.
pub fn write_assembly(
    assembly: &CloudAssembly,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, SynthError> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    for stack in &assembly.stacks {
        let template_file = stack.template_file();
        let manifest_file = stack.asset_manifest_file();
        let template = write_json(out_dir, &template_file, &stack.template)?;
        let manifest = write_json(out_dir, &manifest_file, &stack.asset_manifest)?;
        written.extend([template, manifest]);
    }
    let tree = write_json(out_dir, TREE_FILE, &assembly.tree)?;
    let manifest = write_json(out_dir, MANIFEST_FILE, &assembly.manifest)?;
    written.extend([tree, manifest]);

    info!(
        out_dir = %out_dir.display(),
        stacks = assembly.stacks.len(),
        "wrote cloud assembly"
    );
    Ok(written)
}

pub fn to_pretty_json(value: &impl Serialize) -> Result<String, SynthError> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}

fn write_json(
    out_dir: &Path,
    file_name: &str,
    value: &impl Serialize,
) -> Result<PathBuf, SynthError> {
    let path = out_dir.join(file_name);
    fs::write(&path, to_pretty_json(value)?)?;
    Ok(path)
}
