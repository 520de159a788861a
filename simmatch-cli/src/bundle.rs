//! `.tar.gz` bundles of matched images.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Builder;

/// Packs `files` into a gzip-compressed tar at `output`.
///
/// Entries are flat and named after each file's base name; two inputs with
/// the same base name are rejected before anything is written.
pub fn write_bundle(output: &Path, files: &[PathBuf]) -> Result<usize, Box<dyn Error>> {
    if files.is_empty() {
        return Err("nothing to bundle".into());
    }
    let mut names = HashSet::with_capacity(files.len());
    let mut entries = Vec::with_capacity(files.len());
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("{} has no usable file name", path.display()))?;
        if !names.insert(name.to_string()) {
            return Err(format!("duplicate file name in bundle: {name}").into());
        }
        if !path.is_file() {
            return Err(format!("{} is not a regular file", path.display()).into());
        }
        entries.push((path, name));
    }

    let file = File::create(output)?;
    let mut archive = Builder::new(GzEncoder::new(file, Compression::default()));
    for (path, name) in &entries {
        archive.append_path_with_name(path, name)?;
    }
    let encoder = archive.into_inner()?;
    encoder.finish()?;
    tracing::info!(output = %output.display(), entries = entries.len(), "bundle written");
    Ok(entries.len())
}
