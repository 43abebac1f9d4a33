// src/engine/io.rs
//
// Filesystem side of the batch: input discovery, output naming and atomic writes.

use crate::error::{PosterError, Result};
use crate::ops::OutputFormat;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the subdirectory that receives composed images.
pub const OUTPUT_DIR_NAME: &str = "processed";

/// Marker inserted between the source stem and the output extension.
pub const OUTPUT_MARKER: &str = "processed";

/// Source extensions picked up by the batch (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// True if `path` has one of [`SUPPORTED_EXTENSIONS`], in any case.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Regular files in `folder` (not recursive) with a supported extension, sorted by path.
pub fn collect_inputs(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(PosterError::file_not_found(display(folder)));
    }

    let entries = std::fs::read_dir(folder)
        .map_err(|e| PosterError::directory_read_failed(display(folder), e))?;

    let mut inputs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PosterError::directory_read_failed(display(folder), e))?;
        let path = entry.path();
        if path.is_file() && is_supported_input(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Create `<folder>/processed` if it does not exist yet and return its path.
pub fn prepare_output_dir(folder: &Path) -> Result<PathBuf> {
    let dir = folder.join(OUTPUT_DIR_NAME);
    std::fs::create_dir_all(&dir).map_err(|e| PosterError::file_write_failed(display(&dir), e))?;
    Ok(dir)
}

/// `<source_dir>/processed/<stem>.processed.<ext>` for a source file.
///
/// Sources that share a stem map to the same output; the last one written wins.
pub fn output_path_for(source: &Path, format: OutputFormat) -> Result<PathBuf> {
    let stem = source
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| {
            PosterError::invalid_argument("path", display(source), "source path has no file name")
        })?;
    let parent = source.parent().unwrap_or_else(|| Path::new(""));

    let mut file_name = stem.to_os_string();
    file_name.push(format!(".{OUTPUT_MARKER}.{}", format.extension()));
    Ok(parent.join(OUTPUT_DIR_NAME).join(file_name))
}

/// Read a source file, mapping a missing file to `FileNotFound`.
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PosterError::file_not_found(display(path)),
        _ => PosterError::file_read_failed(display(path), e),
    })
}

/// Atomically publish `data` at `path`.
///
/// The bytes go to a temp file in the target directory (so the final rename
/// never crosses filesystems), are synced, then renamed over `path`. Readers
/// see either the old file or the complete new one. The temp file is removed on
/// any failure.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<u64> {
    let output_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or_else(|| {
            PosterError::invalid_argument(
                "path",
                display(path),
                "output path must include a parent directory",
            )
        })?;

    let mut temp_file = NamedTempFile::new_in(output_dir)
        .map_err(|e| PosterError::file_write_failed(display(output_dir), e))?;

    let temp_path = temp_file.path().to_path_buf();
    temp_file
        .write_all(data)
        .map_err(|e| PosterError::file_write_failed(display(&temp_path), e))?;

    temp_file
        .as_file_mut()
        .sync_all()
        .map_err(|e| PosterError::file_write_failed(display(&temp_path), e))?;

    temp_file
        .persist(path)
        .map_err(|e| PosterError::file_write_failed(display(path), e.error))?;

    Ok(data.len() as u64)
}
