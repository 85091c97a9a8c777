// src/pipeline/walk.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// A file found under a walked root.
#[derive(Debug, Clone)]
pub struct WalkedFile {
    /// Absolute (or root-joined) path on disk.
    pub abs: PathBuf,
    /// Path relative to the walked root, with forward slashes.
    pub rel: String,
}

/// Recursively collect all regular files under `root`.
///
/// Returns an empty list if `root` does not exist. Entries are sorted by
/// relative path so downstream hashing and copying are deterministic.
pub fn walk_files(root: &Path) -> Result<Vec<WalkedFile>> {
    let mut out = Vec::new();
    if root.is_dir() {
        walk_into(root, root, &mut out)?;
    }
    out.sort_by(|a, b| a.rel.cmp(&b.rel));
    Ok(out)
}

fn walk_into(root: &Path, dir: &Path, out: &mut Vec<WalkedFile>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("reading dir {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            walk_into(root, &path, out)?;
        } else if file_type.is_file() {
            if let Some(rel) = relative_str(root, &path) {
                out.push(WalkedFile { abs: path, rel });
            }
        }
        // Symlinks and other entry types are ignored.
    }
    Ok(())
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}
