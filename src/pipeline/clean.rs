// src/pipeline/clean.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, trace};

use crate::pipeline::walk::{relative_str, walk_files};
use crate::watch::patterns::PatternSet;

/// Delete files matched by `patterns` below `output_root`.
///
/// Candidates come from walking `output_root` itself, and each one must
/// canonicalize to a path inside the output root before it is removed.
/// Empty directories left behind are pruned.
///
/// A missing output root is a no-op.
pub fn run_clean(output_root: &Path, patterns: &PatternSet) -> Result<()> {
    if !output_root.is_dir() {
        debug!(root = ?output_root, "output root does not exist; nothing to clean");
        return Ok(());
    }

    let canonical_root = output_root
        .canonicalize()
        .with_context(|| format!("canonicalizing output root {:?}", output_root))?;

    let mut deleted = 0usize;

    for file in walk_files(output_root)? {
        if !patterns.matches(&file.rel) {
            continue;
        }

        let canonical = file
            .abs
            .canonicalize()
            .with_context(|| format!("canonicalizing {:?}", file.abs))?;
        if !canonical.starts_with(&canonical_root) {
            return Err(anyhow!(
                "refusing to delete {:?}: outside the output root {:?}",
                canonical,
                canonical_root
            ));
        }

        fs::remove_file(&file.abs).with_context(|| format!("deleting {:?}", file.abs))?;
        trace!(path = %file.rel, "deleted");
        deleted += 1;
    }

    prune_empty_dirs(output_root, output_root)?;

    debug!(deleted, "clean step finished");
    Ok(())
}

/// Remove directories under `root` that ended up empty. `root` itself is
/// kept even when empty.
fn prune_empty_dirs(root: &Path, dir: &Path) -> Result<bool> {
    let mut empty = true;

    for entry in fs::read_dir(dir).with_context(|| format!("reading dir {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if prune_empty_dirs(root, &path)? {
                fs::remove_dir(&path).with_context(|| format!("removing empty dir {:?}", path))?;
                if let Some(rel) = relative_str(root, &path) {
                    trace!(path = %rel, "pruned empty directory");
                }
            } else {
                empty = false;
            }
        } else {
            empty = false;
        }
    }

    Ok(empty)
}
