// src/pipeline/copy.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::pipeline::walk::walk_files;
use crate::watch::patterns::PatternSet;

/// Copy files matched by `patterns` from `source_root` to
/// `output_root/<dest>`, preserving relative paths.
///
/// Files whose destination already exists and is at least as new as the
/// source are skipped, so re-running with unchanged inputs is a no-op.
pub fn run_copy(
    source_root: &Path,
    output_root: &Path,
    dest: &str,
    patterns: &PatternSet,
) -> Result<()> {
    let dest_root = if dest.is_empty() {
        output_root.to_path_buf()
    } else {
        output_root.join(dest)
    };

    let mut copied = 0usize;
    let mut skipped = 0usize;

    for file in walk_files(source_root)? {
        if !patterns.matches(&file.rel) {
            continue;
        }

        let dst = dest_root.join(&file.rel);
        if up_to_date(&file.abs, &dst) {
            trace!(path = %file.rel, "destination up to date; skipping");
            skipped += 1;
            continue;
        }

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        fs::copy(&file.abs, &dst)
            .with_context(|| format!("copying {:?} to {:?}", file.abs, dst))?;
        trace!(path = %file.rel, "copied");
        copied += 1;
    }

    debug!(copied, skipped, "copy step finished");
    Ok(())
}

/// True if `dst` exists and its modification time is not older than `src`'s.
fn up_to_date(src: &Path, dst: &Path) -> bool {
    let (Ok(src_meta), Ok(dst_meta)) = (fs::metadata(src), fs::metadata(dst)) else {
        return false;
    };
    match (src_meta.modified(), dst_meta.modified()) {
        (Ok(src_time), Ok(dst_time)) => dst_time >= src_time,
        _ => false,
    }
}
