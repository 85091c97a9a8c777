// src/pipeline/stamp.rs

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

/// Content-hash ledger for incremental rebuilds.
///
/// Command steps hash all of their matched input files before running; if the
/// hash equals the stamp stored after the last successful run, the step is a
/// no-op. The ledger lives under the output root (`.siteforge/stamps`); a
/// `clean` step that wipes the output tree also wipes the stamps, forcing a
/// full rebuild.
///
/// File format is line-based: `<step>@<target> <whitespace> <hex hash>`.
#[derive(Debug, Clone)]
pub struct StampStore {
    path: PathBuf,
}

impl StampStore {
    /// Stamp store rooted at the given output directory.
    pub fn for_output_root(output_root: &Path) -> Self {
        Self {
            path: output_root.join(".siteforge").join("stamps"),
        }
    }

    /// Stored hash for `key`, or `None` if never recorded.
    pub fn load(&self, key: &str) -> Result<Option<String>> {
        let map = self.load_all()?;
        Ok(map.get(key).cloned())
    }

    /// Record `hash` for `key`, merging with existing entries.
    pub fn save(&self, key: &str, hash: &str) -> Result<()> {
        let mut map = self.load_all()?;
        map.insert(key.to_string(), hash.to_string());
        self.save_all(&map)?;
        debug!(key = %key, hash = %hash, "stored input stamp");
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("opening stamp file at {:?}", self.path))?;
        let reader = BufReader::new(file);

        let mut map = HashMap::new();
        for line_res in reader.lines() {
            let line = line_res?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some((key, hash)) = trimmed.split_once(char::is_whitespace) {
                map.insert(key.to_string(), hash.trim().to_string());
            }
        }

        Ok(map)
    }

    fn save_all(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating stamp directory at {:?}", parent))?;
        }

        let file = File::create(&self.path)
            .with_context(|| format!("creating stamp file at {:?}", self.path))?;
        let mut writer = BufWriter::new(file);

        for (key, hash) in map.iter() {
            writeln!(writer, "{} {}", key, hash)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Compute a deterministic hash over the contents of the given files.
///
/// Paths are sorted before hashing so the result is independent of iteration
/// order; each file's path is mixed in alongside its contents so that renames
/// change the hash.
pub fn compute_hash_for_paths<I, P>(paths: I) -> Result<String>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut hasher = Hasher::new();

    let mut paths_vec: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    paths_vec.sort();

    for path in paths_vec {
        if path.is_file() {
            hasher.update(path.to_string_lossy().as_bytes());
            let mut file =
                File::open(&path).with_context(|| format!("opening file for hashing: {:?}", path))?;
            let mut buf = [0u8; 8192];
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
        }
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate input hash");
    Ok(hash)
}
