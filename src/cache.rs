//! On-disk cache of parsed datasets.
//!
//! Entries are keyed by a SHA-256 of the source bytes (plus sheet hints), so
//! an edited spreadsheet never hits a stale entry. Only the parsed records
//! are cached; monetization is always recomputed against the active table.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::Dataset;

pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("seizure-monetizer")
}

pub fn compute_checksum(data: &[u8], sheet_hints: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    for hint in sheet_hints {
        hasher.update([0u8]);
        hasher.update(hint.as_bytes());
    }
    hex::encode(hasher.finalize())
}

pub struct DatasetCache {
    dir: PathBuf,
}

impl DatasetCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, checksum: &str) -> PathBuf {
        self.dir.join(format!("{checksum}.json"))
    }

    /// Cached dataset for `checksum`. Unreadable entries count as misses.
    pub fn get(&self, checksum: &str) -> Option<Dataset> {
        let path = self.entry_path(checksum);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(dataset) => {
                tracing::debug!(%checksum, "dataset cache hit");
                Some(dataset)
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "ignoring corrupt cache entry");
                None
            }
        }
    }

    pub fn put(&self, checksum: &str, dataset: &Dataset) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(dataset)?;
        std::fs::write(self.entry_path(checksum), json)?;
        Ok(())
    }

    fn entries(&self) -> Vec<PathBuf> {
        let Ok(read_dir) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }

    pub fn entry_count(&self) -> usize {
        self.entries().len()
    }

    /// Remove every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.entries();
        for path in &entries {
            std::fs::remove_file(path)?;
        }
        Ok(entries.len())
    }
}
