//! Seen-job store — the persisted set of canonical URLs already sent through a digest.
//!
//! Stored as a pretty-printed JSON array of strings. Each run loads a fresh snapshot and saves
//! once at the end; the store holds no state between calls.

use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SeenJobStore {
    path: PathBuf,
}

impl SeenJobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted URLs. A missing, unreadable or malformed file yields an empty set.
    pub fn load(&self) -> HashSet<String> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No seen-jobs file at {}", self.path.display());
                return HashSet::new();
            }
            Err(e) => {
                warn!("Could not read {}: {e}", self.path.display());
                return HashSet::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(urls) => urls.into_iter().collect(),
            Err(e) => {
                warn!(
                    "Ignoring malformed seen-jobs file {}: {e}",
                    self.path.display()
                );
                HashSet::new()
            }
        }
    }

    /// Overwrites the persisted state with exactly `urls`.
    ///
    /// Writes to a temp file in the same directory and renames it over the target, so a crash
    /// mid-write leaves the previous file intact.
    pub fn save(&self, urls: &HashSet<String>) -> Result<()> {
        let mut sorted: Vec<&String> = urls.iter().collect();
        sorted.sort();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        serde_json::to_writer_pretty(&mut tmp, &sorted)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        debug!("Saved {} seen job URLs to {}", urls.len(), self.path.display());
        Ok(())
    }
}
