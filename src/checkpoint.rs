//! Snapshot/restore collaborator.
//!
//! The host calls snapshot-before and restore-on-failure around batch
//! execution; the engine itself holds no snapshot state. [`FsCheckpoint`]
//! is the disk-backed implementation the CLI uses; [`MemoryCheckpoint`]
//! restores the in-memory tree only, for hosts that manage persistence
//! themselves.

use std::collections::BTreeMap;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::edit::syntax_guard::write_atomic;
use crate::error::{ResymError, Result};
use crate::project::ProjectTree;

pub trait Checkpoint {
    /// Capture the full pre-batch state.
    fn snapshot(&mut self, tree: &ProjectTree) -> Result<()>;
    /// Bring the tree (and any backing store) back to the captured
    /// state, byte-identical.
    fn restore(&mut self, tree: &mut ProjectTree) -> Result<()>;
}

fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Disk-backed checkpoint rooted at the project directory.
pub struct FsCheckpoint {
    root: PathBuf,
    files: BTreeMap<String, String>,
    hashes: BTreeMap<String, String>,
}

impl FsCheckpoint {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: BTreeMap::new(),
            hashes: BTreeMap::new(),
        }
    }
}

impl Checkpoint for FsCheckpoint {
    fn snapshot(&mut self, tree: &ProjectTree) -> Result<()> {
        self.files = tree.snapshot();
        self.hashes = self
            .files
            .iter()
            .map(|(p, t)| (p.clone(), content_hash(t)))
            .collect();
        tracing::debug!(files = self.files.len(), "snapshot taken");
        Ok(())
    }

    fn restore(&mut self, tree: &mut ProjectTree) -> Result<()> {
        // files created after the snapshot are removed from disk
        let created: Vec<String> = tree
            .paths()
            .filter(|p| !self.files.contains_key(*p))
            .map(str::to_string)
            .collect();
        for path in &created {
            let disk = self.root.join(path);
            if disk.exists() {
                std::fs::remove_file(&disk)?;
            }
        }

        for (path, text) in &self.files {
            let stored = self.hashes.get(path);
            if stored.map(String::as_str) != Some(content_hash(text).as_str()) {
                return Err(ResymError::Other(format!(
                    "checkpoint corrupted for {path}"
                )));
            }
            write_atomic(text, &self.root.join(path))?;
        }

        tree.restore(self.files.clone());
        tracing::info!(
            restored = self.files.len(),
            removed = created.len(),
            "checkpoint restored"
        );
        Ok(())
    }
}

/// Tree-only checkpoint; never touches the disk.
#[derive(Default)]
pub struct MemoryCheckpoint {
    files: Option<BTreeMap<String, String>>,
}

impl MemoryCheckpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Checkpoint for MemoryCheckpoint {
    fn snapshot(&mut self, tree: &ProjectTree) -> Result<()> {
        self.files = Some(tree.snapshot());
        Ok(())
    }

    fn restore(&mut self, tree: &mut ProjectTree) -> Result<()> {
        let files = self
            .files
            .clone()
            .ok_or_else(|| ResymError::Other("restore without snapshot".into()))?;
        tree.restore(files);
        Ok(())
    }
}
