use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::{ResymError, Result};
use crate::project::scanner::Scanner;

/// In-memory view of the project's source files.
///
/// The one shared mutable resource of the engine. Owned by the Engine
/// and passed by reference into every component; no globals. Later
/// operations in a batch observe the effect of earlier ones through
/// this tree before anything is durably persisted.
#[derive(Debug, Clone, Default)]
pub struct ProjectTree {
    files: BTreeMap<String, String>,
}

impl ProjectTree {
    /// Load the tree by scanning the project root.
    pub fn load(config: &Config) -> Result<Self> {
        let scanned = Scanner::new(config).scan()?;
        let mut files = BTreeMap::new();
        for f in scanned {
            files.insert(f.relative_path, f.text);
        }
        Ok(Self { files })
    }

    /// Build a tree from in-memory files (tests, embedding hosts).
    #[must_use]
    pub fn from_files(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            files: entries.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn text(&self, path: &str) -> Result<&str> {
        self.files
            .get(path)
            .map(String::as_str)
            .ok_or_else(|| ResymError::FileNotFound { path: path.into() })
    }

    pub fn set_text(&mut self, path: impl Into<String>, text: String) {
        self.files.insert(path.into(), text);
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(path)
    }

    /// Project-relative paths of every file, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, t)| (p.as_str(), t.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Snapshot of every file's content.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.files.clone()
    }

    /// Replace the whole tree (checkpoint restore).
    pub fn restore(&mut self, snapshot: BTreeMap<String, String>) {
        self.files = snapshot;
    }
}
