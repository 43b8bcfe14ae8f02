use std::path::PathBuf;

use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::config::Config;
use crate::error::Result;
use crate::project::paths::is_source_path;

/// A source file discovered under the project root, with its content.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub text: String,
    pub size: u64,
}

/// Parallel file scanner that respects .gitignore.
pub struct Scanner<'a> {
    config: &'a Config,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Scan the project directory in parallel, returning every loadable
    /// source file. Non-UTF-8 and oversized files are skipped.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        let root = &self.config.project_root;
        let entries: Vec<PathBuf> = WalkBuilder::new(root)
            .hidden(true) // skip hidden dirs like .git
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .follow_links(false) // Prevent symlink loops
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                !matches!(
                    name.as_ref(),
                    "node_modules" | ".git" | ".resym" | "dist" | "build" | "coverage" | "vendor"
                )
            })
            .build()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .filter(|e| is_source_path(&e.path().to_string_lossy()))
            .map(ignore::DirEntry::into_path)
            .collect();

        let config = self.config;
        let mut files: Vec<ScannedFile> = entries
            .par_iter()
            .filter_map(|path| {
                if config.should_exclude(path) {
                    return None;
                }
                let meta = path.metadata().ok()?;
                let size = meta.len();
                if config.is_file_too_large(size) {
                    return None;
                }
                let text = std::fs::read_to_string(path).ok()?;
                let relative = config.relative_path(path);
                Some(ScannedFile {
                    path: path.clone(),
                    relative_path: relative,
                    text,
                    size,
                })
            })
            .collect();

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }
}
