//! Byte-range text edits.
//!
//! Orchestrators describe mutations as edit sets; nothing touches the
//! tree or the disk until the engine applies and commits them. Edits
//! are applied per file in reverse offset order so earlier replacements
//! never invalidate later offsets.

use std::collections::BTreeMap;

use crate::error::{ResymError, Result};
use crate::model::Span;
use crate::project::ProjectTree;

/// A single replacement. Zero-width spans insert.
#[derive(Debug, Clone)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextEdit {
    #[must_use]
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            start: span.start,
            end: span.end,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn delete(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
            text: String::new(),
        }
    }
}

/// Accumulated mutations of one operation, keyed by file.
#[derive(Debug, Default)]
pub struct EditSet {
    edits: BTreeMap<String, Vec<TextEdit>>,
    creates: BTreeMap<String, String>,
}

impl EditSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: impl Into<String>, edit: TextEdit) {
        self.edits.entry(file.into()).or_default().push(edit);
    }

    pub fn extend(&mut self, file: &str, edits: impl IntoIterator<Item = TextEdit>) {
        self.edits
            .entry(file.to_string())
            .or_default()
            .extend(edits);
    }

    /// Register a file created with full content (new modules).
    pub fn create(&mut self, file: impl Into<String>, content: String) {
        self.creates.insert(file.into(), content);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.creates.is_empty()
    }

    /// Files this edit set touches, sorted.
    #[must_use]
    pub fn files(&self) -> Vec<String> {
        let mut files: Vec<String> = self.edits.keys().cloned().collect();
        files.extend(self.creates.keys().cloned());
        files.sort();
        files.dedup();
        files
    }

    /// Compute the new text of every touched file against the tree.
    /// The tree itself is not mutated.
    pub fn apply(&self, tree: &ProjectTree) -> Result<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();

        for (file, content) in &self.creates {
            if tree.contains(file) {
                return Err(ResymError::Other(format!(
                    "edit set creates existing file {file}"
                )));
            }
            out.insert(file.clone(), content.clone());
        }

        for (file, edits) in &self.edits {
            let base = match out.get(file) {
                Some(created) => created.clone(),
                None => tree.text(file)?.to_string(),
            };
            out.insert(file.clone(), apply_edits(&base, edits, file)?);
        }

        Ok(out)
    }
}

fn apply_edits(text: &str, edits: &[TextEdit], file: &str) -> Result<String> {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by(|a, b| b.start.cmp(&a.start).then(b.end.cmp(&a.end)));

    // reject overlap: in descending order each edit must end at or
    // before the previous (lower) edit's start
    for pair in sorted.windows(2) {
        let (later, earlier) = (pair[0], pair[1]);
        if earlier.end > later.start {
            return Err(ResymError::Other(format!(
                "overlapping edits in {file} at {}..{} and {}..{}",
                earlier.start, earlier.end, later.start, later.end
            )));
        }
    }

    let mut result = text.to_string();
    for edit in sorted {
        if edit.start > result.len() || edit.end > result.len() || edit.start > edit.end {
            return Err(ResymError::Other(format!(
                "edit out of bounds in {file}: {}..{}",
                edit.start, edit.end
            )));
        }
        result.replace_range(edit.start..edit.end, &edit.text);
    }
    Ok(result)
}
