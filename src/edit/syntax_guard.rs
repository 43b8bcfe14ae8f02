use std::path::Path;

use crate::error::{ResymError, Result};
use crate::parse::{language_for_path, validate_syntax};

/// STRICT syntax validation. No bypass mechanism.
/// Validates rewritten code in RAM before allowing writes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntaxGuard;

impl SyntaxGuard {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate that the rewritten text still parses for the file's
    /// language. Returns Ok(()) if valid, Err with details if not.
    pub fn validate(&self, path: &str, text: &str) -> Result<()> {
        let Some(lang) = language_for_path(path) else {
            return Err(ResymError::UnsupportedLanguage { path: path.into() });
        };
        if validate_syntax(lang, text) {
            Ok(())
        } else {
            Err(ResymError::SyntaxGuard {
                detail: format!("rewritten {path} has parse errors"),
            })
        }
    }

    /// Validate and then write the file atomically.
    /// First validates syntax, then writes to a temp file and renames.
    pub fn validate_and_write(&self, rel_path: &str, text: &str, disk_path: &Path) -> Result<()> {
        self.validate(rel_path, text)?;
        write_atomic(text, disk_path)
    }
}

/// Atomic write: temp file in the same directory, then rename.
pub fn write_atomic(text: &str, path: &Path) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent)?;
    let temp_path = parent.join(format!(
        ".resym_tmp_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ));

    std::fs::write(&temp_path, text)?;

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}
