//! Path normalization shared by every component.
//!
//! Selector and target paths arrive in mixed styles (forward or back
//! slashes, `./` prefixes, absolute or project-relative). Everything is
//! normalized to a `/`-separated project-relative form before lookup so
//! the styles behave identically.

use std::path::Path;

use crate::error::{ResymError, Result};

/// Source extensions the engine operates on.
pub const SOURCE_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

/// Check whether a path has a supported source extension.
#[must_use]
pub fn is_source_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Collapse a path to `/`-separated segments, resolving `.` and `..`.
/// Returns `None` when `..` would escape the root.
#[must_use]
pub fn normalize(path: &str) -> Option<String> {
    let unified = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for seg in unified.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return None;
                }
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Normalize a caller-supplied path to project-relative form.
///
/// Absolute paths are re-rooted against `root`; relative paths are
/// cleaned. Paths that escape the root are rejected.
pub fn to_project_relative(root: &Path, input: &str) -> Result<String> {
    let unified = input.replace('\\', "/");
    let candidate = Path::new(&unified);

    let relative = if candidate.is_absolute() {
        let root_str = root.to_string_lossy().replace('\\', "/");
        let root_str = root_str.trim_end_matches('/');
        match unified.strip_prefix(root_str) {
            Some(rest) => rest.trim_start_matches('/').to_string(),
            None => {
                return Err(ResymError::TargetPrepareFailure {
                    path: input.to_string(),
                    reason: "path is outside the project root".into(),
                })
            }
        }
    } else {
        unified
    };

    normalize(&relative).ok_or_else(|| ResymError::TargetPrepareFailure {
        path: input.to_string(),
        reason: "path escapes the project root".into(),
    })
}

/// Directory portion of a project-relative path ("" for root-level).
#[must_use]
pub fn dir_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Strip a supported source extension from a path.
#[must_use]
pub fn strip_source_extension(path: &str) -> &str {
    for ext in SOURCE_EXTENSIONS {
        if let Some(stem) = path.strip_suffix(&format!(".{ext}")) {
            return stem;
        }
    }
    path
}

/// Candidate project-relative paths a module specifier may denote.
///
/// `./utils` from `src/app.ts` yields `src/utils.ts`, `src/utils.tsx`,
/// ..., `src/utils/index.ts`, ... in lookup order. Non-relative
/// specifiers (package imports) yield nothing.
#[must_use]
pub fn specifier_candidates(importer: &str, specifier: &str) -> Vec<String> {
    if !specifier.starts_with("./") && !specifier.starts_with("../") {
        return Vec::new();
    }
    let base = dir_of(importer);
    let joined = if base.is_empty() {
        specifier.to_string()
    } else {
        format!("{base}/{specifier}")
    };
    let Some(cleaned) = normalize(&joined) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    if is_source_path(&cleaned) {
        candidates.push(cleaned.clone());
    }
    for ext in SOURCE_EXTENSIONS {
        candidates.push(format!("{cleaned}.{ext}"));
    }
    for ext in SOURCE_EXTENSIONS {
        candidates.push(format!("{cleaned}/index.{ext}"));
    }
    candidates
}

/// Build the relative module specifier that imports `target` from
/// `importer` (both project-relative file paths). Extension-less,
/// always `./`- or `../`-prefixed.
#[must_use]
pub fn relative_specifier(importer: &str, target: &str) -> String {
    let target = strip_source_extension(target);
    let from_dir: Vec<&str> = dir_of(importer).split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let mut common = 0;
    while common < from_dir.len()
        && common < to_segs.len().saturating_sub(1)
        && from_dir[common] == to_segs[common]
    {
        common += 1;
    }

    let ups = from_dir.len() - common;
    let mut parts: Vec<String> = Vec::new();
    if ups == 0 {
        parts.push(".".into());
    } else {
        for _ in 0..ups {
            parts.push("..".into());
        }
    }
    for seg in &to_segs[common..] {
        parts.push((*seg).to_string());
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalize_cleans_segments() {
        assert_eq!(normalize("./src/app.ts").unwrap(), "src/app.ts");
        assert_eq!(normalize("src//lib/../app.ts").unwrap(), "src/app.ts");
        assert_eq!(normalize("src\\lib\\app.ts").unwrap(), "src/lib/app.ts");
        assert!(normalize("../outside.ts").is_none());
    }

    #[test]
    fn to_project_relative_accepts_mixed_styles() {
        let root = PathBuf::from("/work/project");
        assert_eq!(
            to_project_relative(&root, "src/app.ts").unwrap(),
            "src/app.ts"
        );
        assert_eq!(
            to_project_relative(&root, "./src\\app.ts").unwrap(),
            "src/app.ts"
        );
        assert_eq!(
            to_project_relative(&root, "/work/project/src/app.ts").unwrap(),
            "src/app.ts"
        );
        assert!(to_project_relative(&root, "/elsewhere/app.ts").is_err());
        assert!(to_project_relative(&root, "../escape.ts").is_err());
    }

    #[test]
    fn specifier_candidates_resolve_relative() {
        let cands = specifier_candidates("src/app.ts", "./lib/utils");
        assert!(cands.contains(&"src/lib/utils.ts".to_string()));
        assert!(cands.contains(&"src/lib/utils/index.ts".to_string()));

        let cands = specifier_candidates("src/lib/utils.ts", "../app");
        assert!(cands.contains(&"src/app.ts".to_string()));

        assert!(specifier_candidates("src/app.ts", "react").is_empty());
    }

    #[test]
    fn specifier_candidates_keep_explicit_extension() {
        let cands = specifier_candidates("src/app.ts", "./utils.ts");
        assert_eq!(cands[0], "src/utils.ts");
    }

    #[test]
    fn relative_specifier_same_dir() {
        assert_eq!(relative_specifier("src/app.ts", "src/utils.ts"), "./utils");
    }

    #[test]
    fn relative_specifier_down() {
        assert_eq!(
            relative_specifier("src/app.ts", "src/lib/utils.ts"),
            "./lib/utils"
        );
    }

    #[test]
    fn relative_specifier_up() {
        assert_eq!(
            relative_specifier("src/lib/utils.ts", "src/app.ts"),
            "../app"
        );
        assert_eq!(relative_specifier("src/a/b.ts", "c.ts"), "../../c");
    }

    #[test]
    fn relative_specifier_root_level() {
        assert_eq!(relative_specifier("a.ts", "b.ts"), "./b");
    }

    #[test]
    fn is_source_path_checks_extension() {
        assert!(is_source_path("src/app.ts"));
        assert!(is_source_path("src/App.tsx"));
        assert!(is_source_path("src/legacy.js"));
        assert!(!is_source_path("README.md"));
        assert!(!is_source_path("src/noext"));
    }
}
