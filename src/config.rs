use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ResymError, Result};

/// Default directory name for resym data.
const RESYM_DIR: &str = ".resym";
/// Config filename.
const CONFIG_FILE: &str = "config.toml";

/// Project-level configuration resolved from the engine root.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory of the project being refactored.
    pub project_root: PathBuf,
    /// Path to the `.resym/` directory.
    pub resym_dir: PathBuf,
    /// Path to the config file.
    pub config_path: PathBuf,
    /// User settings loaded from config.toml.
    pub settings: UserSettings,
}

/// User-configurable settings from .resym/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Project scanning configuration.
    pub scan: ScanSettings,
}

/// Scanning-related settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Patterns to exclude from scanning (substring match on paths).
    pub exclude_patterns: Vec<String>,
    /// Maximum file size in MB to load (files larger are skipped).
    pub max_file_size_mb: u32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            exclude_patterns: vec![
                "node_modules/".into(),
                ".git/".into(),
                "dist/".into(),
                "build/".into(),
                "coverage/".into(),
            ],
            max_file_size_mb: 10,
        }
    }
}

impl Config {
    /// Create config for a given project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let resym_dir = project_root.join(RESYM_DIR);
        let config_path = resym_dir.join(CONFIG_FILE);

        let settings = Self::load_settings(&config_path).unwrap_or_default();

        Self {
            project_root,
            resym_dir,
            config_path,
            settings,
        }
    }

    /// Create config from the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| ResymError::Config(format!("cannot get cwd: {e}")))?;
        Ok(Self::new(cwd))
    }

    /// Load settings from config.toml if it exists.
    fn load_settings(config_path: &Path) -> Option<UserSettings> {
        if !config_path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(config_path).ok()?;
        toml::from_str(&content).ok()
    }

    /// Save current settings to config.toml.
    pub fn save_settings(&self) -> Result<()> {
        std::fs::create_dir_all(&self.resym_dir)?;
        let content = toml::to_string_pretty(&self.settings)
            .map_err(|e| ResymError::Config(format!("failed to serialize settings: {e}")))?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Convert an absolute path to a project-relative path string.
    #[must_use]
    pub fn relative_path(&self, abs: &Path) -> String {
        abs.strip_prefix(&self.project_root)
            .unwrap_or(abs)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Check if a path should be excluded based on settings.
    #[must_use]
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        for pattern in &self.settings.scan.exclude_patterns {
            let pattern = pattern.trim_end_matches('/');
            if path_str.contains(pattern) {
                return true;
            }
        }
        false
    }

    /// Check if a file is too large to load based on settings.
    #[must_use]
    pub fn is_file_too_large(&self, size_bytes: u64) -> bool {
        let max_bytes = u64::from(self.settings.scan.max_file_size_mb) * 1024 * 1024;
        size_bytes > max_bytes
    }
}
