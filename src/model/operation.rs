use serde::{Deserialize, Serialize};

use crate::model::symbol::Selector;

/// Where rename collision checking looks for clashes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionScope {
    File,
    #[default]
    Project,
}

/// Options controlling removal behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    pub force_remove: bool,
    pub cleanup_dependencies: bool,
}

/// A single refactoring request, as exchanged with the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum Operation {
    Rename {
        selector: Selector,
        #[serde(rename = "newName")]
        new_name: String,
        #[serde(default)]
        scope: CollisionScope,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Move {
        selector: Selector,
        #[serde(rename = "targetFilePath")]
        target_file_path: String,
        #[serde(rename = "copyOnly", default)]
        copy_only: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    Remove {
        selector: Selector,
        #[serde(rename = "forceRemove", default)]
        force_remove: bool,
        #[serde(rename = "cleanupDependencies", default)]
        cleanup_dependencies: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl Operation {
    #[must_use]
    pub fn selector(&self) -> &Selector {
        match self {
            Self::Rename { selector, .. }
            | Self::Move { selector, .. }
            | Self::Remove { selector, .. } => selector,
        }
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Rename { .. } => "rename",
            Self::Move { .. } => "move",
            Self::Remove { .. } => "remove",
        }
    }
}

/// Batch-level options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Abort remaining operations at the first failure.
    #[serde(rename = "stopOnError", default = "default_stop_on_error")]
    pub stop_on_error: bool,
}

fn default_stop_on_error() -> bool {
    true
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            stop_on_error: true,
        }
    }
}

/// An ordered list of operations applied under one shared context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub options: BatchOptions,
}

/// Outcome of a single operation. Always returned, success or failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "affectedFiles", default)]
    pub affected_files: Vec<String>,
}

impl OperationResult {
    #[must_use]
    pub fn ok(affected_files: Vec<String>) -> Self {
        Self {
            success: true,
            error: None,
            affected_files,
        }
    }

    #[must_use]
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            affected_files: Vec::new(),
        }
    }
}

/// Aggregate outcome of a batch, preserving per-operation results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    pub results: Vec<OperationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
