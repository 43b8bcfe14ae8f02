//! Top-level façade.
//!
//! Owns the project tree as an explicit handle and passes it by
//! reference into every component; no singleton, no hidden global.
//! Executes single operations or ordered batches, coordinating
//! snapshot/rollback with the host's checkpoint collaborator.

use std::collections::BTreeMap;

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::edit::syntax_guard::write_atomic;
use crate::edit::{EditSet, SyntaxGuard};
use crate::error::Result;
use crate::model::{
    BatchRequest, BatchResult, Operation, OperationResult, ReferenceSite, ResolvedSymbol, Selector,
};
use crate::ops::{relocate, remove, rename, BatchContext};
use crate::model::RemoveOptions;
use crate::project::paths::to_project_relative;
use crate::project::ProjectTree;
use crate::refs::ReferenceIndex;
use crate::resolve;

pub struct Engine {
    config: Config,
    tree: ProjectTree,
    guard: SyntaxGuard,
}

impl Engine {
    /// Open an engine rooted at a project directory, scanning it into
    /// the in-memory tree.
    pub fn open(root: impl Into<std::path::PathBuf>) -> Result<Self> {
        let config = Config::new(root);
        let tree = ProjectTree::load(&config)?;
        tracing::info!(
            root = %config.project_root.display(),
            files = tree.len(),
            "project loaded"
        );
        Ok(Self {
            config,
            tree,
            guard: SyntaxGuard::new(),
        })
    }

    #[must_use]
    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Execute one operation. Always returns a result object, success
    /// or failure; it never aborts the caller.
    pub fn execute_operation(&mut self, op: &Operation) -> OperationResult {
        let mut ctx = BatchContext::new();
        self.run_one(op, &mut ctx)
    }

    /// Execute operations strictly in list order. Operation *k*
    /// observes the cumulative effect of 1..k-1 through the live tree
    /// and the batch context, before anything is durably persisted
    /// beyond the write-through. On batch failure the checkpoint is
    /// restored, leaving the file tree byte-identical to its pre-batch
    /// state.
    pub fn execute_batch(
        &mut self,
        request: &BatchRequest,
        checkpoint: &mut dyn Checkpoint,
    ) -> BatchResult {
        if let Err(e) = checkpoint.snapshot(&self.tree) {
            return BatchResult {
                success: false,
                results: Vec::new(),
                error: Some(format!("snapshot failed: {e}")),
            };
        }

        let mut ctx = BatchContext::new();
        let mut results = Vec::new();
        let mut failed = false;

        for op in &request.operations {
            let result = self.run_one(op, &mut ctx);
            let ok = result.success;
            results.push(result);
            if !ok {
                failed = true;
                if request.options.stop_on_error {
                    break;
                }
            }
        }

        if failed {
            let error = match checkpoint.restore(&mut self.tree) {
                Ok(()) => Some("batch failed; project restored to pre-batch state".to_string()),
                Err(e) => Some(format!("batch failed and restore also failed: {e}")),
            };
            return BatchResult {
                success: false,
                results,
                error,
            };
        }

        BatchResult {
            success: true,
            results,
            error: None,
        }
    }

    /// Resolve a selector and list every reference site (read-only).
    pub fn references(&self, selector: &Selector) -> Result<(ResolvedSymbol, Vec<ReferenceSite>)> {
        let selector = self.normalize_selector(selector)?;
        let sym = resolve::resolve(&self.tree, &selector)?;
        let index = ReferenceIndex::build(&self.tree);
        let sites = index.find_references(&self.tree, &sym);
        Ok((sym, sites))
    }

    fn run_one(&mut self, op: &Operation, ctx: &mut BatchContext) -> OperationResult {
        tracing::info!(
            operation = op.kind_name(),
            symbol = op.selector().name,
            "executing operation"
        );
        match self.plan_and_commit(op, ctx) {
            Ok(affected) => OperationResult::ok(affected),
            Err(e) => {
                tracing::warn!(
                    operation = op.kind_name(),
                    symbol = op.selector().name,
                    error = %e,
                    "operation failed"
                );
                OperationResult::failed(e)
            }
        }
    }

    /// Plan, validate, and commit a single operation. Failed
    /// operations are rejected before any file mutation.
    fn plan_and_commit(&mut self, op: &Operation, ctx: &mut BatchContext) -> Result<Vec<String>> {
        let (record, edits) = self.plan(op, ctx)?;

        let new_texts = edits.apply(&self.tree)?;
        for (path, text) in &new_texts {
            self.guard.validate(path, text)?;
        }
        self.commit(&new_texts)?;
        record.apply(ctx);

        Ok(new_texts.keys().cloned().collect())
    }

    fn plan(&self, op: &Operation, ctx: &BatchContext) -> Result<(ContextRecord, EditSet)> {
        match op {
            Operation::Rename {
                selector,
                new_name,
                scope,
                ..
            } => {
                let selector = self.normalize_selector(selector)?;
                let (sym, edits) = rename::plan(&self.tree, &selector, new_name, *scope, ctx)?;
                Ok((
                    ContextRecord::Renamed {
                        file: sym.file,
                        old: sym.name,
                        new: new_name.clone(),
                    },
                    edits,
                ))
            }
            Operation::Move {
                selector,
                target_file_path,
                copy_only,
                ..
            } => {
                let selector = self.normalize_selector(selector)?;
                let target =
                    to_project_relative(&self.config.project_root, target_file_path)?;
                let (sym, edits) =
                    relocate::plan(&self.tree, &selector, &target, *copy_only, ctx)?;
                Ok((
                    ContextRecord::Moved {
                        name: sym.name,
                        source: sym.file,
                        dest: target,
                        copy_only: *copy_only,
                    },
                    edits,
                ))
            }
            Operation::Remove {
                selector,
                force_remove,
                cleanup_dependencies,
                ..
            } => {
                let selector = self.normalize_selector(selector)?;
                let options = RemoveOptions {
                    force_remove: *force_remove,
                    cleanup_dependencies: *cleanup_dependencies,
                };
                let (sym, edits) = remove::plan(&self.tree, &selector, options, ctx)?;
                Ok((
                    ContextRecord::Removed {
                        file: sym.file,
                        name: sym.name,
                    },
                    edits,
                ))
            }
        }
    }

    /// Write-through: every validated text goes to the tree and the
    /// disk together.
    fn commit(&mut self, new_texts: &BTreeMap<String, String>) -> Result<()> {
        for (path, text) in new_texts {
            let disk = self.config.project_root.join(path);
            write_atomic(text, &disk)?;
            self.tree.set_text(path.clone(), text.clone());
        }
        Ok(())
    }

    fn normalize_selector(&self, selector: &Selector) -> Result<Selector> {
        let mut out = selector.clone();
        if !out.file_path.is_empty() {
            out.file_path = to_project_relative(&self.config.project_root, &out.file_path)?;
        }
        Ok(out)
    }
}

/// Deferred batch-context update, applied only after a successful
/// commit.
enum ContextRecord {
    Renamed {
        file: String,
        old: String,
        new: String,
    },
    Moved {
        name: String,
        source: String,
        dest: String,
        copy_only: bool,
    },
    Removed {
        file: String,
        name: String,
    },
}

impl ContextRecord {
    fn apply(self, ctx: &mut BatchContext) {
        match self {
            Self::Renamed { file, old, new } => {
                ctx.record_removed(&file, &old);
                ctx.record_added(&file, &new);
            }
            Self::Moved {
                name,
                source,
                dest,
                copy_only,
            } => ctx.record_moved(&name, &source, &dest, copy_only),
            Self::Removed { file, name } => ctx.record_removed(&file, &name),
        }
    }
}

// Engine-level behavior is exercised end-to-end in tests/engine_tests.rs;
// path normalization is the one piece with subtle local logic.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SymbolKind;
    use std::fs;
    use tempfile::TempDir;

    fn engine_with(files: &[(&str, &str)]) -> (TempDir, Engine) {
        let tmp = TempDir::new().unwrap();
        for (path, text) in files {
            let full = tmp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, text).unwrap();
        }
        let engine = Engine::open(tmp.path()).unwrap();
        (tmp, engine)
    }

    #[test]
    fn mixed_path_styles_behave_identically(){
        let (_tmp, engine) = engine_with(&[(
            "src/math.ts",
            "export function calculateTotal(): number { return 0; }\n",
        )]);
        for style in ["src/math.ts", "./src/math.ts", "src\\math.ts"] {
            let sel = Selector::new("calculateTotal", SymbolKind::Function, style);
            let (sym, _) = engine.references(&sel).unwrap();
            assert_eq!(sym.file, "src/math.ts", "style {style} failed");
        }
    }

    #[test]
    fn execute_operation_returns_failure_object() {
        let (_tmp, mut engine) = engine_with(&[(
            "src/math.ts",
            "export function f(): number { return 0; }\n",
        )]);
        let op = Operation::Rename {
            selector: Selector::new("missing", SymbolKind::Function, "src/math.ts"),
            new_name: "g".into(),
            scope: Default::default(),
            reason: None,
        };
        let result = engine.execute_operation(&op);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Symbol 'missing' not found"));
        assert!(result.affected_files.is_empty());
    }
}
