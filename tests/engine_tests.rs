//! Engine-level scenario tests.
//!
//! Each test builds a real project in a temp directory, runs
//! operations through the Engine (write-through enabled), and asserts
//! on the resulting file tree — including byte-level rollback after
//! failed batches.

use std::collections::BTreeMap;
use std::fs;

use tempfile::TempDir;

use resym::checkpoint::FsCheckpoint;
use resym::engine::Engine;
use resym::model::{
    BatchOptions, BatchRequest, CollisionScope, Operation, Selector, SymbolKind,
};

fn setup(files: &[(&str, &str)]) -> (TempDir, Engine) {
    let tmp = TempDir::new().expect("create tempdir");
    for (path, text) in files {
        let full = tmp.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).expect("create dirs");
        fs::write(full, text).expect("write fixture");
    }
    let engine = Engine::open(tmp.path()).expect("open engine");
    (tmp, engine)
}

fn read(tmp: &TempDir, path: &str) -> String {
    fs::read_to_string(tmp.path().join(path)).expect("read file")
}

fn disk_state(tmp: &TempDir) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut stack = vec![tmp.path().to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path
                    .strip_prefix(tmp.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                out.insert(rel, fs::read_to_string(&path).unwrap_or_default());
            }
        }
    }
    out
}

fn rename_op(file: &str, name: &str, to: &str) -> Operation {
    Operation::Rename {
        selector: Selector::new(name, SymbolKind::Function, file),
        new_name: to.to_string(),
        scope: CollisionScope::Project,
        reason: None,
    }
}

fn move_op(file: &str, name: &str, dest: &str) -> Operation {
    Operation::Move {
        selector: Selector::new(name, SymbolKind::Function, file),
        target_file_path: dest.to_string(),
        copy_only: false,
        reason: None,
    }
}

// ─── Scenario A: rename across plain, aliased, and namespace use ────────────

#[test]
fn scenario_a_rename_leaves_zero_occurrences() {
    let (tmp, mut engine) = setup(&[
        (
            "src/math.ts",
            "export function calculateTotal(xs: number[]): number {\n    return xs.length;\n}\n",
        ),
        (
            "src/f1.ts",
            "import { calculateTotal } from './math';\nimport * as NS from './math';\n\nexport const a = calculateTotal([1]);\nexport const b = NS.calculateTotal([2]);\n",
        ),
        (
            "src/f2.ts",
            "import { calculateTotal } from './math';\n\nexport const c = calculateTotal([3]);\n",
        ),
    ]);

    let result = engine.execute_operation(&rename_op("src/math.ts", "calculateTotal", "computeSum"));
    assert!(result.success, "rename failed: {:?}", result.error);
    assert!(result.affected_files.contains(&"src/math.ts".to_string()));
    assert!(result.affected_files.contains(&"src/f1.ts".to_string()));
    assert!(result.affected_files.contains(&"src/f2.ts".to_string()));

    for path in ["src/math.ts", "src/f1.ts", "src/f2.ts"] {
        assert!(
            !read(&tmp, path).contains("calculateTotal"),
            "residual old name in {path}"
        );
    }
    assert!(read(&tmp, "src/f1.ts").contains("import { computeSum } from './math';"));
    assert!(read(&tmp, "src/f1.ts").contains("NS.computeSum([2])"));
    assert!(read(&tmp, "src/f2.ts").contains("computeSum([3])"));
}

#[test]
fn rename_round_trip_restores_text() {
    let (tmp, mut engine) = setup(&[
        (
            "src/math.ts",
            "export function calculateTotal(): number { return 0; }\n",
        ),
        (
            "src/app.ts",
            "import { calculateTotal } from './math';\n\nexport const x = calculateTotal();\n",
        ),
    ]);
    let before = disk_state(&tmp);

    let there = engine.execute_operation(&rename_op("src/math.ts", "calculateTotal", "computeSum"));
    assert!(there.success);
    let back = engine.execute_operation(&rename_op("src/math.ts", "computeSum", "calculateTotal"));
    assert!(back.success);

    assert_eq!(disk_state(&tmp), before);
}

// ─── Scenario B: move splits mixed consumer imports ─────────────────────────

#[test]
fn scenario_b_move_creates_module_and_splits_imports() {
    let (tmp, mut engine) = setup(&[
        (
            "src/utils.ts",
            "export function formatName(n: string): string {\n    return n.trim();\n}\n\nexport function formatEmail(e: string): string {\n    return e.toLowerCase();\n}\n\nexport function isValidEmail(e: string): boolean {\n    return e.includes('@');\n}\n",
        ),
        (
            "src/consumer.ts",
            "import { formatName, formatEmail, isValidEmail } from './utils';\n\nexport const ok = isValidEmail(formatEmail(formatName(' a@b ')));\n",
        ),
    ]);

    let result = engine.execute_operation(&move_op("src/utils.ts", "isValidEmail", "src/validation.ts"));
    assert!(result.success, "move failed: {:?}", result.error);

    let consumer = read(&tmp, "src/consumer.ts");
    assert!(consumer.contains("import { formatName, formatEmail } from './utils';"));
    assert!(consumer.contains("import { isValidEmail } from './validation';"));
    assert_eq!(consumer.matches("import").count(), 2);

    assert!(read(&tmp, "src/validation.ts").contains("export function isValidEmail"));
    assert!(!read(&tmp, "src/utils.ts").contains("isValidEmail"));
}

// ─── Scenario C: batch of two moves out of one module ───────────────────────

#[test]
fn scenario_c_batch_moves_land_in_their_targets() {
    let (tmp, mut engine) = setup(&[
        (
            "src/u.ts",
            "export function formatUserName(n: string): string {\n    return n.trim();\n}\n\nexport function calculateTotalPrice(p: number): number {\n    return p * 2;\n}\n\nexport function untouched(): number {\n    return 1;\n}\n",
        ),
        (
            "src/app.ts",
            "import { formatUserName, calculateTotalPrice, untouched } from './u';\n\nexport const x = formatUserName('a') + calculateTotalPrice(2) + untouched();\n",
        ),
    ]);

    let request = BatchRequest {
        operations: vec![
            move_op("src/u.ts", "formatUserName", "src/a.ts"),
            move_op("src/u.ts", "calculateTotalPrice", "src/b.ts"),
        ],
        options: BatchOptions { stop_on_error: true },
    };
    let mut checkpoint = FsCheckpoint::new(tmp.path());
    let result = engine.execute_batch(&request, &mut checkpoint);
    assert!(result.success, "batch failed: {:?}", result.error);
    assert!(result.results.iter().all(|r| r.success));

    let u = read(&tmp, "src/u.ts");
    assert!(u.contains("untouched"));
    assert!(!u.contains("formatUserName"));
    assert!(!u.contains("calculateTotalPrice"));

    assert!(read(&tmp, "src/a.ts").contains("export function formatUserName"));
    assert!(!read(&tmp, "src/a.ts").contains("calculateTotalPrice"));
    assert!(read(&tmp, "src/b.ts").contains("export function calculateTotalPrice"));

    let app = read(&tmp, "src/app.ts");
    assert!(app.contains("import { untouched } from './u';"));
    assert!(app.contains("import { formatUserName } from './a';"));
    assert!(app.contains("import { calculateTotalPrice } from './b';"));
}

// ─── No duplicate imports in a shared destination ───────────────────────────

#[test]
fn two_moves_into_one_destination_share_one_import() {
    let (tmp, mut engine) = setup(&[(
        "src/u.ts",
        "export function helper(): number {\n    return 1;\n}\n\nexport function f(): number {\n    return helper();\n}\n\nexport function g(): number {\n    return helper() + 1;\n}\n",
    )]);

    let request = BatchRequest {
        operations: vec![
            move_op("src/u.ts", "f", "src/v.ts"),
            move_op("src/u.ts", "g", "src/v.ts"),
        ],
        options: BatchOptions { stop_on_error: true },
    };
    let mut checkpoint = FsCheckpoint::new(tmp.path());
    let result = engine.execute_batch(&request, &mut checkpoint);
    assert!(result.success, "batch failed: {:?}", result.error);

    let v = read(&tmp, "src/v.ts");
    assert_eq!(
        v.matches("from './u'").count(),
        1,
        "destination must hold exactly one import from the source module:\n{v}"
    );
    assert!(v.contains("export function f"));
    assert!(v.contains("export function g"));
}

// ─── Conflict correctness ───────────────────────────────────────────────────

#[test]
fn move_into_conflicting_destination_fails() {
    let (_tmp, mut engine) = setup(&[
        ("src/u.ts", "export function f(): number { return 1; }\n"),
        ("src/v.ts", "export function f(): number { return 2; }\n"),
    ]);
    let result = engine.execute_operation(&move_op("src/u.ts", "f", "src/v.ts"));
    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("already exists in src/v.ts"));
}

#[test]
fn sequential_moves_into_same_file_see_no_false_conflict() {
    let (tmp, mut engine) = setup(&[
        ("src/u.ts", "export function first(): number { return 1; }\n\nexport function second(): number { return 2; }\n"),
    ]);
    let request = BatchRequest {
        operations: vec![
            move_op("src/u.ts", "first", "src/dest.ts"),
            move_op("src/u.ts", "second", "src/dest.ts"),
        ],
        options: BatchOptions { stop_on_error: true },
    };
    let mut checkpoint = FsCheckpoint::new(tmp.path());
    let result = engine.execute_batch(&request, &mut checkpoint);
    assert!(result.success, "batch failed: {:?}", result.error);
    let dest = read(&tmp, "src/dest.ts");
    assert!(dest.contains("function first"));
    assert!(dest.contains("function second"));
}

// ─── Atomicity ──────────────────────────────────────────────────────────────

#[test]
fn failed_batch_restores_byte_identical_tree() {
    let (tmp, mut engine) = setup(&[
        (
            "src/math.ts",
            "export function calculateTotal(): number { return 0; }\n",
        ),
        (
            "src/app.ts",
            "import { calculateTotal } from './math';\n\nexport const x = calculateTotal();\n",
        ),
    ]);
    let before = disk_state(&tmp);

    let request = BatchRequest {
        operations: vec![
            // succeeds, mutates two files and creates one
            move_op("src/math.ts", "calculateTotal", "src/sum.ts"),
            // engineered to fail
            rename_op("src/math.ts", "doesNotExist", "whatever"),
        ],
        options: BatchOptions { stop_on_error: true },
    };
    let mut checkpoint = FsCheckpoint::new(tmp.path());
    let result = engine.execute_batch(&request, &mut checkpoint);

    assert!(!result.success);
    assert_eq!(result.results.len(), 2);
    assert!(result.results[0].success);
    assert!(!result.results[1].success);

    assert_eq!(disk_state(&tmp), before, "tree must be byte-identical");
}

#[test]
fn stop_on_error_false_runs_every_operation() {
    let (tmp, mut engine) = setup(&[(
        "src/u.ts",
        "export function a(): number { return 1; }\n\nexport function b(): number { return 2; }\n",
    )]);
    let before = disk_state(&tmp);

    let request = BatchRequest {
        operations: vec![
            rename_op("src/u.ts", "missing", "x"),
            rename_op("src/u.ts", "a", "renamedA"),
            rename_op("src/u.ts", "b", "renamedB"),
        ],
        options: BatchOptions {
            stop_on_error: false,
        },
    };
    let mut checkpoint = FsCheckpoint::new(tmp.path());
    let result = engine.execute_batch(&request, &mut checkpoint);

    assert!(!result.success);
    assert_eq!(result.results.len(), 3);
    assert!(!result.results[0].success);
    assert!(result.results[1].success);
    assert!(result.results[2].success);
    // the batch as a whole failed, so the tree is rolled back
    assert_eq!(disk_state(&tmp), before);
}

// ─── Scenario D via the engine ──────────────────────────────────────────────

#[test]
fn scenario_d_member_rename_conflict() {
    let (_tmp, mut engine) = setup(&[(
        "src/user.ts",
        "export class User {\n    name: string = '';\n    describe(): string { return this.name; }\n}\n",
    )]);
    let op = Operation::Rename {
        selector: Selector::new("describe", SymbolKind::Method, "src/user.ts").in_class("User"),
        new_name: "name".into(),
        scope: CollisionScope::Project,
        reason: None,
    };
    let result = engine.execute_operation(&op);
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("Property 'name' already exists in class 'User'")
    );
}

// ─── Remove through the engine ──────────────────────────────────────────────

#[test]
fn remove_with_cleanup_drops_dead_imports() {
    let (tmp, mut engine) = setup(&[
        (
            "src/dep.ts",
            "export function onlyForLegacy(): number { return 1; }\n",
        ),
        (
            "src/u.ts",
            "import { onlyForLegacy } from './dep';\n\nfunction legacy(): number {\n    return onlyForLegacy();\n}\n\nexport function keep(): number {\n    return 2;\n}\n",
        ),
    ]);
    let op = Operation::Remove {
        selector: Selector::new("legacy", SymbolKind::Function, "src/u.ts"),
        force_remove: false,
        cleanup_dependencies: true,
        reason: None,
    };
    let result = engine.execute_operation(&op);
    assert!(result.success, "remove failed: {:?}", result.error);

    let u = read(&tmp, "src/u.ts");
    assert!(!u.contains("legacy"));
    assert!(!u.contains("onlyForLegacy"));
    assert!(u.contains("export function keep"));
}

#[test]
fn remove_blocked_by_referents_mutates_nothing() {
    let (tmp, mut engine) = setup(&[
        ("src/u.ts", "export function used(): number { return 1; }\n"),
        (
            "src/app.ts",
            "import { used } from './u';\n\nexport const x = used();\n",
        ),
    ]);
    let before = disk_state(&tmp);
    let op = Operation::Remove {
        selector: Selector::new("used", SymbolKind::Function, "src/u.ts"),
        force_remove: false,
        cleanup_dependencies: false,
        reason: None,
    };
    let result = engine.execute_operation(&op);
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().contains("src/app.ts"));
    assert_eq!(disk_state(&tmp), before);
}
