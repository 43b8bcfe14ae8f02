// Inherit lint configuration from lib.rs for consistency
#![allow(
    clippy::missing_errors_doc,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::needless_pass_by_value
)]

use std::io::Read;

use clap::Parser;

use resym::checkpoint::FsCheckpoint;
use resym::cli::commands::{Cli, Command};
use resym::cli::output::{self, RefsReport};
use resym::engine::Engine;
use resym::error::ResymError;
use resym::freetext;
use resym::model::{
    BatchOptions, BatchRequest, CollisionScope, Operation, Selector, SelectorScope, ScopeKind,
    SymbolKind,
};

fn main() {
    // log to stderr; stdout carries JSON results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn std::fmt::Display>>;

fn map_err(e: impl std::fmt::Display + 'static) -> Box<dyn std::fmt::Display> {
    Box::new(e.to_string())
}

fn run(cli: Cli) -> CmdResult {
    let root = cli.root;
    match cli.command {
        Command::Rename {
            file,
            name,
            to,
            kind,
            in_class,
            in_function,
            collision_scope,
        } => cmd_rename(
            &root,
            &file,
            &name,
            &to,
            &kind,
            in_class.as_deref(),
            in_function.as_deref(),
            &collision_scope,
        ),
        Command::Move {
            file,
            name,
            dest,
            kind,
            copy,
        } => cmd_move(&root, &file, &name, &dest, &kind, copy),
        Command::Remove {
            file,
            name,
            kind,
            force,
            cleanup,
        } => cmd_remove(&root, &file, &name, &kind, force, cleanup),
        Command::Batch {
            file,
            stop_on_error,
        } => cmd_batch(&root, file.as_deref(), stop_on_error),
        Command::Parse { text, execute } => cmd_parse(&root, text.as_deref(), execute),
        Command::Refs {
            file,
            name,
            kind,
            in_class,
        } => cmd_refs(&root, &file, &name, &kind, in_class.as_deref()),
    }
}

fn parse_kind(s: &str) -> Result<SymbolKind, Box<dyn std::fmt::Display>> {
    SymbolKind::parse(s).ok_or_else(|| {
        map_err(format!(
            "unknown symbol kind '{s}' (expected function, class, interface, type, variable, method, property, getter, setter, enum, or namespace)"
        ))
    })
}

fn build_selector(
    file: &str,
    name: &str,
    kind: &str,
    in_class: Option<&str>,
    in_function: Option<&str>,
) -> Result<Selector, Box<dyn std::fmt::Display>> {
    let mut selector = Selector::new(name, parse_kind(kind)?, file);
    selector.scope = match (in_class, in_function) {
        (Some(class), _) => Some(SelectorScope {
            kind: ScopeKind::Class,
            name: class.to_string(),
        }),
        (None, Some(function)) => Some(SelectorScope {
            kind: ScopeKind::Function,
            name: function.to_string(),
        }),
        (None, None) => None,
    };
    Ok(selector)
}

/// Print the result and flag failure through the exit code.
fn finish_operation(result: &resym::model::OperationResult) -> CmdResult {
    println!("{}", output::format_json(result));
    if result.success {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_rename(
    root: &str,
    file: &str,
    name: &str,
    to: &str,
    kind: &str,
    in_class: Option<&str>,
    in_function: Option<&str>,
    collision_scope: &str,
) -> CmdResult {
    let scope = match collision_scope {
        "file" => CollisionScope::File,
        "project" => CollisionScope::Project,
        other => return Err(map_err(format!("collision scope must be file or project, got '{other}'"))),
    };
    let op = Operation::Rename {
        selector: build_selector(file, name, kind, in_class, in_function)?,
        new_name: to.to_string(),
        scope,
        reason: None,
    };
    let mut engine = Engine::open(root).map_err(map_err)?;
    finish_operation(&engine.execute_operation(&op))
}

fn cmd_move(root: &str, file: &str, name: &str, dest: &str, kind: &str, copy: bool) -> CmdResult {
    let op = Operation::Move {
        selector: build_selector(file, name, kind, None, None)?,
        target_file_path: dest.to_string(),
        copy_only: copy,
        reason: None,
    };
    let mut engine = Engine::open(root).map_err(map_err)?;
    finish_operation(&engine.execute_operation(&op))
}

fn cmd_remove(
    root: &str,
    file: &str,
    name: &str,
    kind: &str,
    force: bool,
    cleanup: bool,
) -> CmdResult {
    let op = Operation::Remove {
        selector: build_selector(file, name, kind, None, None)?,
        force_remove: force,
        cleanup_dependencies: cleanup,
        reason: None,
    };
    let mut engine = Engine::open(root).map_err(map_err)?;
    finish_operation(&engine.execute_operation(&op))
}

fn read_input(arg: Option<&str>) -> Result<String, Box<dyn std::fmt::Display>> {
    match arg {
        Some(path) => std::fs::read_to_string(path).map_err(map_err),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(map_err)?;
            Ok(buf)
        }
    }
}

fn parse_batch_request(input: &str) -> Result<BatchRequest, Box<dyn std::fmt::Display>> {
    if let Ok(request) = serde_json::from_str::<BatchRequest>(input) {
        return Ok(request);
    }
    let operations: Vec<Operation> = serde_json::from_str(input).map_err(|e| {
        map_err(ResymError::ParseError {
            detail: format!("batch input is neither a batch request nor an operation array: {e}"),
        })
    })?;
    Ok(BatchRequest {
        operations,
        options: BatchOptions::default(),
    })
}

fn run_batch(root: &str, mut request: BatchRequest, stop_on_error: Option<bool>) -> CmdResult {
    if let Some(stop) = stop_on_error {
        request.options.stop_on_error = stop;
    }
    let mut engine = Engine::open(root).map_err(map_err)?;
    let mut checkpoint = FsCheckpoint::new(engine.config().project_root.clone());
    let result = engine.execute_batch(&request, &mut checkpoint);
    println!("{}", output::format_json(&result));
    if result.success {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn cmd_batch(root: &str, file: Option<&str>, stop_on_error: Option<bool>) -> CmdResult {
    let input = read_input(file)?;
    let request = parse_batch_request(&input)?;
    run_batch(root, request, stop_on_error)
}

fn cmd_parse(root: &str, text: Option<&str>, execute: bool) -> CmdResult {
    let input = match text {
        Some(t) => t.to_string(),
        None => read_input(None)?,
    };
    let operations = freetext::extract_operations(&input).map_err(map_err)?;

    if execute {
        return run_batch(
            root,
            BatchRequest {
                operations,
                options: BatchOptions::default(),
            },
            None,
        );
    }

    #[derive(serde::Serialize)]
    struct ParsedOutput {
        count: usize,
        operations: Vec<Operation>,
    }
    println!(
        "{}",
        output::format_json(&ParsedOutput {
            count: operations.len(),
            operations,
        })
    );
    Ok(())
}

fn cmd_refs(
    root: &str,
    file: &str,
    name: &str,
    kind: &str,
    in_class: Option<&str>,
) -> CmdResult {
    let selector = build_selector(file, name, kind, in_class, None)?;
    let engine = Engine::open(root).map_err(map_err)?;
    let (sym, sites) = engine.references(&selector).map_err(map_err)?;
    println!("{}", output::format_json(&RefsReport::new(&sym, &sites)));
    Ok(())
}
