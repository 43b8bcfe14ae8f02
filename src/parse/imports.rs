//! Import and export declaration models.
//!
//! Extraction walks the top level of the tree only; ES module
//! declarations cannot nest.

use tree_sitter::{Node, Tree};

use crate::model::Span;
use crate::project::paths::specifier_candidates;
use crate::project::ProjectTree;

/// One name inside a named-import, re-export, or export list.
#[derive(Debug, Clone)]
pub struct NamedSpec {
    /// Name on the module-being-imported-from side.
    pub imported: String,
    /// Local binding (alias if written `name as alias`, else `imported`).
    pub local: String,
    /// Whole specifier, `name` or `name as alias`.
    pub span: Span,
    /// The imported-name identifier only.
    pub imported_span: Span,
    pub aliased: bool,
}

/// An `import ... from '...'` or `export ... from '...'` declaration.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// Whole statement.
    pub span: Span,
    /// Module specifier with quotes stripped.
    pub module: String,
    /// The string literal including quotes.
    pub source_span: Span,
    pub quote: char,
    pub default_name: Option<String>,
    pub default_span: Option<Span>,
    /// `import * as NS` binding.
    pub namespace_name: Option<String>,
    pub named: Vec<NamedSpec>,
    /// The `{ ... }` block including braces.
    pub named_block_span: Option<Span>,
    /// `export { ... } from` / `export * from` rather than `import`.
    pub reexport: bool,
    /// `export * from '...'` (re-exports everything).
    pub star: bool,
    pub type_only: bool,
    pub line: u32,
}

impl ImportDecl {
    /// The named spec importing `name` (by imported-side name).
    #[must_use]
    pub fn spec_for(&self, name: &str) -> Option<&NamedSpec> {
        self.named.iter().find(|s| s.imported == name)
    }

    /// Whether removing `name` would leave the declaration empty.
    #[must_use]
    pub fn only_names(&self, name: &str) -> bool {
        self.default_name.is_none()
            && self.namespace_name.is_none()
            && self.named.len() == 1
            && self.named[0].imported == name
    }
}

/// A local `export { a, b as c };` list (no source module).
#[derive(Debug, Clone)]
pub struct ExportList {
    pub span: Span,
    /// `imported` = local declaration name, `local` = exported-as name.
    pub names: Vec<NamedSpec>,
}

/// Extract import declarations, re-exports, and local export lists.
#[must_use]
pub fn extract_imports(tree: &Tree, source: &str) -> (Vec<ImportDecl>, Vec<ExportList>) {
    let source_bytes = source.as_bytes();
    let root = tree.root_node();
    let mut imports = Vec::new();
    let mut export_lists = Vec::new();

    for i in 0..root.named_child_count() {
        let Some(stmt) = root.named_child(i as u32) else {
            continue;
        };
        match stmt.kind() {
            "import_statement" => {
                if let Some(decl) = parse_import_statement(stmt, source_bytes, false) {
                    imports.push(decl);
                }
            }
            "export_statement" => {
                if stmt.child_by_field_name("source").is_some() {
                    if let Some(decl) = parse_import_statement(stmt, source_bytes, true) {
                        imports.push(decl);
                    }
                } else if let Some(list) = parse_export_list(stmt, source_bytes) {
                    export_lists.push(list);
                }
            }
            _ => {}
        }
    }

    (imports, export_lists)
}

fn parse_import_statement(stmt: Node, source: &[u8], reexport: bool) -> Option<ImportDecl> {
    let source_node = stmt.child_by_field_name("source")?;
    let raw = source_node.utf8_text(source).ok()?;
    let quote = raw.chars().next().unwrap_or('\'');
    let module = raw.trim_matches(['"', '\'']).to_string();

    let mut decl = ImportDecl {
        span: Span::new(stmt.start_byte(), stmt.end_byte()),
        module,
        source_span: Span::new(source_node.start_byte(), source_node.end_byte()),
        quote,
        default_name: None,
        default_span: None,
        namespace_name: None,
        named: Vec::new(),
        named_block_span: None,
        reexport,
        star: false,
        type_only: is_type_only(stmt),
        line: stmt.start_position().row as u32 + 1,
    };

    for i in 0..stmt.child_count() {
        let Some(child) = stmt.child(i as u32) else {
            continue;
        };
        match child.kind() {
            "import_clause" => parse_import_clause(child, source, &mut decl),
            "export_clause" => parse_named_block(child, source, &mut decl),
            "namespace_import" | "namespace_export" => parse_namespace_binding(child, source, &mut decl),
            "*" => decl.star = true,
            _ => {}
        }
    }

    Some(decl)
}

fn parse_import_clause(clause: Node, source: &[u8], decl: &mut ImportDecl) {
    for i in 0..clause.named_child_count() {
        let Some(child) = clause.named_child(i as u32) else {
            continue;
        };
        match child.kind() {
            "identifier" => {
                decl.default_name = Some(node_text(child, source));
                decl.default_span = Some(Span::new(child.start_byte(), child.end_byte()));
            }
            "namespace_import" => parse_namespace_binding(child, source, decl),
            "named_imports" => parse_named_block(child, source, decl),
            _ => {}
        }
    }
}

fn parse_namespace_binding(node: Node, source: &[u8], decl: &mut ImportDecl) {
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i as u32) {
            if child.kind() == "identifier" {
                decl.namespace_name = Some(node_text(child, source));
                return;
            }
        }
    }
}

/// Shared shape of `named_imports` and `export_clause`: a braced list
/// of specifiers with optional aliases.
fn parse_named_block(block: Node, source: &[u8], decl: &mut ImportDecl) {
    decl.named_block_span = Some(Span::new(block.start_byte(), block.end_byte()));
    decl.named = parse_specs(block, source);
}

fn parse_specs(block: Node, source: &[u8]) -> Vec<NamedSpec> {
    let mut specs = Vec::new();
    for i in 0..block.named_child_count() {
        let Some(spec) = block.named_child(i as u32) else {
            continue;
        };
        if !matches!(spec.kind(), "import_specifier" | "export_specifier") {
            continue;
        }
        let Some(name_node) = spec.child_by_field_name("name") else {
            continue;
        };
        let alias_node = spec.child_by_field_name("alias");
        let imported = node_text(name_node, source);
        let local = alias_node
            .map(|a| node_text(a, source))
            .unwrap_or_else(|| imported.clone());
        specs.push(NamedSpec {
            imported,
            local,
            span: Span::new(spec.start_byte(), spec.end_byte()),
            imported_span: Span::new(name_node.start_byte(), name_node.end_byte()),
            aliased: alias_node.is_some(),
        });
    }
    specs
}

fn parse_export_list(stmt: Node, source: &[u8]) -> Option<ExportList> {
    for i in 0..stmt.named_child_count() {
        let Some(child) = stmt.named_child(i as u32) else {
            continue;
        };
        if child.kind() == "export_clause" {
            return Some(ExportList {
                span: Span::new(stmt.start_byte(), stmt.end_byte()),
                names: parse_specs(child, source),
            });
        }
    }
    None
}

fn is_type_only(stmt: Node) -> bool {
    for i in 0..stmt.child_count() {
        if let Some(child) = stmt.child(i as u32) {
            if child.kind() == "type" {
                return true;
            }
            if matches!(child.kind(), "import_clause" | "export_clause" | "string") {
                break;
            }
        }
    }
    false
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

/// Resolve an import declaration's module specifier to a file in the
/// project tree, if it denotes one.
#[must_use]
pub fn resolve_module(importer: &str, decl: &ImportDecl, tree: &ProjectTree) -> Option<String> {
    specifier_candidates(importer, &decl.module)
        .into_iter()
        .find(|c| tree.contains(c))
}
