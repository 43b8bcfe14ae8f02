//! Import declaration rewriting primitives.
//!
//! Rules enforced here: one import declaration per module per file
//! (merge instead of duplicating), no self-imports, and deleting the
//! last name in a declaration deletes the declaration.

use crate::edit::text_edit::TextEdit;
use crate::model::Span;
use crate::parse::imports::{resolve_module, ImportDecl, NamedSpec};
use crate::parse::ModuleView;
use crate::project::paths::relative_specifier;
use crate::project::ProjectTree;

/// What an import points at: a project file, or a raw specifier kept
/// verbatim (package imports).
#[derive(Debug, Clone, Copy)]
pub enum ModuleRef<'a> {
    File(&'a str),
    Raw(&'a str),
}

impl ModuleRef<'_> {
    fn matches(&self, importer: &str, decl: &ImportDecl, tree: &ProjectTree) -> bool {
        match self {
            Self::File(target) => {
                resolve_module(importer, decl, tree).as_deref() == Some(*target)
            }
            Self::Raw(spec) => decl.module == *spec,
        }
    }

    fn specifier(&self, importer: &str) -> String {
        match self {
            Self::File(target) => relative_specifier(importer, target),
            Self::Raw(spec) => (*spec).to_string(),
        }
    }

    fn is_self(&self, importer: &str) -> bool {
        matches!(self, Self::File(target) if *target == importer)
    }
}

/// Quote style for new import statements: follow the file's existing
/// imports, single quotes otherwise.
#[must_use]
pub fn preferred_quote(view: &ModuleView) -> char {
    view.imports.first().map_or('\'', |i| i.quote)
}

fn spec_text(name: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) if alias != name => format!("{name} as {alias}"),
        _ => name.to_string(),
    }
}

fn specs_text(specs: &[(String, Option<String>)]) -> String {
    specs
        .iter()
        .map(|(n, a)| spec_text(n, a.as_deref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a full import or re-export statement.
#[must_use]
pub fn statement_text(
    specs: &[(String, Option<String>)],
    specifier: &str,
    quote: char,
    reexport: bool,
) -> String {
    let keyword = if reexport { "export" } else { "import" };
    format!(
        "{keyword} {{ {} }} from {quote}{specifier}{quote};\n",
        specs_text(specs)
    )
}

/// Whether `view` (the file at `importer`) already imports `name` from
/// the file at `target`.
#[must_use]
pub fn has_named_import(
    importer: &str,
    view: &ModuleView,
    target: &str,
    name: &str,
    tree: &ProjectTree,
) -> bool {
    view.plain_imports().any(|decl| {
        ModuleRef::File(target).matches(importer, decl, tree) && decl.spec_for(name).is_some()
    })
}

/// Add named imports of `names` from `module` to the file at
/// `importer`, as one declaration: merged into an existing declaration
/// for the same module when there is one, a single new statement
/// otherwise. Self-imports are suppressed. Returns whether an edit was
/// emitted.
pub fn ensure_named_imports(
    importer: &str,
    view: &ModuleView,
    text: &str,
    module: ModuleRef<'_>,
    names: &[(String, Option<String>)],
    tree: &ProjectTree,
    edits: &mut Vec<TextEdit>,
) -> bool {
    if module.is_self(importer) {
        return false;
    }

    if let Some(decl) = view
        .plain_imports()
        .find(|d| module.matches(importer, d, tree))
    {
        let missing: Vec<(String, Option<String>)> = names
            .iter()
            .filter(|(n, _)| decl.spec_for(n).is_none())
            .cloned()
            .collect();
        if missing.is_empty() {
            return false;
        }
        let joined = specs_text(&missing);
        if let Some(block) = decl.named_block_span {
            let edit = match decl.named.last() {
                Some(last) => TextEdit::insert(last.span.end, format!(", {joined}")),
                None => TextEdit::insert(block.start + 1, format!(" {joined}")),
            };
            edits.push(edit);
            return true;
        }
        if let Some(default_span) = decl.default_span {
            edits.push(TextEdit::insert(
                default_span.end,
                format!(", {{ {joined} }}"),
            ));
            return true;
        }
        // namespace-only declaration cannot take named specifiers;
        // fall through to a fresh statement
    }

    let stmt = statement_text(
        names,
        &module.specifier(importer),
        preferred_quote(view),
        false,
    );
    edits.push(TextEdit::insert(view.import_insert_offset(text), stmt));
    true
}

/// Single-name convenience over [`ensure_named_imports`].
pub fn ensure_named_import(
    importer: &str,
    view: &ModuleView,
    text: &str,
    target: &str,
    name: &str,
    alias: Option<&str>,
    tree: &ProjectTree,
    edits: &mut Vec<TextEdit>,
) -> bool {
    ensure_named_imports(
        importer,
        view,
        text,
        ModuleRef::File(target),
        &[(name.to_string(), alias.map(String::from))],
        tree,
        edits,
    )
}

/// Remove the named import (or re-export) of `name` in `view`.
/// `from_target` restricts removal to declarations resolving to that
/// file. Deleting the last name deletes the whole declaration.
/// Returns whether an edit was emitted.
pub fn remove_named_import(
    importer: &str,
    view: &ModuleView,
    text: &str,
    name: &str,
    from_target: Option<&str>,
    tree: &ProjectTree,
    include_reexports: bool,
    edits: &mut Vec<TextEdit>,
) -> bool {
    let mut removed = false;
    for decl in &view.imports {
        if decl.reexport && !include_reexports {
            continue;
        }
        if let Some(target) = from_target {
            if !ModuleRef::File(target).matches(importer, decl, tree) {
                continue;
            }
        }
        if decl.spec_for(name).is_none() {
            continue;
        }
        if let Some(edit) = retain_named_specs(decl, text, |s| s.imported != name) {
            edits.push(edit);
            removed = true;
        }
    }
    removed
}

/// Rewrite a declaration so only the specifiers accepted by `keep`
/// survive. Returns `None` when nothing would change; deletes the
/// whole declaration when nothing named remains and nothing else is
/// bound.
pub fn retain_named_specs(
    decl: &ImportDecl,
    text: &str,
    keep: impl Fn(&NamedSpec) -> bool,
) -> Option<TextEdit> {
    let kept: Vec<&NamedSpec> = decl.named.iter().filter(|s| keep(s)).collect();
    if kept.len() == decl.named.len() {
        return None;
    }

    if kept.is_empty() {
        if decl.default_name.is_none() && decl.namespace_name.is_none() {
            return Some(delete_statement(decl.span, text));
        }
        // `import Default, { name } from ...` → drop `, { ... }`
        if let (Some(default_span), Some(block)) = (decl.default_span, decl.named_block_span) {
            return Some(TextEdit::delete(Span::new(default_span.end, block.end)));
        }
        return None;
    }

    let block = decl.named_block_span?;
    let rebuilt = kept
        .iter()
        .map(|s| spec_text(&s.imported, s.aliased.then_some(s.local.as_str())))
        .collect::<Vec<_>>()
        .join(", ");
    Some(TextEdit::replace(block, format!("{{ {rebuilt} }}")))
}

/// Repoint a declaration's module specifier, keeping the quote style.
#[must_use]
pub fn rewrite_specifier(decl: &ImportDecl, new_spec: &str) -> TextEdit {
    let q = decl.quote;
    TextEdit::replace(decl.source_span, format!("{q}{new_spec}{q}"))
}

/// Insert a statement on its own line right after an existing one.
#[must_use]
pub fn insert_statement_after(span: Span, text: &str, stmt: String) -> TextEdit {
    if text[span.end..].starts_with('\n') {
        TextEdit::insert(span.end + 1, stmt)
    } else {
        TextEdit::insert(span.end, format!("\n{}", stmt.trim_end()))
    }
}

/// Delete a whole statement including its line break.
#[must_use]
pub fn delete_statement(span: Span, text: &str) -> TextEdit {
    let mut end = span.end;
    if text[end..].starts_with("\r\n") {
        end += 2;
    } else if text[end..].starts_with('\n') {
        end += 1;
    }
    TextEdit::delete(Span::new(span.start, end))
}
