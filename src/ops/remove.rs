//! Remove orchestration.
//!
//! Fails by default when the symbol has external referents, naming
//! them; `force_remove` overrides. `cleanup_dependencies` deletes
//! imports that existed only to support the removed declaration while
//! preserving imports still used elsewhere in the file. Removal is
//! restricted to top-level declarations.

use crate::edit::import_rewriter::{delete_statement, retain_named_specs};
use crate::edit::text_edit::{EditSet, TextEdit};
use crate::error::{ResymError, Result};
use crate::model::{RemoveOptions, ResolvedSymbol, Selector, Span};
use crate::ops::context::BatchContext;
use crate::ops::{extended_delete, remove_from_export_list};
use crate::parse::imports::resolve_module;
use crate::parse::ModuleView;
use crate::project::ProjectTree;
use crate::refs::{count_identifier_uses, ReferenceIndex};
use crate::resolve::resolve;

pub fn plan(
    tree: &ProjectTree,
    selector: &Selector,
    options: RemoveOptions,
    _ctx: &BatchContext,
) -> Result<(ResolvedSymbol, EditSet)> {
    let sym = resolve(tree, selector)?;
    if sym.kind.is_member() || sym.parent.is_some() {
        return Err(ResymError::UnsupportedOperation {
            detail: format!(
                "removing nested members is not supported; '{}' is declared inside '{}'",
                sym.name,
                sym.parent.as_ref().map_or("another declaration", |p| p.name.as_str()),
            ),
        });
    }

    let index = ReferenceIndex::build(tree);
    let external = index.external_references(tree, &sym);
    if !external.is_empty() && !options.force_remove {
        let mut locations: Vec<String> = external
            .iter()
            .map(|s| format!("{}:{}", s.file, s.line))
            .collect();
        locations.dedup();
        let shown = if locations.len() > 8 {
            format!("{}, …", locations[..8].join(", "))
        } else {
            locations.join(", ")
        };
        return Err(ResymError::ReferencedSymbol {
            name: sym.name.clone(),
            count: external.len(),
            locations: shown,
        });
    }

    let src_text = tree.text(&sym.file)?;
    let src_view = index.view(&sym.file).ok_or_else(|| ResymError::Parse {
        path: sym.file.clone(),
        detail: "declaring file failed to parse".into(),
    })?;

    let mut edits = EditSet::new();
    edits.push(sym.file.clone(), extended_delete(sym.span, src_text));

    for list in &src_view.export_lists {
        if let Some(edit) = remove_from_export_list(list, src_text, &sym.name) {
            edits.push(sym.file.clone(), edit);
        }
    }

    if options.force_remove && !external.is_empty() {
        strip_dead_imports(tree, &index, &sym, &mut edits);
    }

    if options.cleanup_dependencies {
        cleanup_dependencies(&sym, src_view, src_text, &mut edits);
    }

    Ok((sym, edits))
}

/// Under `force_remove`, importers must not keep import declarations
/// pointing at the now-missing declaration.
fn strip_dead_imports(
    tree: &ProjectTree,
    index: &ReferenceIndex,
    sym: &ResolvedSymbol,
    edits: &mut EditSet,
) {
    let providers = index.providers(tree, &sym.file, &sym.name);
    for (path, view) in index.views() {
        if path == sym.file {
            continue;
        }
        let Ok(text) = tree.text(path) else {
            continue;
        };
        for decl in &view.imports {
            if resolve_module(path, decl, tree).is_some_and(|res| providers.contains(&res))
                && decl.spec_for(&sym.name).is_some()
            {
                if let Some(edit) = retain_named_specs(decl, text, |s| s.imported != sym.name) {
                    edits.push(path.to_string(), edit);
                }
            }
        }
    }
}

/// Delete imports in the declaring file whose bindings were used only
/// inside the removed declaration.
fn cleanup_dependencies(
    sym: &ResolvedSymbol,
    src_view: &ModuleView,
    src_text: &str,
    edits: &mut EditSet,
) {
    let mut skip: Vec<Span> = src_view.imports.iter().map(|i| i.span).collect();
    skip.push(sym.span);

    for decl in src_view.plain_imports() {
        let used = |binding: &str| -> bool {
            count_identifier_uses(src_view.lang, src_text, binding, &skip) > 0
        };

        let default_used = decl.default_name.as_deref().is_some_and(&used);
        let namespace_used = decl.namespace_name.as_deref().is_some_and(&used);
        let any_named_used = decl.named.iter().any(|s| used(&s.local));

        if !default_used && !namespace_used && !any_named_used {
            edits.push(
                sym.file.clone(),
                delete_statement(decl.span, src_text),
            );
            continue;
        }
        if decl.named.iter().any(|s| !used(&s.local)) {
            if let Some(edit) = retain_named_specs(decl, src_text, |s| used(&s.local)) {
                edits.push(sym.file.clone(), edit);
            }
        }
    }
}
