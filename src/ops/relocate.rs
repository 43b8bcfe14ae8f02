//! Move orchestration.
//!
//! Pipeline: validate destination → compute dependency set → extract
//! declaration text → inject into destination → remove from source
//! (unless copy-only) → rewire every importer project-wide.

use std::collections::BTreeMap;

use crate::edit::import_rewriter::{
    ensure_named_imports, insert_statement_after, preferred_quote, retain_named_specs,
    rewrite_specifier, statement_text, ModuleRef,
};
use crate::edit::text_edit::{EditSet, TextEdit};
use crate::error::{ResymError, Result};
use crate::model::{RefSiteKind, ReferenceSite, ResolvedSymbol, Selector};
use crate::ops::context::BatchContext;
use crate::ops::{extended_delete, remove_from_export_list};
use crate::parse::imports::resolve_module;
use crate::parse::ModuleView;
use crate::project::paths::{is_source_path, relative_specifier};
use crate::project::ProjectTree;
use crate::refs::{identifiers_in_span, ReferenceIndex};
use crate::resolve::resolve;

type Binding = (String, Option<String>);

pub fn plan(
    tree: &ProjectTree,
    selector: &Selector,
    target: &str,
    copy_only: bool,
    ctx: &BatchContext,
) -> Result<(ResolvedSymbol, EditSet)> {
    let sym = resolve(tree, selector)?;
    if sym.kind.is_member() || sym.parent.is_some() {
        return Err(ResymError::UnsupportedOperation {
            detail: format!("only top-level declarations can be moved; '{}' is nested", sym.name),
        });
    }
    validate_target(&sym, target)?;

    let index = ReferenceIndex::build(tree);
    validate_destination(&index, &sym, target, ctx)?;

    let src_text = tree.text(&sym.file)?;
    let src_view = index
        .view(&sym.file)
        .ok_or_else(|| ResymError::Parse {
            path: sym.file.clone(),
            detail: "declaring file failed to parse".into(),
        })?;

    let sites = index.find_references(tree, &sym);
    let providers = index.providers(tree, &sym.file, &sym.name);

    let exported_via_list = src_view
        .export_lists
        .iter()
        .any(|l| l.names.iter().any(|s| s.imported == sym.name));
    let residual = has_residual_use(&sym, &sites, src_view);
    let has_importers = sites.iter().any(|s| {
        s.file != sym.file
            && matches!(
                s.kind,
                RefSiteKind::ImportName { .. }
                    | RefSiteKind::ReExportName
                    | RefSiteKind::NamespaceMember { .. }
            )
    });

    let mut decl_text = src_text[sym.span.start..sym.span.end].to_string();
    let needs_export = has_importers || residual || exported_via_list;
    if !sym.exported && needs_export {
        decl_text = format!("export {decl_text}");
    }

    let mut edits = EditSet::new();

    let dependencies = dependency_bindings(&sym, src_view, src_text, index.view(target), tree);
    inject_into_destination(
        tree,
        &index,
        &sym,
        target,
        &decl_text,
        &dependencies,
        &providers,
        &mut edits,
    )?;

    export_hidden_siblings(&sym, src_view, &dependencies, &mut edits);

    if !copy_only {
        remove_from_source(&sym, src_view, src_text, target, residual, tree, &mut edits);
        rewire_importers(tree, &index, &sym, target, &sites, &mut edits);
    }

    Ok((sym, edits))
}

fn validate_target(sym: &ResolvedSymbol, target: &str) -> Result<()> {
    if !is_source_path(target) {
        return Err(ResymError::TargetPrepareFailure {
            path: target.to_string(),
            reason: "unsupported file extension".into(),
        });
    }
    if target == sym.file {
        return Err(ResymError::TargetPrepareFailure {
            path: target.to_string(),
            reason: "destination equals the declaring file".into(),
        });
    }
    Ok(())
}

/// `NamingConflict` when the destination already exports the name —
/// unless the batch itself relocated that name away earlier
/// (false-conflict suppression).
fn validate_destination(
    index: &ReferenceIndex,
    sym: &ResolvedSymbol,
    target: &str,
    ctx: &BatchContext,
) -> Result<()> {
    let Some(dest) = index.view(target) else {
        return Ok(());
    };
    let present =
        dest.declares_top_level(&sym.name) || dest.exported_names().contains(&sym.name);
    if present && !ctx.was_removed_from(target, &sym.name) {
        return Err(ResymError::NamingConflict {
            detail: format!("Symbol '{}' already exists in {target}", sym.name),
        });
    }
    Ok(())
}

/// Plain identifier uses of the symbol left in the source file outside
/// the declaration itself and outside export lists.
fn has_residual_use(sym: &ResolvedSymbol, sites: &[ReferenceSite], src_view: &ModuleView) -> bool {
    sites.iter().any(|s| {
        s.file == sym.file
            && s.kind == RefSiteKind::Ident
            && !sym.span.contains(s.span)
            && !src_view.export_lists.iter().any(|l| l.span.contains(s.span))
    })
}

/// Everything the moved declaration's body references, grouped by the
/// module the destination must import it from. Sibling declarations
/// come from the original source module; carried imports keep their
/// own homes. Bindings already reachable in the destination are
/// dropped.
fn dependency_bindings(
    sym: &ResolvedSymbol,
    src_view: &ModuleView,
    src_text: &str,
    dest_view: Option<&ModuleView>,
    tree: &ProjectTree,
) -> BTreeMap<(bool, String), Vec<Binding>> {
    let used = identifiers_in_span(src_view.lang, src_text, sym.span);
    let mut groups: BTreeMap<(bool, String), Vec<Binding>> = BTreeMap::new();

    let reachable_in_dest = |name: &str| -> bool {
        dest_view.is_some_and(|dv| {
            dv.declares_top_level(name)
                || dv
                    .plain_imports()
                    .any(|i| i.named.iter().any(|s| s.local == name))
        })
    };

    for decl in src_view.top_level_decls() {
        if decl.name == sym.name || !used.contains(&decl.name) {
            continue;
        }
        if reachable_in_dest(&decl.name) {
            continue;
        }
        groups
            .entry((true, sym.file.clone()))
            .or_default()
            .push((decl.name.clone(), None));
    }

    for imp in src_view.plain_imports() {
        let key = match resolve_module(&sym.file, imp, tree) {
            Some(resolved) => (true, resolved),
            None => (false, imp.module.clone()),
        };
        for spec in &imp.named {
            if !used.contains(&spec.local) || reachable_in_dest(&spec.local) {
                continue;
            }
            let alias = spec.aliased.then(|| spec.local.clone());
            groups
                .entry(key.clone())
                .or_default()
                .push((spec.imported.clone(), alias));
        }
    }

    for bindings in groups.values_mut() {
        bindings.sort();
        bindings.dedup();
    }
    groups.retain(|_, v| !v.is_empty());
    groups
}

#[allow(clippy::too_many_arguments)]
fn inject_into_destination(
    tree: &ProjectTree,
    index: &ReferenceIndex,
    sym: &ResolvedSymbol,
    target: &str,
    decl_text: &str,
    dependencies: &BTreeMap<(bool, String), Vec<Binding>>,
    providers: &std::collections::BTreeSet<String>,
    edits: &mut EditSet,
) -> Result<()> {
    if let Some(dest_view) = index.view(target) {
        let dest_text = tree.text(target)?;
        if dest_text.trim().is_empty() {
            // an empty destination gets the composed content in one
            // insert; offset-ordering between imports and declaration
            // is meaningless in an empty file
            edits.push(
                target.to_string(),
                TextEdit::replace(
                    crate::model::Span::new(0, dest_text.len()),
                    compose_module(target, decl_text, dependencies),
                ),
            );
            return Ok(());
        }
        let mut dest_edits: Vec<TextEdit> = Vec::new();

        for ((is_file, module), bindings) in dependencies {
            let module_ref = if *is_file {
                ModuleRef::File(module)
            } else {
                ModuleRef::Raw(module)
            };
            ensure_named_imports(
                target,
                dest_view,
                dest_text,
                module_ref,
                bindings,
                tree,
                &mut dest_edits,
            );
        }

        // the destination may have been an importer itself; it now
        // holds the declaration, so drop those imports (and stale
        // re-exports pointing back at the old home)
        for decl in &dest_view.imports {
            if resolve_module(target, decl, tree)
                .is_some_and(|res| providers.contains(&res))
                && decl.spec_for(&sym.name).is_some()
            {
                if let Some(edit) =
                    retain_named_specs(decl, dest_text, |s| s.imported != sym.name)
                {
                    dest_edits.push(edit);
                }
            }
        }

        let prefix = if dest_text.is_empty() || dest_text.ends_with("\n\n") {
            ""
        } else if dest_text.ends_with('\n') {
            "\n"
        } else {
            "\n\n"
        };
        dest_edits.push(TextEdit::insert(
            dest_text.len(),
            format!("{prefix}{decl_text}\n"),
        ));
        edits.extend(target, dest_edits);
        return Ok(());
    }

    if tree.contains(target) {
        // parsed view missing for an existing file: it cannot be
        // prepared safely
        return Err(ResymError::TargetPrepareFailure {
            path: target.to_string(),
            reason: "destination file could not be parsed".into(),
        });
    }

    // new module
    edits.create(target, compose_module(target, decl_text, dependencies));
    Ok(())
}

/// Full content of a destination module that starts from nothing:
/// dependency imports, a blank line, the declaration.
fn compose_module(
    target: &str,
    decl_text: &str,
    dependencies: &BTreeMap<(bool, String), Vec<Binding>>,
) -> String {
    let mut content = String::new();
    for ((is_file, module), bindings) in dependencies {
        let specifier = if *is_file {
            relative_specifier(target, module)
        } else {
            module.clone()
        };
        content.push_str(&statement_text(bindings, &specifier, '\'', false));
    }
    if !content.is_empty() {
        content.push('\n');
    }
    content.push_str(decl_text);
    content.push('\n');
    content
}

/// A moved declaration may depend on unexported siblings; the
/// destination imports them from the source module, so they must
/// become visible there.
fn export_hidden_siblings(
    sym: &ResolvedSymbol,
    src_view: &ModuleView,
    dependencies: &BTreeMap<(bool, String), Vec<Binding>>,
    edits: &mut EditSet,
) {
    let Some(siblings) = dependencies.get(&(true, sym.file.clone())) else {
        return;
    };
    let listed: Vec<&str> = src_view
        .export_lists
        .iter()
        .flat_map(|l| l.names.iter().map(|s| s.imported.as_str()))
        .collect();
    for (name, _) in siblings {
        let Some(decl) = src_view.find_top_level(name) else {
            continue;
        };
        if decl.exported || listed.contains(&name.as_str()) {
            continue;
        }
        edits.push(
            sym.file.clone(),
            TextEdit::insert(decl.span.start, "export "),
        );
    }
}

fn remove_from_source(
    sym: &ResolvedSymbol,
    src_view: &ModuleView,
    src_text: &str,
    target: &str,
    residual: bool,
    tree: &ProjectTree,
    edits: &mut EditSet,
) {
    let mut src_edits: Vec<TextEdit> = Vec::new();

    src_edits.push(extended_delete(sym.span, src_text));

    for list in &src_view.export_lists {
        if let Some(edit) = remove_from_export_list(list, src_text, &sym.name) {
            src_edits.push(edit);
        }
    }

    if residual {
        ensure_named_imports(
            &sym.file,
            src_view,
            src_text,
            ModuleRef::File(target),
            &[(sym.name.clone(), None)],
            tree,
            &mut src_edits,
        );
    }

    edits.extend(&sym.file, src_edits);
}

/// Every file that imported the moved symbol from its old module now
/// imports it from the new one. Declarations mixing the moved name
/// with untouched names are split so the untouched names keep
/// importing from the old module. Namespace-qualified uses become
/// named imports.
fn rewire_importers(
    tree: &ProjectTree,
    index: &ReferenceIndex,
    sym: &ResolvedSymbol,
    target: &str,
    sites: &[ReferenceSite],
    edits: &mut EditSet,
) {
    for (path, view) in index.views() {
        if path == sym.file || path == target {
            continue;
        }
        let Ok(text) = tree.text(path) else {
            continue;
        };
        let mut file_edits: Vec<TextEdit> = Vec::new();
        let mut pending_imports: Vec<Binding> = Vec::new();
        let mut pending_reexports: Vec<Binding> = Vec::new();

        let has_target_import = view
            .plain_imports()
            .any(|d| resolve_module(path, d, tree).as_deref() == Some(target));
        let has_target_reexport = view
            .imports
            .iter()
            .filter(|d| d.reexport)
            .any(|d| resolve_module(path, d, tree).as_deref() == Some(target));

        for decl in &view.imports {
            if resolve_module(path, decl, tree).as_deref() != Some(sym.file.as_str()) {
                continue;
            }
            let Some(spec) = decl.spec_for(&sym.name) else {
                continue;
            };
            let binding: Binding = (
                sym.name.clone(),
                spec.aliased.then(|| spec.local.clone()),
            );
            let merge_exists = if decl.reexport {
                has_target_reexport
            } else {
                has_target_import
            };
            if decl.only_names(&sym.name) && !merge_exists {
                file_edits.push(rewrite_specifier(decl, &relative_specifier(path, target)));
            } else {
                if let Some(edit) = retain_named_specs(decl, text, |s| s.imported != sym.name) {
                    file_edits.push(edit);
                }
                if decl.reexport {
                    pending_reexports.push(binding);
                } else {
                    pending_imports.push(binding);
                }
            }
        }

        // namespace-qualified uses of the old module lose the symbol;
        // repoint them at a named import from the new module
        let mut ns_rewritten = false;
        for site in sites.iter().filter(|s| s.file == path) {
            if let RefSiteKind::NamespaceMember { expr_span, .. } = &site.kind {
                file_edits.push(TextEdit::replace(*expr_span, sym.name.clone()));
                ns_rewritten = true;
            }
        }
        if ns_rewritten {
            pending_imports.push((sym.name.clone(), None));
        }

        pending_imports.sort();
        pending_imports.dedup();
        if !pending_imports.is_empty() {
            ensure_named_imports(
                path,
                view,
                text,
                ModuleRef::File(target),
                &pending_imports,
                tree,
                &mut file_edits,
            );
        }
        for (name, alias) in pending_reexports {
            add_reexport(path, view, text, target, &name, alias.as_deref(), tree, &mut file_edits);
        }

        if !file_edits.is_empty() {
            edits.extend(path, file_edits);
        }
    }
}

/// Merge a name into an existing re-export from `target`, or add a new
/// re-export statement after the last import.
#[allow(clippy::too_many_arguments)]
fn add_reexport(
    path: &str,
    view: &ModuleView,
    text: &str,
    target: &str,
    name: &str,
    alias: Option<&str>,
    tree: &ProjectTree,
    edits: &mut Vec<TextEdit>,
) {
    if let Some(decl) = view
        .imports
        .iter()
        .filter(|d| d.reexport && !d.star)
        .find(|d| resolve_module(path, d, tree).as_deref() == Some(target))
    {
        if decl.spec_for(name).is_some() {
            return;
        }
        if let Some(last) = decl.named.last() {
            let spec = match alias {
                Some(a) if a != name => format!(", {name} as {a}"),
                _ => format!(", {name}"),
            };
            edits.push(TextEdit::insert(last.span.end, spec));
            return;
        }
    }
    let stmt = statement_text(
        &[(name.to_string(), alias.map(String::from))],
        &relative_specifier(path, target),
        preferred_quote(view),
        true,
    );
    let anchor = view.imports.iter().map(|i| i.span).max_by_key(|s| s.end);
    match anchor {
        Some(span) => edits.push(insert_statement_after(span, text, stmt)),
        None => edits.push(TextEdit::insert(0, stmt)),
    }
}
