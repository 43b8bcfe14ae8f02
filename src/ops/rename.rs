//! Rename orchestration.
//!
//! Pipeline: validate → rewrite declaration → rewrite every reference
//! → report. Alias names are left untouched; only the name they point
//! at changes. Namespace-qualified calls keep their prefix.

use crate::edit::text_edit::{EditSet, TextEdit};
use crate::error::{ResymError, Result};
use crate::model::{
    CollisionScope, RefSiteKind, ResolvedSymbol, Selector,
};
use crate::ops::context::BatchContext;
use crate::refs::ReferenceIndex;
use crate::resolve::resolve;
use crate::project::ProjectTree;

pub fn plan(
    tree: &ProjectTree,
    selector: &Selector,
    new_name: &str,
    scope: CollisionScope,
    _ctx: &BatchContext,
) -> Result<(ResolvedSymbol, EditSet)> {
    let sym = resolve(tree, selector)?;
    let index = ReferenceIndex::build(tree);

    if sym.kind.is_member() {
        validate_member_rename(&index, &sym, new_name)?;
    } else {
        validate_top_level_rename(tree, &index, &sym, new_name, scope)?;
    }

    let mut edits = EditSet::new();
    edits.push(sym.file.clone(), TextEdit::replace(sym.name_span, new_name));

    for site in index.find_references(tree, &sym) {
        match &site.kind {
            RefSiteKind::Ident
            | RefSiteKind::ImportName { .. }
            | RefSiteKind::ReExportName
            | RefSiteKind::MemberAccess
            | RefSiteKind::NamespaceMember { .. } => {
                edits.push(site.file.clone(), TextEdit::replace(site.span, new_name));
            }
        }
    }

    Ok((sym, edits))
}

/// A member rename collides with *any* member kind in the same class;
/// the same name in an unrelated class, function, or module never
/// conflicts. The constructor cannot be renamed.
fn validate_member_rename(
    index: &ReferenceIndex,
    sym: &ResolvedSymbol,
    new_name: &str,
) -> Result<()> {
    let class = sym
        .class_name()
        .map(str::to_string)
        .ok_or_else(|| ResymError::UnsupportedOperation {
            detail: format!("member '{}' has no enclosing class", sym.name),
        })?;

    if sym.name == "constructor" {
        return Err(ResymError::UnsupportedOperation {
            detail: format!("Constructor of class '{class}' cannot be renamed"),
        });
    }

    let Some(view) = index.view(&sym.file) else {
        return Ok(());
    };
    for member in view.members_of(&class) {
        if member.name == new_name && member.kind != sym.kind {
            return Err(ResymError::NamingConflict {
                detail: format!(
                    "{} '{new_name}' already exists in class '{class}'",
                    member.kind.label()
                ),
            });
        }
        if member.name == new_name && member.kind == sym.kind && member.name_span != sym.name_span {
            return Err(ResymError::NamingConflict {
                detail: format!(
                    "{} '{new_name}' already exists in class '{class}'",
                    member.kind.label()
                ),
            });
        }
    }
    Ok(())
}

/// File scope checks the declaring file; project scope additionally
/// checks every module whose plain import of the symbol would collide
/// after the rename.
fn validate_top_level_rename(
    tree: &ProjectTree,
    index: &ReferenceIndex,
    sym: &ResolvedSymbol,
    new_name: &str,
    scope: CollisionScope,
) -> Result<()> {
    if let Some(view) = index.view(&sym.file) {
        if view.declares_top_level(new_name) || view.exported_names().contains(new_name) {
            return Err(ResymError::NamingConflict {
                detail: format!("Symbol '{new_name}' already exists in {}", sym.file),
            });
        }
    }

    if scope == CollisionScope::File {
        return Ok(());
    }

    for site in index.find_references(tree, sym) {
        if site.file == sym.file {
            continue;
        }
        let renames_local_binding = matches!(
            site.kind,
            RefSiteKind::ImportName { aliased: false } | RefSiteKind::Ident
        );
        if !renames_local_binding {
            continue;
        }
        if let Some(view) = index.view(&site.file) {
            let import_collision = view
                .plain_imports()
                .any(|i| i.named.iter().any(|s| s.local == new_name));
            if view.declares_top_level(new_name) || import_collision {
                return Err(ResymError::NamingConflict {
                    detail: format!("Symbol '{new_name}' already exists in {}", site.file),
                });
            }
        }
    }
    Ok(())
}
