//! Symbol resolution.
//!
//! Turns a declarative [`Selector`] into exactly one concrete
//! declaration. No side effects; the result is a value snapshot that
//! is recomputed per operation and never cached across mutations.

use crate::error::{ResymError, Result};
use crate::model::{Declaration, ResolvedSymbol, Selector};
use crate::parse::ModuleView;
use crate::project::ProjectTree;

/// Resolve a selector against the project tree.
///
/// A selector with a file path searches that file only; an empty file
/// path searches the whole project. Matching is on name + kind, plus
/// the enclosing scope when one is given. Zero matches is `NotFound`;
/// more than one match without a scope is `AmbiguousSymbol` rather
/// than a silent first-match.
pub fn resolve(tree: &ProjectTree, selector: &Selector) -> Result<ResolvedSymbol> {
    let mut matches: Vec<ResolvedSymbol> = Vec::new();

    if selector.file_path.is_empty() {
        for (path, text) in tree.iter() {
            let Ok(view) = ModuleView::parse(path, text) else {
                continue;
            };
            collect_matches(&view, selector, &mut matches);
        }
    } else {
        let text = tree.text(&selector.file_path)?;
        let view = ModuleView::parse(&selector.file_path, text)?;
        collect_matches(&view, selector, &mut matches);
    }

    match matches.len() {
        0 => Err(ResymError::NotFound {
            name: selector.name.clone(),
        }),
        1 => Ok(matches.remove(0)),
        n => Err(ResymError::AmbiguousSymbol {
            name: selector.name.clone(),
            count: n,
        }),
    }
}

fn collect_matches(view: &ModuleView, selector: &Selector, out: &mut Vec<ResolvedSymbol>) {
    for decl in &view.decls {
        if decl.name != selector.name || decl.kind != selector.kind {
            continue;
        }
        if !scope_accepts(decl, selector) {
            continue;
        }
        out.push(ResolvedSymbol::from_declaration(&view.path, decl));
    }
}

fn scope_accepts(decl: &Declaration, selector: &Selector) -> bool {
    match &selector.scope {
        Some(scope) => decl.matches_scope(scope),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SymbolKind;

    fn tree() -> ProjectTree {
        ProjectTree::from_files([
            (
                "src/math.ts".to_string(),
                "export function calculateTotal(xs: number[]): number {\n    return xs.reduce((a, b) => a + b, 0);\n}\n"
                    .to_string(),
            ),
            (
                "src/service.ts".to_string(),
                "export class UserService {\n    getUser(id: string) { return id; }\n}\n\nexport class AdminService {\n    getUser(id: string) { return id; }\n}\n"
                    .to_string(),
            ),
        ])
    }

    #[test]
    fn resolves_unique_function() {
        let sel = Selector::new("calculateTotal", SymbolKind::Function, "src/math.ts");
        let sym = resolve(&tree(), &sel).unwrap();
        assert_eq!(sym.file, "src/math.ts");
        assert_eq!(sym.kind, SymbolKind::Function);
        assert!(sym.exported);
    }

    #[test]
    fn missing_symbol_is_not_found() {
        let sel = Selector::new("nope", SymbolKind::Function, "src/math.ts");
        let err = resolve(&tree(), &sel).unwrap_err();
        assert_eq!(err.to_string(), "Symbol 'nope' not found");
    }

    #[test]
    fn kind_mismatch_is_not_found() {
        let sel = Selector::new("calculateTotal", SymbolKind::Class, "src/math.ts");
        assert!(matches!(
            resolve(&tree(), &sel),
            Err(ResymError::NotFound { .. })
        ));
    }

    #[test]
    fn ambiguous_member_without_scope() {
        let sel = Selector::new("getUser", SymbolKind::Method, "src/service.ts");
        let err = resolve(&tree(), &sel).unwrap_err();
        assert!(matches!(err, ResymError::AmbiguousSymbol { count: 2, .. }));
    }

    #[test]
    fn scope_disambiguates_member() {
        let sel = Selector::new("getUser", SymbolKind::Method, "src/service.ts")
            .in_class("AdminService");
        let sym = resolve(&tree(), &sel).unwrap();
        assert_eq!(sym.class_name(), Some("AdminService"));
    }

    #[test]
    fn empty_file_path_searches_project() {
        let sel = Selector::new("calculateTotal", SymbolKind::Function, "");
        let sym = resolve(&tree(), &sel).unwrap();
        assert_eq!(sym.file, "src/math.ts");
    }

    #[test]
    fn missing_file_is_an_error() {
        let sel = Selector::new("x", SymbolKind::Function, "src/missing.ts");
        assert!(matches!(
            resolve(&tree(), &sel),
            Err(ResymError::FileNotFound { .. })
        ));
    }
}
