//! The reference index.
//!
//! Given a resolved symbol, enumerates every syntactic occurrence
//! project-wide: direct identifier use, import specifiers (plain or
//! aliased), re-export specifiers, and namespace-qualified member
//! access. Implemented as an explicit visitor returning an immutable
//! list of sites; downstream rewriters visit each site exactly once.
//!
//! The index re-parses the reachable project per operation. Linear
//! batch cost is the accepted price of correctness over incremental
//! re-indexing.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::Node;

use crate::model::{RefSiteKind, ReferenceSite, ResolvedSymbol, Span};
use crate::parse::imports::resolve_module;
use crate::parse::{parse_tree, Language, ModuleView};
use crate::project::ProjectTree;

/// Per-operation parsed view of every file in the tree.
pub struct ReferenceIndex {
    views: BTreeMap<String, ModuleView>,
}

impl ReferenceIndex {
    /// Parse every file once. Files that fail to parse are skipped
    /// with a warning; they cannot be rewritten safely anyway.
    #[must_use]
    pub fn build(tree: &ProjectTree) -> Self {
        let mut views = BTreeMap::new();
        for (path, text) in tree.iter() {
            match ModuleView::parse(path, text) {
                Ok(view) => {
                    views.insert(path.to_string(), view);
                }
                Err(e) => {
                    tracing::warn!(path, error = %e, "skipping unparseable file");
                }
            }
        }
        Self { views }
    }

    #[must_use]
    pub fn view(&self, path: &str) -> Option<&ModuleView> {
        self.views.get(path)
    }

    pub fn views(&self) -> impl Iterator<Item = (&str, &ModuleView)> {
        self.views.iter().map(|(p, v)| (p.as_str(), v))
    }

    /// Modules that (re-)export `name` originating from `home`:
    /// the declaring file plus the transitive closure of re-exports.
    #[must_use]
    pub fn providers(&self, tree: &ProjectTree, home: &str, name: &str) -> BTreeSet<String> {
        let mut providers: BTreeSet<String> = BTreeSet::new();
        providers.insert(home.to_string());
        loop {
            let mut changed = false;
            for (path, view) in &self.views {
                if providers.contains(path) {
                    continue;
                }
                let reexports = view.imports.iter().filter(|i| i.reexport).any(|imp| {
                    resolve_module(path, imp, tree)
                        .is_some_and(|res| providers.contains(&res))
                        && (imp.star
                            || imp
                                .spec_for(name)
                                .is_some_and(|s| s.local == name))
                });
                if reexports {
                    providers.insert(path.clone());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        providers
    }

    /// Every syntactic occurrence of the symbol, project-wide.
    /// Each occurrence appears exactly once, ordered by file and
    /// offset.
    #[must_use]
    pub fn find_references(&self, tree: &ProjectTree, sym: &ResolvedSymbol) -> Vec<ReferenceSite> {
        let mut sites = if sym.kind.is_member() {
            self.member_references(tree, sym)
        } else {
            self.top_level_references(tree, sym)
        };
        sites.sort_by(|a, b| a.file.cmp(&b.file).then(a.span.start.cmp(&b.span.start)));
        sites.dedup_by(|a, b| a.file == b.file && a.span.start == b.span.start);
        sites
    }

    /// References outside the declaration itself (self-recursion does
    /// not block a removal).
    #[must_use]
    pub fn external_references(
        &self,
        tree: &ProjectTree,
        sym: &ResolvedSymbol,
    ) -> Vec<ReferenceSite> {
        self.find_references(tree, sym)
            .into_iter()
            .filter(|s| s.file != sym.file || !sym.span.contains(s.span))
            .collect()
    }

    fn top_level_references(
        &self,
        tree: &ProjectTree,
        sym: &ResolvedSymbol,
    ) -> Vec<ReferenceSite> {
        let providers = self.providers(tree, &sym.file, &sym.name);
        let mut sites = Vec::new();

        for (path, view) in &self.views {
            let Ok(text) = tree.text(path) else {
                continue;
            };

            // import statements are rewritten via their specifier
            // model, never by the raw identifier scan
            let mut skip: Vec<Span> = view.imports.iter().map(|i| i.span).collect();
            skip.extend(view.export_lists.iter().map(|l| l.span));

            let mut namespaces: Vec<String> = Vec::new();
            let mut scan_idents = path == &sym.file;

            for imp in &view.imports {
                let Some(resolved) = resolve_module(path, imp, tree) else {
                    continue;
                };
                if !providers.contains(&resolved) {
                    continue;
                }
                if let Some(ns) = &imp.namespace_name {
                    namespaces.push(ns.clone());
                }
                if let Some(spec) = imp.spec_for(&sym.name) {
                    let kind = if imp.reexport {
                        RefSiteKind::ReExportName
                    } else {
                        RefSiteKind::ImportName {
                            aliased: spec.aliased,
                        }
                    };
                    sites.push(make_site(path, kind, spec.imported_span, text));
                    if !imp.reexport && !spec.aliased {
                        // plain import binds the name locally
                        scan_idents = true;
                    }
                }
            }

            if path == &sym.file {
                for list in &view.export_lists {
                    for spec in &list.names {
                        if spec.imported == sym.name {
                            sites.push(make_site(
                                path,
                                RefSiteKind::Ident,
                                spec.imported_span,
                                text,
                            ));
                        }
                    }
                }
            }

            if scan_idents {
                let mut skip_here = skip.clone();
                if path == &sym.file {
                    skip_here.push(sym.name_span);
                }
                for hit in scan_identifiers(view.lang, text, &sym.name, &skip_here) {
                    sites.push(make_site(path, RefSiteKind::Ident, hit, text));
                }
            }

            for ns in &namespaces {
                for (prop, expr) in scan_namespace_members(view.lang, text, ns, &sym.name) {
                    sites.push(make_site(
                        path,
                        RefSiteKind::NamespaceMember {
                            namespace: ns.clone(),
                            expr_span: expr,
                        },
                        prop,
                        text,
                    ));
                }
            }
        }

        sites
    }

    /// Class-member references: property accesses in the declaring
    /// file plus files that import the enclosing class. Syntactic;
    /// the engine has no type inference.
    fn member_references(&self, tree: &ProjectTree, sym: &ResolvedSymbol) -> Vec<ReferenceSite> {
        let Some(class) = sym.class_name() else {
            return Vec::new();
        };
        let class_providers = self.providers(tree, &sym.file, class);
        let mut sites = Vec::new();

        for (path, view) in &self.views {
            let in_scope = path == &sym.file
                || view.imports.iter().any(|imp| {
                    resolve_module(path, imp, tree)
                        .is_some_and(|res| class_providers.contains(&res))
                        && (imp.spec_for(class).is_some() || imp.namespace_name.is_some())
                });
            if !in_scope {
                continue;
            }
            let Ok(text) = tree.text(path) else {
                continue;
            };
            let skip = if path == &sym.file {
                vec![sym.name_span]
            } else {
                Vec::new()
            };
            for hit in scan_property_accesses(view.lang, text, &sym.name, &skip) {
                sites.push(make_site(path, RefSiteKind::MemberAccess, hit, text));
            }
        }

        sites
    }
}

/// Identifier names used anywhere inside `span` (dependency scans).
#[must_use]
pub fn identifiers_in_span(lang: Language, text: &str, span: Span) -> BTreeSet<String> {
    let Ok(tree) = parse_tree(lang, text) else {
        return BTreeSet::new();
    };
    let mut names = BTreeSet::new();
    walk(tree.root_node(), &mut |node| {
        if is_identifier_kind(node.kind()) {
            let node_span = Span::new(node.start_byte(), node.end_byte());
            if span.contains(node_span) {
                if let Ok(t) = node.utf8_text(text.as_bytes()) {
                    names.insert(t.to_string());
                }
            }
        }
    });
    names
}

/// Count identifier uses of `name` outside the skip spans.
#[must_use]
pub fn count_identifier_uses(lang: Language, text: &str, name: &str, skip: &[Span]) -> usize {
    scan_identifiers(lang, text, name, skip).len()
}

fn make_site(path: &str, kind: RefSiteKind, span: Span, text: &str) -> ReferenceSite {
    let (line, col) = line_col(text, span.start);
    ReferenceSite {
        file: path.to_string(),
        kind,
        span,
        line,
        col,
    }
}

fn line_col(text: &str, offset: usize) -> (u32, u32) {
    let prefix = &text[..offset.min(text.len())];
    let line = prefix.bytes().filter(|b| *b == b'\n').count() as u32 + 1;
    let col = prefix
        .rfind('\n')
        .map_or(offset, |nl| offset - nl - 1) as u32;
    (line, col)
}

fn is_identifier_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "type_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
    )
}

fn walk(node: Node, f: &mut impl FnMut(Node)) {
    f(node);
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i as u32) {
            walk(child, f);
        }
    }
}

/// Plain identifier occurrences of `name`, skipping the given spans.
/// Member-access properties never match here; they are
/// `property_identifier` nodes, visited by the dedicated scans.
fn scan_identifiers(lang: Language, text: &str, name: &str, skip: &[Span]) -> Vec<Span> {
    let Ok(tree) = parse_tree(lang, text) else {
        return Vec::new();
    };
    let bytes = text.as_bytes();
    let mut hits = Vec::new();
    walk(tree.root_node(), &mut |node| {
        if !is_identifier_kind(node.kind()) {
            return;
        }
        if node.utf8_text(bytes).ok() != Some(name) {
            return;
        }
        let span = Span::new(node.start_byte(), node.end_byte());
        if skip.iter().any(|s| s.contains(span)) {
            return;
        }
        hits.push(span);
    });
    hits
}

/// `NS.name` member accesses. Returns (property span, full expression
/// span) pairs; rename rewrites the property, move rewrites the whole
/// expression.
fn scan_namespace_members(lang: Language, text: &str, ns: &str, name: &str) -> Vec<(Span, Span)> {
    let Ok(tree) = parse_tree(lang, text) else {
        return Vec::new();
    };
    let bytes = text.as_bytes();
    let mut hits = Vec::new();
    walk(tree.root_node(), &mut |node| {
        if node.kind() != "member_expression" {
            return;
        }
        let Some(object) = node.child_by_field_name("object") else {
            return;
        };
        let Some(property) = node.child_by_field_name("property") else {
            return;
        };
        if object.kind() != "identifier" || object.utf8_text(bytes).ok() != Some(ns) {
            return;
        }
        if property.utf8_text(bytes).ok() != Some(name) {
            return;
        }
        hits.push((
            Span::new(property.start_byte(), property.end_byte()),
            Span::new(node.start_byte(), node.end_byte()),
        ));
    });
    hits
}

/// `<expr>.name` property accesses of any object, skipping the given
/// spans (class-member references).
fn scan_property_accesses(lang: Language, text: &str, name: &str, skip: &[Span]) -> Vec<Span> {
    let Ok(tree) = parse_tree(lang, text) else {
        return Vec::new();
    };
    let bytes = text.as_bytes();
    let mut hits = Vec::new();
    walk(tree.root_node(), &mut |node| {
        if node.kind() != "member_expression" {
            return;
        }
        let Some(property) = node.child_by_field_name("property") else {
            return;
        };
        if property.utf8_text(bytes).ok() != Some(name) {
            return;
        }
        let span = Span::new(property.start_byte(), property.end_byte());
        if skip.iter().any(|s| s.contains(span)) {
            return;
        }
        hits.push(span);
    });
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Selector, SymbolKind};
    use crate::resolve::resolve;

    fn project() -> ProjectTree {
        ProjectTree::from_files([
            (
                "src/math.ts".to_string(),
                "export function calculateTotal(xs: number[]): number {\n    return xs.length;\n}\n\nexport function other(): number {\n    return calculateTotal([]);\n}\n".to_string(),
            ),
            (
                "src/f1.ts".to_string(),
                "import { calculateTotal } from './math';\nimport * as MathUtils from './math';\n\nexport const a = calculateTotal([1]);\nexport const b = MathUtils.calculateTotal([2]);\n".to_string(),
            ),
            (
                "src/f2.ts".to_string(),
                "import { calculateTotal as total } from './math';\n\nexport const c = total([3]);\n".to_string(),
            ),
            (
                "src/barrel.ts".to_string(),
                "export { calculateTotal } from './math';\n".to_string(),
            ),
            (
                "src/f3.ts".to_string(),
                "import { calculateTotal } from './barrel';\n\nexport const d = calculateTotal([4]);\n".to_string(),
            ),
        ])
    }

    fn sym(tree: &ProjectTree) -> crate::model::ResolvedSymbol {
        resolve(
            tree,
            &Selector::new("calculateTotal", SymbolKind::Function, "src/math.ts"),
        )
        .unwrap()
    }

    #[test]
    fn providers_follow_reexports() {
        let tree = project();
        let index = ReferenceIndex::build(&tree);
        let providers = index.providers(&tree, "src/math.ts", "calculateTotal");
        assert!(providers.contains("src/math.ts"));
        assert!(providers.contains("src/barrel.ts"));
        assert!(!providers.contains("src/f1.ts"));
    }

    #[test]
    fn finds_every_reference_kind() {
        let tree = project();
        let index = ReferenceIndex::build(&tree);
        let sites = index.find_references(&tree, &sym(&tree));

        let kind_in = |file: &str, pred: fn(&RefSiteKind) -> bool| {
            sites.iter().any(|s| s.file == file && pred(&s.kind))
        };

        // declaring file: internal call
        assert!(kind_in("src/math.ts", |k| matches!(k, RefSiteKind::Ident)));
        // f1: plain import + use + namespace access
        assert!(kind_in("src/f1.ts", |k| matches!(
            k,
            RefSiteKind::ImportName { aliased: false }
        )));
        assert!(kind_in("src/f1.ts", |k| matches!(k, RefSiteKind::Ident)));
        assert!(kind_in("src/f1.ts", |k| matches!(
            k,
            RefSiteKind::NamespaceMember { .. }
        )));
        // f2: aliased import, but no ident hits on the alias
        assert!(kind_in("src/f2.ts", |k| matches!(
            k,
            RefSiteKind::ImportName { aliased: true }
        )));
        assert!(!kind_in("src/f2.ts", |k| matches!(k, RefSiteKind::Ident)));
        // barrel: re-export
        assert!(kind_in("src/barrel.ts", |k| matches!(
            k,
            RefSiteKind::ReExportName
        )));
        // f3: import through the barrel
        assert!(kind_in("src/f3.ts", |k| matches!(
            k,
            RefSiteKind::ImportName { aliased: false }
        )));
    }

    #[test]
    fn declaration_name_is_not_a_site() {
        let tree = project();
        let index = ReferenceIndex::build(&tree);
        let sym = sym(&tree);
        let sites = index.find_references(&tree, &sym);
        assert!(!sites
            .iter()
            .any(|s| s.file == sym.file && s.span == sym.name_span));
    }

    #[test]
    fn sites_are_unique() {
        let tree = project();
        let index = ReferenceIndex::build(&tree);
        let sites = index.find_references(&tree, &sym(&tree));
        let mut keys: Vec<(String, usize)> = sites
            .iter()
            .map(|s| (s.file.clone(), s.span.start))
            .collect();
        keys.sort();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn external_references_ignore_self_recursion() {
        let tree = ProjectTree::from_files([(
            "src/rec.ts".to_string(),
            "export function fact(n: number): number {\n    return n <= 1 ? 1 : n * fact(n - 1);\n}\n".to_string(),
        )]);
        let index = ReferenceIndex::build(&tree);
        let sym = resolve(
            &tree,
            &Selector::new("fact", SymbolKind::Function, "src/rec.ts"),
        )
        .unwrap();
        assert!(index.external_references(&tree, &sym).is_empty());
        assert!(!index.find_references(&tree, &sym).is_empty());
    }

    #[test]
    fn member_references_found_in_importers() {
        let tree = ProjectTree::from_files([
            (
                "src/service.ts".to_string(),
                "export class UserService {\n    getUser(id: string) { return id; }\n    callOwn() { return this.getUser('1'); }\n}\n".to_string(),
            ),
            (
                "src/app.ts".to_string(),
                "import { UserService } from './service';\n\nconst s = new UserService();\ns.getUser('2');\n".to_string(),
            ),
            (
                "src/unrelated.ts".to_string(),
                "const x = { getUser: () => 0 };\nx.getUser();\n".to_string(),
            ),
        ]);
        let index = ReferenceIndex::build(&tree);
        let sym = resolve(
            &tree,
            &Selector::new("getUser", SymbolKind::Method, "src/service.ts"),
        )
        .unwrap();
        let sites = index.find_references(&tree, &sym);
        assert!(sites
            .iter()
            .any(|s| s.file == "src/service.ts" && s.kind == RefSiteKind::MemberAccess));
        assert!(sites
            .iter()
            .any(|s| s.file == "src/app.ts" && s.kind == RefSiteKind::MemberAccess));
        // unrelated file does not import the class; untouched
        assert!(!sites.iter().any(|s| s.file == "src/unrelated.ts"));
    }

    #[test]
    fn identifiers_in_span_scopes_to_range() {
        let text = "function a() { return helper(); }\nfunction b() { return other(); }\n";
        let names = identifiers_in_span(Language::TypeScript, text, Span::new(0, 33));
        assert!(names.contains("helper"));
        assert!(!names.contains("other"));
    }
}
