//! Declaration extraction.
//!
//! Tree-sitter queries find candidate declaration nodes; a per-node
//! pass refines member kinds (getter/setter), export visibility, and
//! the enclosing container.

use std::collections::BTreeMap;

use tree_sitter::{Node, Query, QueryCursor, StreamingIterator, Tree};

use crate::error::{ResymError, Result};
use crate::model::{Declaration, Parent, ParentKind, Span, SymbolKind};
use crate::parse::Language;

const TS_DECL_QUERY: &str = r"
    (function_declaration name: (identifier) @name) @fn_def
    (generator_function_declaration name: (identifier) @name) @fn_def

    (class_declaration name: (type_identifier) @name) @class_def
    (abstract_class_declaration name: (type_identifier) @name) @class_def

    (interface_declaration name: (type_identifier) @name) @iface_def
    (type_alias_declaration name: (type_identifier) @name) @type_def
    (enum_declaration name: (identifier) @name) @enum_def

    (module name: (identifier) @name) @ns_def
    (internal_module name: (identifier) @name) @ns_def

    (lexical_declaration
        (variable_declarator
            name: (identifier) @name
            value: (arrow_function))) @arrowfn_def
    (lexical_declaration (variable_declarator name: (identifier) @name)) @var_def
    (variable_declaration (variable_declarator name: (identifier) @name)) @var_def

    (method_definition name: (property_identifier) @name) @method_def
    (public_field_definition name: (property_identifier) @name) @prop_def
";

const JS_DECL_QUERY: &str = r"
    (function_declaration name: (identifier) @name) @fn_def
    (generator_function_declaration name: (identifier) @name) @fn_def

    (class_declaration name: (identifier) @name) @class_def

    (lexical_declaration
        (variable_declarator
            name: (identifier) @name
            value: (arrow_function))) @arrowfn_def
    (lexical_declaration (variable_declarator name: (identifier) @name)) @var_def
    (variable_declaration (variable_declarator name: (identifier) @name)) @var_def

    (method_definition name: (property_identifier) @name) @method_def
    (field_definition property: (property_identifier) @name) @prop_def
";

fn decl_query(lang: Language) -> Result<Query> {
    let src = match lang {
        Language::TypeScript | Language::Tsx => TS_DECL_QUERY,
        Language::JavaScript => JS_DECL_QUERY,
    };
    Query::new(&lang.grammar(), src).map_err(|e| ResymError::Parse {
        path: String::new(),
        detail: format!("declaration query failed to compile: {e}"),
    })
}

fn kind_for_capture(capture: &str) -> Option<SymbolKind> {
    match capture {
        "fn_def" | "arrowfn_def" => Some(SymbolKind::Function),
        "class_def" => Some(SymbolKind::Class),
        "iface_def" => Some(SymbolKind::Interface),
        "type_def" => Some(SymbolKind::TypeAlias),
        "enum_def" => Some(SymbolKind::Enum),
        "ns_def" => Some(SymbolKind::Namespace),
        "var_def" => Some(SymbolKind::Variable),
        "method_def" => Some(SymbolKind::Method),
        "prop_def" => Some(SymbolKind::Property),
        _ => None,
    }
}

/// Extract every named declaration from a parsed file.
pub fn extract_declarations(lang: Language, tree: &Tree, source: &str) -> Result<Vec<Declaration>> {
    let query = decl_query(lang)?;
    let source_bytes = source.as_bytes();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, tree.root_node(), source_bytes);

    // keyed by name-identifier offset so arrow-function declarators,
    // which match two patterns, collapse to one declaration
    let mut by_name_start: BTreeMap<usize, Declaration> = BTreeMap::new();

    while let Some(m) = matches.next() {
        let mut name_node: Option<Node> = None;
        let mut def_node: Option<Node> = None;
        let mut kind: Option<SymbolKind> = None;

        for cap in m.captures {
            let cap_name = &query.capture_names()[cap.index as usize];
            if *cap_name == "name" {
                name_node = Some(cap.node);
            } else if let Some(k) = kind_for_capture(cap_name) {
                kind = Some(k);
                def_node = Some(cap.node);
            }
        }

        let (Some(name_node), Some(def_node), Some(mut kind)) = (name_node, def_node, kind) else {
            continue;
        };
        let name = name_node.utf8_text(source_bytes).unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }

        if kind == SymbolKind::Method {
            kind = refine_method_kind(def_node);
        }

        let (span_node, exported, is_default) = export_wrapper(def_node);
        let top_level = span_node
            .parent()
            .is_some_and(|p| p.kind() == "program");

        let decl = Declaration {
            name,
            kind,
            parent: find_parent(def_node, source_bytes),
            span: Span::new(span_node.start_byte(), span_node.end_byte()),
            name_span: Span::new(name_node.start_byte(), name_node.end_byte()),
            exported,
            is_default_export: is_default,
            top_level,
            start_line: span_node.start_position().row as u32 + 1,
            end_line: span_node.end_position().row as u32 + 1,
        };

        let key = decl.name_span.start;
        match by_name_start.get(&key) {
            // arrow functions match both @arrowfn_def and @var_def;
            // keep the Function classification
            Some(existing)
                if existing.kind == SymbolKind::Function && decl.kind == SymbolKind::Variable => {}
            _ => {
                by_name_start.insert(key, decl);
            }
        }
    }

    Ok(by_name_start.into_values().collect())
}

/// Getters and setters parse as method definitions with a leading
/// `get`/`set` token.
fn refine_method_kind(node: Node) -> SymbolKind {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i as u32) {
            match child.kind() {
                "get" => return SymbolKind::Getter,
                "set" => return SymbolKind::Setter,
                "property_identifier" => break,
                _ => {}
            }
        }
    }
    SymbolKind::Method
}

/// If the declaration sits inside an `export` statement, the effective
/// span is the export statement and the symbol is exported.
fn export_wrapper(node: Node) -> (Node, bool, bool) {
    match node.parent() {
        Some(p) if p.kind() == "export_statement" => {
            let mut is_default = false;
            for i in 0..p.child_count() {
                if let Some(child) = p.child(i as u32) {
                    if child.kind() == "default" {
                        is_default = true;
                        break;
                    }
                }
            }
            (p, true, is_default)
        }
        _ => (node, false, false),
    }
}

fn find_parent(node: Node, source: &[u8]) -> Option<Parent> {
    let mut current = node.parent();
    while let Some(p) = current {
        match p.kind() {
            "class_body" => {
                if let Some(class_decl) = p.parent() {
                    if matches!(
                        class_decl.kind(),
                        "class_declaration" | "abstract_class_declaration" | "class"
                    ) {
                        if let Some(name) = class_decl.child_by_field_name("name") {
                            return Some(Parent {
                                kind: ParentKind::Class,
                                name: node_text(name, source),
                            });
                        }
                    }
                }
            }
            "statement_block" => {
                if let Some(f) = p.parent() {
                    if matches!(
                        f.kind(),
                        "function_declaration" | "generator_function_declaration"
                    ) {
                        if let Some(name) = f.child_by_field_name("name") {
                            return Some(Parent {
                                kind: ParentKind::Function,
                                name: node_text(name, source),
                            });
                        }
                    }
                }
            }
            "internal_module" | "module" => {
                if let Some(name) = p.child_by_field_name("name") {
                    return Some(Parent {
                        kind: ParentKind::Namespace,
                        name: node_text(name, source),
                    });
                }
            }
            _ => {}
        }
        current = p.parent();
    }
    None
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_tree;

    fn decls(src: &str) -> Vec<Declaration> {
        let tree = parse_tree(Language::TypeScript, src).unwrap();
        extract_declarations(Language::TypeScript, &tree, src).unwrap()
    }

    fn find<'a>(ds: &'a [Declaration], name: &str) -> &'a Declaration {
        ds.iter().find(|d| d.name == name).unwrap()
    }

    #[test]
    fn extracts_function() {
        let src = "export function calculateTotal(a: number): number { return a; }\n";
        let ds = decls(src);
        let f = find(&ds, "calculateTotal");
        assert_eq!(f.kind, SymbolKind::Function);
        assert!(f.exported);
        assert!(f.top_level);
        assert_eq!(f.span.start, 0);
        assert_eq!(&src[f.name_span.start..f.name_span.end], "calculateTotal");
    }

    #[test]
    fn export_span_includes_keyword() {
        let src = "export function a() {}\n";
        let ds = decls(src);
        let f = find(&ds, "a");
        assert_eq!(&src[f.span.start..f.span.end], "export function a() {}");
    }

    #[test]
    fn unexported_function_is_not_exported() {
        let ds = decls("function helper() {}\n");
        let f = find(&ds, "helper");
        assert!(!f.exported);
        assert!(f.top_level);
    }

    #[test]
    fn arrow_function_classified_as_function() {
        let ds = decls("export const isValidEmail = (s: string) => s.includes('@');\n");
        let f = find(&ds, "isValidEmail");
        assert_eq!(f.kind, SymbolKind::Function);
        assert!(f.exported);
    }

    #[test]
    fn plain_const_is_variable() {
        let ds = decls("export const LIMIT = 10;\n");
        assert_eq!(find(&ds, "LIMIT").kind, SymbolKind::Variable);
    }

    #[test]
    fn extracts_interface_type_enum() {
        let src = "
export interface User { name: string; }
type Status = 'a' | 'b';
export enum Direction { Up, Down }
";
        let ds = decls(src);
        assert_eq!(find(&ds, "User").kind, SymbolKind::Interface);
        assert_eq!(find(&ds, "Status").kind, SymbolKind::TypeAlias);
        assert_eq!(find(&ds, "Direction").kind, SymbolKind::Enum);
    }

    #[test]
    fn class_members_carry_parent() {
        let src = "
export class UserService {
    count: number = 0;

    constructor(private db: string) {}

    getUser(id: string): string { return id; }

    get size(): number { return this.count; }

    set size(n: number) { this.count = n; }
}
";
        let ds = decls(src);

        let method = find(&ds, "getUser");
        assert_eq!(method.kind, SymbolKind::Method);
        assert!(!method.top_level);
        let parent = method.parent.as_ref().unwrap();
        assert_eq!(parent.kind, ParentKind::Class);
        assert_eq!(parent.name, "UserService");

        assert_eq!(find(&ds, "count").kind, SymbolKind::Property);
        assert_eq!(find(&ds, "constructor").kind, SymbolKind::Method);

        let getters: Vec<_> = ds.iter().filter(|d| d.name == "size").collect();
        assert_eq!(getters.len(), 2);
        assert!(getters.iter().any(|d| d.kind == SymbolKind::Getter));
        assert!(getters.iter().any(|d| d.kind == SymbolKind::Setter));
    }

    #[test]
    fn function_scoped_declaration_has_function_parent() {
        let src = "
function outer() {
    const inner = 1;
    return inner;
}
";
        let ds = decls(src);
        let inner = find(&ds, "inner");
        assert!(!inner.top_level);
        let parent = inner.parent.as_ref().unwrap();
        assert_eq!(parent.kind, ParentKind::Function);
        assert_eq!(parent.name, "outer");
    }

    #[test]
    fn namespace_members_have_namespace_parent() {
        let src = "
namespace Validation {
    export function check(s: string): boolean { return s.length > 0; }
}
";
        let ds = decls(src);
        assert_eq!(find(&ds, "Validation").kind, SymbolKind::Namespace);
        let check = find(&ds, "check");
        assert!(!check.top_level);
        assert_eq!(check.parent.as_ref().unwrap().kind, ParentKind::Namespace);
    }

    #[test]
    fn default_export_flagged() {
        let ds = decls("export default function main() {}\n");
        let f = find(&ds, "main");
        assert!(f.exported);
        assert!(f.is_default_export);
    }

    #[test]
    fn javascript_class_extraction() {
        let src = "
export class Greeter {
    greet() { return 'hi'; }
}
";
        let tree = parse_tree(Language::JavaScript, src).unwrap();
        let ds = extract_declarations(Language::JavaScript, &tree, src).unwrap();
        assert_eq!(find(&ds, "Greeter").kind, SymbolKind::Class);
        assert_eq!(find(&ds, "greet").kind, SymbolKind::Method);
    }

    #[test]
    fn empty_file_yields_nothing() {
        assert!(decls("").is_empty());
    }
}
