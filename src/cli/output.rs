use serde::Serialize;

use crate::model::{ReferenceSite, ResolvedSymbol};

/// Format a result as minified JSON.
pub fn format_json<T: Serialize>(result: &T) -> String {
    serde_json::to_string(result).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Format an error as JSON.
pub fn format_error(err: &dyn std::fmt::Display) -> String {
    format!("{{\"error\":\"{}\"}}", err.to_string().replace('"', "\\\""))
}

/// Result of listing all references of a symbol.
#[derive(Debug, Clone, Serialize)]
pub struct RefsReport {
    /// The symbol name.
    #[serde(rename = "s")]
    pub symbol: String,
    /// The declaring file.
    #[serde(rename = "d")]
    pub declared_in: String,
    /// The list of references.
    #[serde(rename = "r")]
    pub refs: Vec<RefHit>,
    /// Total count of references.
    #[serde(rename = "c")]
    pub count: usize,
}

/// A single reference hit.
#[derive(Debug, Clone, Serialize)]
pub struct RefHit {
    /// The file containing this reference.
    #[serde(rename = "f")]
    pub file: String,
    /// The kind of reference (ident, import, reexport, namespace, member).
    #[serde(rename = "k")]
    pub kind: String,
    /// The line number.
    #[serde(rename = "l")]
    pub line: u32,
    /// The column number.
    pub col: u32,
}

impl RefsReport {
    #[must_use]
    pub fn new(sym: &ResolvedSymbol, sites: &[ReferenceSite]) -> Self {
        let refs: Vec<RefHit> = sites
            .iter()
            .map(|s| RefHit {
                file: s.file.clone(),
                kind: s.kind.as_str().to_string(),
                line: s.line,
                col: s.col,
            })
            .collect();
        let count = refs.len();
        Self {
            symbol: sym.name.clone(),
            declared_in: sym.file.clone(),
            refs,
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RefSiteKind, Span, SymbolKind};

    #[test]
    fn format_json_minified() {
        #[derive(Serialize)]
        struct T {
            name: String,
        }
        let json = format_json(&T { name: "x".into() });
        assert!(!json.contains('\n'));
        assert!(json.contains("\"name\":\"x\""));
    }

    #[test]
    fn format_error_produces_json() {
        let json = format_error(&"bad \"thing\"");
        assert!(json.contains("\"error\""));
        assert!(json.contains("\\\"thing\\\""));
    }

    #[test]
    fn refs_report_short_keys() {
        let sym = ResolvedSymbol {
            file: "src/a.ts".into(),
            name: "f".into(),
            kind: SymbolKind::Function,
            parent: None,
            exported: true,
            span: Span::new(0, 10),
            name_span: Span::new(0, 1),
            start_line: 1,
        };
        let sites = vec![ReferenceSite {
            file: "src/b.ts".into(),
            kind: RefSiteKind::Ident,
            span: Span::new(5, 6),
            line: 2,
            col: 4,
        }];
        let json = format_json(&RefsReport::new(&sym, &sites));
        assert!(json.contains("\"s\":\"f\""));
        assert!(json.contains("\"c\":1"));
        assert!(json.contains("\"k\":\"ident\""));
    }
}
