//! Operation orchestrators, one per operation kind, plus the shared
//! batch context. Orchestrators are pure planners: they validate and
//! produce an [`EditSet`](crate::edit::EditSet); the engine applies,
//! guards, and commits.

pub mod context;
pub mod relocate;
pub mod remove;
pub mod rename;

pub use context::BatchContext;

use crate::edit::import_rewriter::delete_statement;
use crate::edit::text_edit::TextEdit;
use crate::model::Span;
use crate::parse::{ExportList, NamedSpec};

/// Delete a declaration plus the blank line that separated it from the
/// next one, leaving surrounding formatting undisturbed.
pub(crate) fn extended_delete(span: Span, text: &str) -> TextEdit {
    let mut end = span.end;
    for _ in 0..2 {
        if text[end..].starts_with("\r\n") {
            end += 2;
        } else if text[end..].starts_with('\n') {
            end += 1;
        } else {
            break;
        }
    }
    TextEdit::delete(Span::new(span.start, end))
}

/// Drop `name` from a local `export { ... }` list; deleting the last
/// entry deletes the statement.
pub(crate) fn remove_from_export_list(
    list: &ExportList,
    text: &str,
    name: &str,
) -> Option<TextEdit> {
    if !list.names.iter().any(|s| s.imported == name) {
        return None;
    }
    let kept: Vec<&NamedSpec> = list.names.iter().filter(|s| s.imported != name).collect();
    if kept.is_empty() {
        return Some(delete_statement(list.span, text));
    }
    let rebuilt = kept
        .iter()
        .map(|s| {
            if s.aliased {
                format!("{} as {}", s.imported, s.local)
            } else {
                s.imported.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    Some(TextEdit::replace(
        list.span,
        format!("export {{ {rebuilt} }};"),
    ))
}
