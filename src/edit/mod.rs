pub mod import_rewriter;
pub mod syntax_guard;
pub mod text_edit;

pub use syntax_guard::SyntaxGuard;
pub use text_edit::{EditSet, TextEdit};
