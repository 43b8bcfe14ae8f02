//! Tree-sitter parsing and per-file syntax models.
//!
//! A [`ModuleView`] is the parsed shape of one file: its declarations,
//! import/re-export declarations, and local export lists. Views are
//! values computed from the current text; they are recomputed per
//! operation and never cached across mutations.

pub mod declarations;
pub mod imports;

use std::collections::BTreeSet;

use tree_sitter::{Parser, Tree};

use crate::error::{ResymError, Result};
use crate::model::{Declaration, ParentKind};

pub use imports::{ExportList, ImportDecl, NamedSpec};

/// Grammar family of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
}

impl Language {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
        }
    }

    #[must_use]
    pub fn grammar(&self) -> tree_sitter::Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        }
    }
}

/// Map a file path to its grammar, by extension.
#[must_use]
pub fn language_for_path(path: &str) -> Option<Language> {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase();
    match ext.as_str() {
        "ts" => Some(Language::TypeScript),
        "tsx" => Some(Language::Tsx),
        "js" | "jsx" => Some(Language::JavaScript),
        _ => None,
    }
}

pub(crate) fn make_parser(lang: Language) -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&lang.grammar())
        .map_err(|e| ResymError::Parse {
            path: String::new(),
            detail: format!("failed to set {} language: {e}", lang.as_str()),
        })?;
    Ok(parser)
}

/// Parse source text into a syntax tree.
pub fn parse_tree(lang: Language, source: &str) -> Result<Tree> {
    let mut parser = make_parser(lang)?;
    parser.parse(source, None).ok_or_else(|| ResymError::Parse {
        path: String::new(),
        detail: "tree-sitter parse returned None".into(),
    })
}

/// Whether the source parses without errors.
#[must_use]
pub fn validate_syntax(lang: Language, source: &str) -> bool {
    match make_parser(lang) {
        Ok(mut parser) => match parser.parse(source, None) {
            Some(tree) => !tree.root_node().has_error(),
            None => false,
        },
        Err(_) => false,
    }
}

/// Parsed shape of one source file.
#[derive(Debug, Clone)]
pub struct ModuleView {
    pub path: String,
    pub lang: Language,
    pub decls: Vec<Declaration>,
    pub imports: Vec<ImportDecl>,
    pub export_lists: Vec<ExportList>,
}

impl ModuleView {
    /// Parse `text` as the file at `path`.
    pub fn parse(path: &str, text: &str) -> Result<Self> {
        let lang = language_for_path(path).ok_or_else(|| ResymError::UnsupportedLanguage {
            path: path.to_string(),
        })?;
        let tree = parse_tree(lang, text)?;
        let decls = declarations::extract_declarations(lang, &tree, text)?;
        let (imports, export_lists) = imports::extract_imports(&tree, text);
        Ok(Self {
            path: path.to_string(),
            lang,
            decls,
            imports,
            export_lists,
        })
    }

    pub fn top_level_decls(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.iter().filter(|d| d.top_level)
    }

    /// First top-level declaration with the given name.
    #[must_use]
    pub fn find_top_level(&self, name: &str) -> Option<&Declaration> {
        self.top_level_decls().find(|d| d.name == name)
    }

    /// Members declared in the body of the named class.
    #[must_use]
    pub fn members_of(&self, class: &str) -> Vec<&Declaration> {
        self.decls
            .iter()
            .filter(|d| {
                d.kind.is_member()
                    && d.parent
                        .as_ref()
                        .is_some_and(|p| p.kind == ParentKind::Class && p.name == class)
            })
            .collect()
    }

    /// Every name this module exports: declaration-level exports,
    /// local export lists, and named re-exports.
    #[must_use]
    pub fn exported_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .top_level_decls()
            .filter(|d| d.exported && !d.is_default_export)
            .map(|d| d.name.clone())
            .collect();
        for list in &self.export_lists {
            for spec in &list.names {
                names.insert(spec.local.clone());
            }
        }
        for imp in self.imports.iter().filter(|i| i.reexport) {
            for spec in &imp.named {
                names.insert(spec.local.clone());
            }
        }
        names
    }

    /// Names declared at the top level of this module.
    #[must_use]
    pub fn top_level_names(&self) -> BTreeSet<String> {
        self.top_level_decls().map(|d| d.name.clone()).collect()
    }

    /// Non-re-export import declarations.
    pub fn plain_imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.imports.iter().filter(|i| !i.reexport)
    }

    /// Byte offset right after the last import declaration, for
    /// inserting new imports (0 when the file has none).
    #[must_use]
    pub fn import_insert_offset(&self, text: &str) -> usize {
        let end = self
            .imports
            .iter()
            .filter(|i| !i.reexport)
            .map(|i| i.span.end)
            .max();
        match end {
            Some(end) => {
                // step past the statement's line break
                match text[end..].find('\n') {
                    Some(nl) => end + nl + 1,
                    None => text.len(),
                }
            }
            None => 0,
        }
    }

    /// Whether this symbol kind exists at top level under this name.
    #[must_use]
    pub fn declares_top_level(&self, name: &str) -> bool {
        self.find_top_level(name).is_some()
    }
}
