use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResymError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Symbol '{name}' not found")]
    NotFound { name: String },

    #[error("Symbol '{name}' is ambiguous: {count} declarations match; add a scope or file to disambiguate")]
    AmbiguousSymbol { name: String, count: usize },

    #[error("{detail}")]
    NamingConflict { detail: String },

    #[error("unsupported operation: {detail}")]
    UnsupportedOperation { detail: String },

    #[error("Symbol '{name}' is referenced in {count} location(s): {locations}")]
    ReferencedSymbol {
        name: String,
        count: usize,
        locations: String,
    },

    #[error("cannot prepare target file '{path}': {reason}")]
    TargetPrepareFailure { path: String, reason: String },

    #[error("parse error: {detail}")]
    ParseError { detail: String },

    #[error("parse error in {path}: {detail}")]
    Parse { path: String, detail: String },

    #[error("syntax guard rejected: {detail}")]
    SyntaxGuard { detail: String },

    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("unsupported language: {path}")]
    UnsupportedLanguage { path: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ResymError>;
