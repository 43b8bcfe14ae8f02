use serde::{Deserialize, Serialize};

/// The kind of a named declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Interface,
    #[serde(rename = "type")]
    TypeAlias,
    Variable,
    Method,
    Property,
    Getter,
    Setter,
    Enum,
    Namespace,
}

impl SymbolKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::TypeAlias => "type",
            Self::Variable => "variable",
            Self::Method => "method",
            Self::Property => "property",
            Self::Getter => "getter",
            Self::Setter => "setter",
            Self::Enum => "enum",
            Self::Namespace => "namespace",
        }
    }

    /// Capitalized label used in user-facing conflict messages
    /// ("Method 'x' already exists in class 'Y'").
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::Class => "Class",
            Self::Interface => "Interface",
            Self::TypeAlias => "Type",
            Self::Variable => "Variable",
            Self::Method => "Method",
            Self::Property => "Property",
            Self::Getter => "Getter",
            Self::Setter => "Setter",
            Self::Enum => "Enum",
            Self::Namespace => "Namespace",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(Self::Function),
            "class" => Some(Self::Class),
            "interface" => Some(Self::Interface),
            "type" => Some(Self::TypeAlias),
            "variable" => Some(Self::Variable),
            "method" => Some(Self::Method),
            "property" => Some(Self::Property),
            "getter" => Some(Self::Getter),
            "setter" => Some(Self::Setter),
            "enum" => Some(Self::Enum),
            "namespace" => Some(Self::Namespace),
            _ => None,
        }
    }

    /// Whether this kind lives inside a class body.
    #[must_use]
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            Self::Method | Self::Property | Self::Getter | Self::Setter
        )
    }
}

/// A half-open byte range into a file's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[must_use]
    pub fn contains(&self, other: Span) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

/// Scope kinds a selector may restrict the search to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Class,
    Function,
}

/// Optional enclosing scope of a selector: "the member `name` of class X".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorScope {
    #[serde(rename = "type")]
    pub kind: ScopeKind,
    pub name: String,
}

/// Declarative locator for exactly one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<SelectorScope>,
}

impl Selector {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: SymbolKind, file_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            file_path: file_path.into(),
            scope: None,
        }
    }

    #[must_use]
    pub fn in_class(mut self, class: impl Into<String>) -> Self {
        self.scope = Some(SelectorScope {
            kind: ScopeKind::Class,
            name: class.into(),
        });
        self
    }
}

/// Kind of the container a declaration is nested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
    Class,
    Function,
    Namespace,
}

/// Nearest enclosing named container of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
    pub kind: ParentKind,
    pub name: String,
}

/// A declaration extracted from one file's syntax tree.
///
/// Spans are byte offsets into the file text as it was when the tree
/// was parsed; any mutation invalidates them.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub name: String,
    pub kind: SymbolKind,
    pub parent: Option<Parent>,
    /// Full declaration including a leading `export` keyword.
    pub span: Span,
    /// The name identifier only.
    pub name_span: Span,
    pub exported: bool,
    pub is_default_export: bool,
    pub top_level: bool,
    pub start_line: u32,
    pub end_line: u32,
}

impl Declaration {
    /// Whether a selector's scope constraint matches this declaration.
    #[must_use]
    pub fn matches_scope(&self, scope: &SelectorScope) -> bool {
        match &self.parent {
            Some(p) => {
                p.name == scope.name
                    && matches!(
                        (scope.kind, p.kind),
                        (ScopeKind::Class, ParentKind::Class)
                            | (ScopeKind::Function, ParentKind::Function)
                    )
            }
            None => false,
        }
    }
}

/// A reference to exactly one concrete declaration.
///
/// Valid only until the next mutation; recomputed per operation.
#[derive(Debug, Clone)]
pub struct ResolvedSymbol {
    pub file: String,
    pub name: String,
    pub kind: SymbolKind,
    pub parent: Option<Parent>,
    pub exported: bool,
    pub span: Span,
    pub name_span: Span,
    pub start_line: u32,
}

impl ResolvedSymbol {
    #[must_use]
    pub fn from_declaration(file: impl Into<String>, decl: &Declaration) -> Self {
        Self {
            file: file.into(),
            name: decl.name.clone(),
            kind: decl.kind,
            parent: decl.parent.clone(),
            exported: decl.exported,
            span: decl.span,
            name_span: decl.name_span,
            start_line: decl.start_line,
        }
    }

    /// Name of the enclosing class, for member symbols.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        match &self.parent {
            Some(p) if p.kind == ParentKind::Class => Some(p.name.as_str()),
            _ => None,
        }
    }
}

/// How a syntactic occurrence denotes the symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSiteKind {
    /// Plain identifier use (call, type position, shorthand property).
    Ident,
    /// Named import specifier; `aliased` when written `name as alias`.
    ImportName { aliased: bool },
    /// Named re-export specifier (`export { name } from '...'`).
    ReExportName,
    /// Member access through a namespace import (`NS.name`).
    NamespaceMember { namespace: String, expr_span: Span },
    /// Class-member access (`obj.name`, `this.name`).
    MemberAccess,
}

impl RefSiteKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ident => "ident",
            Self::ImportName { .. } => "import",
            Self::ReExportName => "reexport",
            Self::NamespaceMember { .. } => "namespace",
            Self::MemberAccess => "member",
        }
    }
}

/// One syntactic occurrence of a symbol, as found by the reference
/// index. `span` is the identifier to rewrite.
#[derive(Debug, Clone)]
pub struct ReferenceSite {
    pub file: String,
    pub kind: RefSiteKind,
    pub span: Span,
    pub line: u32,
    pub col: u32,
}
