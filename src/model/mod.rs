pub mod operation;
pub mod symbol;

pub use operation::{
    BatchOptions, BatchRequest, BatchResult, CollisionScope, Operation, OperationResult,
    RemoveOptions,
};
pub use symbol::{
    Declaration, Parent, ParentKind, RefSiteKind, ReferenceSite, ResolvedSymbol, ScopeKind,
    Selector, SelectorScope, Span, SymbolKind,
};
