//! Semantic analysis module
//!
//! Provides scope analysis, symbol tables with reassignment tracking, and
//! fresh name generation.

pub mod names;
pub mod scope;
pub mod symbols;
pub mod visitor;

pub use names::UniqueNames;
pub use scope::{AncestorIter, Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbols::{
    DeclarationKind, Symbol, SymbolId, SymbolTable, UnresolvedReference, Violation,
    ViolationKind,
};
pub use visitor::{ScopeBuilder, SemanticModel};
