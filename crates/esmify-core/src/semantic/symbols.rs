//! Symbol table for tracking declarations, references and reassignments

use std::collections::HashMap;

use id_arena::{Arena, Id};
use swc_common::Span;

use super::scope::{ScopeId, ScopeTree};

pub type SymbolId = Id<Symbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
    Function,
    Class,
    Parameter,
    CatchParameter,
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A later `var` declarator for a name already declared in the same scope.
    Declarator,
    /// Assignment, update or redeclaration through anything but a declarator.
    Assignment,
}

/// A site that rebinds a symbol after its first declaration.
///
/// For declarators `span` is the span of the whole `VarDeclarator`, for
/// assignments the span of the writing expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub span: Span,
}

#[derive(Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub declaration_kind: DeclarationKind,
    pub scope: ScopeId,
    pub span: Span,
    pub references: Vec<Span>,
    pub violations: Vec<Violation>,
}

impl Symbol {
    /// Never reassigned nor redeclared after its declaration.
    pub fn is_constant(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_assignments(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.kind == ViolationKind::Assignment)
    }

    pub fn declarator_violations(&self) -> impl Iterator<Item = Span> + '_ {
        self.violations
            .iter()
            .filter(|v| v.kind == ViolationKind::Declarator)
            .map(|v| v.span)
    }
}

#[derive(Debug, Clone)]
pub struct UnresolvedReference {
    pub name: String,
    pub span: Span,
    pub scope: ScopeId,
}

pub struct SymbolTable {
    arena: Arena<Symbol>,
    by_scope: HashMap<ScopeId, HashMap<String, SymbolId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_scope: HashMap::new(),
        }
    }

    pub fn declare(
        &mut self,
        name: &str,
        declaration_kind: DeclarationKind,
        scope: ScopeId,
        span: Span,
    ) -> SymbolId {
        let id = self.arena.alloc_with_id(|id| Symbol {
            id,
            name: name.to_string(),
            declaration_kind,
            scope,
            span,
            references: Vec::new(),
            violations: Vec::new(),
        });

        self.by_scope
            .entry(scope)
            .or_default()
            .insert(name.to_string(), id);

        id
    }

    /// Looks `name` up in `scope` only, without walking to the parents.
    pub fn lookup_own(&self, name: &str, scope: ScopeId) -> Option<SymbolId> {
        self.by_scope
            .get(&scope)
            .and_then(|symbols| symbols.get(name))
            .copied()
    }

    pub fn lookup(&self, name: &str, scope: ScopeId, scope_tree: &ScopeTree) -> Option<SymbolId> {
        scope_tree
            .ancestors(scope)
            .find_map(|s| self.lookup_own(name, s.id))
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.arena[id]
    }

    pub fn add_reference(&mut self, symbol_id: SymbolId, reference_span: Span) {
        self.arena[symbol_id].references.push(reference_span);
    }

    pub fn add_violation(&mut self, symbol_id: SymbolId, violation: Violation) {
        self.arena[symbol_id].violations.push(violation);
    }

    pub fn symbols_in_scope(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.by_scope
            .get(&scope)
            .into_iter()
            .flat_map(|symbols| symbols.values().map(|&id| &self.arena[id]))
    }
}
