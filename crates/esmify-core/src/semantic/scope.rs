//! Scope tree for variable bindings
//!
//! Scopes live in an arena and point at their parent, so lookups walk the
//! chain outwards without borrowing the tree mutably.

use id_arena::{Arena, Id};
use swc_common::Span;

pub type ScopeId = Id<Scope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    ArrowFunction,
    Block,
    For,
    Catch,
    Class,
}

impl ScopeKind {
    /// Whether `var` declarations made anywhere below stop at this scope.
    pub fn is_var_scope(self) -> bool {
        matches!(
            self,
            ScopeKind::Module | ScopeKind::Function | ScopeKind::ArrowFunction
        )
    }
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub span: Span,
}

pub struct ScopeTree {
    arena: Arena<Scope>,
    root: Option<ScopeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn create_scope(
        &mut self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        span: Span,
    ) -> ScopeId {
        let id = self.arena.alloc_with_id(|id| Scope {
            id,
            kind,
            parent,
            children: Vec::new(),
            span,
        });

        if let Some(parent_id) = parent {
            self.arena[parent_id].children.push(id);
        }

        if self.root.is_none() {
            self.root = Some(id);
        }

        id
    }

    pub fn root(&self) -> Option<ScopeId> {
        self.root
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.arena[id]
    }

    pub fn ancestors(&self, id: ScopeId) -> AncestorIter<'_> {
        AncestorIter {
            tree: self,
            current: Some(id),
        }
    }

    /// The closest scope, starting at `id`, that owns `var` declarations.
    pub fn var_scope(&self, id: ScopeId) -> ScopeId {
        self.ancestors(id)
            .find(|scope| scope.kind.is_var_scope())
            .map(|scope| scope.id)
            .unwrap_or(id)
    }
}

pub struct AncestorIter<'a> {
    tree: &'a ScopeTree,
    current: Option<ScopeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = &'a Scope;

    fn next(&mut self) -> Option<Self::Item> {
        let current_id = self.current?;
        let scope = &self.tree.arena[current_id];
        self.current = scope.parent;
        Some(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_common::{BytePos, DUMMY_SP};

    fn span_at(lo: u32, hi: u32) -> Span {
        Span::new(BytePos(lo), BytePos(hi))
    }

    #[test]
    fn first_scope_becomes_root() {
        let mut tree = ScopeTree::new();
        let module = tree.create_scope(ScopeKind::Module, None, DUMMY_SP);

        assert_eq!(tree.root(), Some(module));

        let scope = tree.get(module);
        assert_eq!(scope.kind, ScopeKind::Module);
        assert!(scope.parent.is_none());
        assert!(scope.children.is_empty());
    }

    #[test]
    fn children_are_linked_to_parent() {
        let mut tree = ScopeTree::new();
        let module = tree.create_scope(ScopeKind::Module, None, span_at(0, 100));
        let func = tree.create_scope(ScopeKind::Function, Some(module), span_at(10, 50));
        let block = tree.create_scope(ScopeKind::Block, Some(module), span_at(60, 90));

        assert_eq!(tree.get(func).parent, Some(module));
        assert_eq!(tree.get(block).parent, Some(module));
        assert_eq!(tree.get(module).children, vec![func, block]);
    }

    #[test]
    fn ancestors_iterator_traverses_parent_chain() {
        let mut tree = ScopeTree::new();
        let module = tree.create_scope(ScopeKind::Module, None, DUMMY_SP);
        let func = tree.create_scope(ScopeKind::Function, Some(module), DUMMY_SP);
        let block = tree.create_scope(ScopeKind::Block, Some(func), DUMMY_SP);

        let ancestors: Vec<ScopeKind> = tree.ancestors(block).map(|s| s.kind).collect();

        assert_eq!(
            ancestors,
            vec![ScopeKind::Block, ScopeKind::Function, ScopeKind::Module]
        );
    }

    #[test]
    fn var_scope_skips_blocks_and_loops() {
        let mut tree = ScopeTree::new();
        let module = tree.create_scope(ScopeKind::Module, None, DUMMY_SP);
        let arrow = tree.create_scope(ScopeKind::ArrowFunction, Some(module), DUMMY_SP);
        let for_loop = tree.create_scope(ScopeKind::For, Some(arrow), DUMMY_SP);
        let block = tree.create_scope(ScopeKind::Block, Some(for_loop), DUMMY_SP);
        let top_block = tree.create_scope(ScopeKind::Block, Some(module), DUMMY_SP);

        assert_eq!(tree.var_scope(block), arrow);
        assert_eq!(tree.var_scope(arrow), arrow);
        assert_eq!(tree.var_scope(top_block), module);
    }
}
