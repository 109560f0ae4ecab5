//! Collapses `var x = require(...)` redeclarations into the first one.

use swc_ecma_ast::{Pat, VarDeclarator};

use super::ast::is_require_call;
use super::rewriter::Rewriter;

impl Rewriter<'_> {
    /// Marks the later declarators of a redeclared require binding for
    /// removal. Redeclarations always come after the first declarator in
    /// source order, so they are dropped when the pass reaches them.
    pub(super) fn mark_duplicate_requires(&mut self, declarator: &VarDeclarator) {
        let Pat::Ident(binding) = &declarator.name else {
            return;
        };
        if !declarator.init.as_deref().is_some_and(is_require_call) {
            return;
        }
        let Some(symbol) = self.model.binding_at(binding.id.span) else {
            return;
        };
        if symbol.is_constant() {
            return;
        }

        self.removed_declarators
            .extend(symbol.declarator_violations());
    }
}
