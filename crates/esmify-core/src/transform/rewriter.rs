//! The single depth-first pass applying the require, module.exports and
//! duplicate-declarator rules.
//!
//! Imports and hoisted default exports are collected rather than inserted,
//! so nothing a rule produces is visited again during the same pass.

use std::collections::HashSet;

use swc_common::Span;
use swc_ecma_ast::{
    ArrowExpr, Class, Decl, ExportDecl, Expr, ForHead, ForStmt, Function, ImportDecl, ModuleDecl,
    ModuleItem, Stmt, VarDeclOrExpr, VarDeclarator,
};
use swc_ecma_visit::{VisitMut, VisitMutWith};

use super::TransformReport;
use super::ast::is_removed_stmt;
use crate::semantic::{SemanticModel, UniqueNames};

pub(super) struct Rewriter<'a> {
    pub(super) model: &'a SemanticModel,
    pub(super) names: &'a mut UniqueNames,
    pub(super) report: &'a mut TransformReport,
    /// 0 between Program items, 1 inside a Program-level statement, more when
    /// nested in statements, functions or classes.
    pub(super) depth: usize,
    /// Set while the declarators of a Program-level `var`/`let`/`const` are visited.
    pub(super) program_var: bool,
    /// Set while the declaration in a `for..in`/`for..of` head is visited.
    pub(super) for_head: bool,
    pub(super) imports: Vec<ImportDecl>,
    pub(super) hoisted: Vec<ModuleItem>,
    pub(super) removed_declarators: HashSet<Span>,
}

impl<'a> Rewriter<'a> {
    pub(super) fn new(
        model: &'a SemanticModel,
        names: &'a mut UniqueNames,
        report: &'a mut TransformReport,
    ) -> Self {
        Self {
            model,
            names,
            report,
            depth: 0,
            program_var: false,
            for_head: false,
            imports: Vec::new(),
            hoisted: Vec::new(),
            removed_declarators: HashSet::new(),
        }
    }

    /// Runs `f` one nesting level deeper.
    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }
}

impl VisitMut for Rewriter<'_> {
    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        for item in items.iter_mut() {
            if !self.rewrite_module_exports_statement(item) {
                item.visit_mut_with(self);
            }
        }

        items.retain(|item| match item {
            ModuleItem::Stmt(stmt) => !is_removed_stmt(stmt),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                decl: Decl::Var(var),
                ..
            })) => !var.decls.is_empty(),
            _ => true,
        });
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        stmts.visit_mut_children_with(self);
        stmts.retain(|stmt| !is_removed_stmt(stmt));
    }

    fn visit_mut_stmt(&mut self, stmt: &mut Stmt) {
        if self.rewrite_standalone_require(stmt) {
            return;
        }

        self.program_var = self.depth == 0 && matches!(stmt, Stmt::Decl(Decl::Var(_)));
        self.nested(|this| stmt.visit_mut_children_with(this));
        self.program_var = false;

        let emptied = matches!(stmt, Stmt::Decl(Decl::Var(var)) if var.decls.is_empty());
        if emptied {
            *stmt = super::ast::removed_stmt();
        }
    }

    fn visit_mut_module_decl(&mut self, decl: &mut ModuleDecl) {
        self.nested(|this| decl.visit_mut_children_with(this));
    }

    fn visit_mut_function(&mut self, function: &mut Function) {
        self.nested(|this| function.visit_mut_children_with(this));
    }

    fn visit_mut_arrow_expr(&mut self, arrow: &mut ArrowExpr) {
        self.nested(|this| arrow.visit_mut_children_with(this));
    }

    fn visit_mut_class(&mut self, class: &mut Class) {
        self.nested(|this| class.visit_mut_children_with(this));
    }

    fn visit_mut_for_stmt(&mut self, for_stmt: &mut ForStmt) {
        for_stmt.visit_mut_children_with(self);

        let emptied = matches!(
            &for_stmt.init,
            Some(VarDeclOrExpr::VarDecl(var)) if var.decls.is_empty()
        );
        if emptied {
            for_stmt.init = None;
        }
    }

    fn visit_mut_for_head(&mut self, head: &mut ForHead) {
        self.for_head = matches!(head, ForHead::VarDecl(_));
        head.visit_mut_children_with(self);
        self.for_head = false;
    }

    fn visit_mut_var_declarators(&mut self, decls: &mut Vec<VarDeclarator>) {
        self.rewrite_declarators(decls);
    }

    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        expr.visit_mut_children_with(self);
        self.rewrite_inline_require(expr);
        self.rewrite_chained_module_exports(expr);
    }
}
