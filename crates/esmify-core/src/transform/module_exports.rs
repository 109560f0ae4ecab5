//! `module.exports = value` at module top level becomes a default export.

use swc_common::{DUMMY_SP, Spanned};
use swc_ecma_ast::{AssignExpr, Expr, Invalid, ModuleItem, Stmt};
use swc_ecma_visit::VisitMutWith;
use tracing::debug;

use super::ast::{export_default, is_module_exports_assign};
use super::rewriter::Rewriter;

impl Rewriter<'_> {
    /// `module.exports = rhs;` as a Program statement is replaced by
    /// `export default rhs;` once `rhs` has been rewritten.
    pub(super) fn rewrite_module_exports_statement(&mut self, item: &mut ModuleItem) -> bool {
        let span = item.span();
        let Some(rhs) = module_exports_rhs(item) else {
            return false;
        };

        self.depth = 1;
        rhs.visit_mut_with(self);
        self.depth = 0;

        let rhs = std::mem::replace(rhs, invalid());
        *item = export_default(rhs, span);
        self.report.default_exports += 1;
        debug!("module.exports statement rewritten to export default");
        true
    }

    /// An assignment nested in a Program statement, as in
    /// `a = module.exports = rhs`, hoists `export default rhs;` and leaves
    /// `rhs` in its place.
    pub(super) fn rewrite_chained_module_exports(&mut self, expr: &mut Expr) {
        if self.depth != 1 {
            return;
        }
        let Expr::Assign(assign) = expr else {
            return;
        };
        if !is_module_exports_assign(assign) {
            return;
        }

        let rhs = std::mem::replace(&mut assign.right, invalid());
        self.hoisted
            .push(export_default(Box::new((*rhs).clone()), DUMMY_SP));
        self.report.default_exports += 1;
        debug!("chained module.exports assignment hoisted to export default");
        *expr = *rhs;
    }
}

fn invalid() -> Box<Expr> {
    Box::new(Expr::Invalid(Invalid { span: DUMMY_SP }))
}

fn module_exports_rhs(item: &mut ModuleItem) -> Option<&mut Box<Expr>> {
    let ModuleItem::Stmt(Stmt::Expr(stmt)) = item else {
        return None;
    };
    let assign = assignment_in_parens(&mut stmt.expr)?;
    is_module_exports_assign(assign).then_some(&mut assign.right)
}

fn assignment_in_parens(expr: &mut Expr) -> Option<&mut AssignExpr> {
    match expr {
        Expr::Paren(paren) => assignment_in_parens(&mut paren.expr),
        Expr::Assign(assign) => Some(assign),
        _ => None,
    }
}
