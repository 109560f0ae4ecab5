//! Named exports for UMD-style bootstraps.
//!
//! Recognizes a self-invoking wrapper that hands a factory function to a
//! bootstrap, which calls the factory back with the CommonJS `exports`
//! object:
//!
//! ```js
//! !function (e, t) { t(exports) }(this, function (e) { e.foo = "bar" });
//! ```
//!
//! Every `e.<name> = ...` statement at the top of the factory body yields
//! `export const <name> = exports.<name>;` appended to the module.

use std::collections::HashSet;

use swc_atoms::Atom;
use swc_common::DUMMY_SP;
use swc_ecma_ast::{
    AssignOp, AssignTarget, BlockStmtOrExpr, CallExpr, Callee, Decl, EsReserved, Expr,
    ExprOrSpread, FnExpr, MemberProp, Module, ModuleItem, Pat, SimpleAssignTarget, Stmt,
};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::debug;

use super::TransformReport;
use super::ast::{
    const_decl, export_alias, export_const, export_default, exported_names, ident, member,
    unwrap_parens,
};
use crate::semantic::{SemanticModel, UniqueNames};

/// Property names the module's factories assign on their exports parameter,
/// in discovery order and without repeats.
pub(super) fn find_factory_exports(module: &Module) -> Vec<Atom> {
    let mut finder = FactoryExportFinder::default();
    module.visit_with(&mut finder);
    finder.found
}

/// Appends one export per factory property not already exported.
pub(super) fn append_factory_exports(
    module: &mut Module,
    props: &[Atom],
    model: &SemanticModel,
    names: &mut UniqueNames,
    report: &mut TransformReport,
) {
    let mut exported = exported_names(module);

    for prop in props {
        if !exported.insert(prop.clone()) {
            continue;
        }

        let value = member("exports", prop);
        if prop == "default" {
            module.body.push(export_default(Box::new(value), DUMMY_SP));
        } else if needs_alias(prop, model) {
            let local = ident(names.fresh(prop));
            debug!(export = %prop, local = %local.sym, "factory export bound through alias");
            module.body.push(ModuleItem::Stmt(Stmt::Decl(Decl::Var(const_decl(
                local.clone(),
                value,
            )))));
            module.body.push(export_alias(local, ident(prop.clone())));
        } else {
            module.body.push(export_const(ident(prop.clone()), value));
        }
        report.umd_exports += 1;
    }
}

/// A name that cannot be declared at the top of the module as is.
fn needs_alias(name: &Atom, model: &SemanticModel) -> bool {
    name == "module"
        || name == "exports"
        || name.is_reserved()
        || name.is_reserved_in_strict_mode(true)
        || name.is_reserved_in_strict_bind()
        || model.has_top_level_binding(name)
        || model.has_free_reference(name)
}

/// Function, or block-bodied arrow, passed as a call argument, reduced to
/// what the trace needs.
#[derive(Debug)]
struct Factory {
    params: Vec<Option<Atom>>,
    /// `(object, property)` for each `object.property = ...` at the top of the body.
    assignments: Vec<(Atom, Atom)>,
}

#[derive(Debug)]
enum Frame {
    /// An enclosing call, with one entry per argument.
    Call(Vec<Option<Factory>>),
    /// An enclosing function expression's parameter names.
    Function(Vec<Option<Atom>>),
}

#[derive(Default)]
struct FactoryExportFinder {
    frames: Vec<Frame>,
    found: Vec<Atom>,
    seen: HashSet<Atom>,
}

impl FactoryExportFinder {
    fn match_exports_argument(&mut self, call: &CallExpr) {
        let Callee::Expr(callee) = &call.callee else {
            return;
        };
        let Expr::Ident(callee) = &**callee else {
            return;
        };

        for (position, arg) in call.args.iter().enumerate() {
            if arg.spread.is_some() {
                continue;
            }
            if !matches!(&*arg.expr, Expr::Ident(i) if i.sym == "exports") {
                continue;
            }
            let Some(props) = self.trace(&callee.sym, position) else {
                continue;
            };
            for prop in props {
                if self.seen.insert(prop.clone()) {
                    debug!(export = %prop, "factory export found");
                    self.found.push(prop);
                }
            }
        }
    }

    /// Follows `callee(exports)` back to the factory whose parameter at the
    /// same position receives `exports`.
    fn trace(&self, callee: &Atom, position: usize) -> Option<Vec<Atom>> {
        let function_index = self
            .frames
            .iter()
            .rposition(|frame| matches!(frame, Frame::Function(_)))?;
        let Frame::Function(params) = &self.frames[function_index] else {
            return None;
        };
        let callee_position = params
            .iter()
            .position(|param| param.as_ref() == Some(callee))?;

        let factory_call = self.frames[..function_index]
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Call(args) => Some(args),
                Frame::Function(_) => None,
            })?;
        let factory = factory_call.get(callee_position)?.as_ref()?;
        let exports_param = factory.params.get(position)?.as_ref()?;

        Some(
            factory
                .assignments
                .iter()
                .filter(|(object, _)| object == exports_param)
                .map(|(_, prop)| prop.clone())
                .collect(),
        )
    }
}

impl Visit for FactoryExportFinder {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        self.match_exports_argument(call);

        self.frames
            .push(Frame::Call(call.args.iter().map(factory_shape).collect()));
        call.visit_children_with(self);
        self.frames.pop();
    }

    fn visit_fn_expr(&mut self, fn_expr: &FnExpr) {
        let params = fn_expr.function.params.iter().map(|param| &param.pat);
        self.frames.push(Frame::Function(param_names(params)));
        fn_expr.visit_children_with(self);
        self.frames.pop();
    }
}

fn factory_shape(arg: &ExprOrSpread) -> Option<Factory> {
    if arg.spread.is_some() {
        return None;
    }
    let (params, body) = match unwrap_parens(&arg.expr) {
        Expr::Fn(fn_expr) => (
            param_names(fn_expr.function.params.iter().map(|param| &param.pat)),
            fn_expr.function.body.as_ref()?,
        ),
        Expr::Arrow(arrow) => match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(body) => (param_names(arrow.params.iter()), body),
            BlockStmtOrExpr::Expr(_) => return None,
        },
        _ => return None,
    };

    let mut assignments = Vec::new();
    for stmt in &body.stmts {
        if let Stmt::Expr(expr_stmt) = stmt {
            collect_assignments(&expr_stmt.expr, &mut assignments);
        }
    }

    Some(Factory {
        params,
        assignments,
    })
}

/// Collects `object.property = ...`, descending into sequences at any depth.
fn collect_assignments(expr: &Expr, out: &mut Vec<(Atom, Atom)>) {
    let assign = match unwrap_parens(expr) {
        Expr::Seq(seq) => {
            for expr in &seq.exprs {
                collect_assignments(expr, out);
            }
            return;
        }
        Expr::Assign(assign) => assign,
        _ => return,
    };
    if assign.op != AssignOp::Assign {
        return;
    }
    let AssignTarget::Simple(SimpleAssignTarget::Member(target)) = &assign.left else {
        return;
    };
    let (Expr::Ident(object), MemberProp::Ident(prop)) = (&*target.obj, &target.prop) else {
        return;
    };
    out.push((object.sym.clone(), prop.sym.clone()));
}

fn param_names<'a>(params: impl Iterator<Item = &'a Pat>) -> Vec<Option<Atom>> {
    params
        .map(|pat| match pat {
            Pat::Ident(binding) => Some(binding.id.sym.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::transform::test_support::run;

    fn exports_of(code: &str) -> Vec<String> {
        let parsed = Parser::new().parse_module("umd.js", code).unwrap();
        find_factory_exports(&parsed.module)
            .iter()
            .map(|a| a.to_string())
            .collect()
    }

    #[test]
    fn minified_bootstrap() {
        let found = exports_of(
            "!function(e, t){t(exports)}(this, function(e){e.foo = 'bar'});const x = 1;",
        );

        assert_eq!(found, vec!["foo"]);
    }

    #[test]
    fn rollup_style_bootstrap() {
        let found = exports_of(
            r#"(function (global, factory) {
    typeof exports === 'object' && typeof module !== 'undefined' ? factory(exports) :
    typeof define === 'function' && define.amd ? define(['exports'], factory) :
    (factory((global.lib = {})));
}(this, (function (exports) { 'use strict';
    function add(a, b) { return a + b; }
    exports.add = add;
    exports.version = '1.0.0';
    Object.defineProperty(exports, '__esModule', { value: true });
})));
"#,
        );

        assert_eq!(found, vec!["add", "version"]);
    }

    #[test]
    fn sequence_statements_are_flattened() {
        let found = exports_of(
            "!function(e, t){t(exports)}(this, function(n){n.a = 1, n.b = 2; n.c = 3});",
        );

        assert_eq!(found, vec!["a", "b", "c"]);
    }

    #[test]
    fn nested_sequences_are_flattened() {
        let found = exports_of(
            "!function(e, t){t(exports)}(this, function(e){e.a = 1, (e.b = 2, e.c = 3)});",
        );

        assert_eq!(found, vec!["a", "b", "c"]);
    }

    #[test]
    fn arrow_factory_with_block_body() {
        let code = "(function(g, f){ f(exports) })(this, (e) => { e.x = 1; });";
        let (output, report) = run(code);

        assert_eq!(exports_of(code), vec!["x"]);
        assert!(output.contains("export const x = exports.x;"));
        assert_eq!(report.umd_exports, 1);
    }

    #[test]
    fn arrow_factory_with_expression_body_is_ignored() {
        assert!(exports_of("(function(g, f){ f(exports) })(this, (e) => e.x = 1);").is_empty());
    }

    #[test]
    fn nested_and_computed_assignments_are_ignored() {
        let found = exports_of(
            r#"!function(e, t){t(exports)}(this, function(e){
    if (ready) { e.late = 1; }
    e["computed"] = 2;
    e.kept = 3;
});"#,
        );

        assert_eq!(found, vec!["kept"]);
    }

    #[test]
    fn plain_call_with_exports_is_not_a_bootstrap() {
        assert!(exports_of("register(exports);").is_empty());
        assert!(exports_of("(function (f) { g(exports); })(function (e) { e.x = 1; });").is_empty());
    }

    #[test]
    fn factory_exports_are_appended() {
        let (output, report) =
            run("!function(e, t){t(exports)}(this, function(e){e.foo = 'bar'; e.bar = 2});");

        assert!(output.contains("export const foo = exports.foo;"));
        assert!(output.contains("export const bar = exports.bar;"));
        assert!(output.contains("const module = {"));
        assert!(output.contains("const exports = module.exports;"));
        assert!(output.trim_end().ends_with("export default module.exports;"));
        assert_eq!(report.umd_exports, 2);
    }

    #[test]
    fn default_property_becomes_default_export() {
        let (output, _) =
            run("!function(e, t){t(exports)}(this, function(e){e.default = main});");

        assert!(output.contains("export default exports.default;"));
        assert!(!output.contains("export default module.exports;"));
    }

    #[test]
    fn clashing_names_are_exported_through_an_alias() {
        let (output, _) = run(
            "var x = 1;\n!function(e, t){t(exports)}(this, function(e){e.x = 1; e.class = 2});",
        );

        assert!(output.contains("const _x = exports.x;"));
        assert!(output.contains("_x as x"));
        assert!(output.contains("const _class = exports.class;"));
        assert!(output.contains("_class as class"));
    }
}
