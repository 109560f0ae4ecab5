//! `require(...)` rules.
//!
//! A Program-level `var x = require("m")` whose binding is never reassigned
//! becomes `import x from "m"`. A bare `require("m");` statement becomes
//! `import "m"`. Any other `require("m")` call is replaced by a fresh
//! identifier bound through a default import.

use swc_ecma_ast::{Expr, Pat, Stmt, VarDeclarator};
use swc_ecma_visit::VisitMutWith;
use tracing::debug;

use super::ast::{default_import, expr_require_specifier, ident, removed_stmt, require_specifier,
    side_effect_import};
use super::rewriter::Rewriter;

impl Rewriter<'_> {
    pub(super) fn rewrite_standalone_require(&mut self, stmt: &mut Stmt) -> bool {
        let Stmt::Expr(expr_stmt) = stmt else {
            return false;
        };
        let Some(specifier) = expr_require_specifier(&expr_stmt.expr) else {
            return false;
        };

        let src = Box::new(specifier.clone());
        debug!(specifier = %src.value, "standalone require rewritten to side-effect import");
        self.imports.push(side_effect_import(src));
        self.report.side_effect_imports += 1;
        *stmt = removed_stmt();
        true
    }

    pub(super) fn rewrite_inline_require(&mut self, expr: &mut Expr) {
        let Expr::Call(call) = expr else {
            return;
        };
        let Some(specifier) = require_specifier(call) else {
            return;
        };

        let src = Box::new(specifier.clone());
        let local = ident(self.names.fresh("require"));
        debug!(specifier = %src.value, local = %local.sym, "inline require bound to import");
        self.imports.push(default_import(local.clone(), src));
        self.report.inline_requires += 1;
        *expr = Expr::Ident(local);
    }

    /// Applies the declarator rules to one declaration list, dropping the
    /// declarators that turn into imports or duplicate an earlier require.
    pub(super) fn rewrite_declarators(&mut self, decls: &mut Vec<VarDeclarator>) {
        let program_level = std::mem::take(&mut self.program_var);
        let in_for_head = std::mem::take(&mut self.for_head);

        let mut kept = Vec::with_capacity(decls.len());
        for mut declarator in decls.drain(..) {
            if !in_for_head {
                self.mark_duplicate_requires(&declarator);
                if self.removed_declarators.contains(&declarator.span) {
                    self.report.duplicate_declarators += 1;
                    debug!("duplicate require declarator removed");
                    continue;
                }
            }

            if program_level && self.hoist_required_binding(&declarator) {
                continue;
            }

            declarator.visit_mut_with(self);
            kept.push(declarator);
        }

        *decls = kept;
    }

    fn hoist_required_binding(&mut self, declarator: &VarDeclarator) -> bool {
        let Pat::Ident(binding) = &declarator.name else {
            return false;
        };
        if binding.type_ann.is_some() {
            return false;
        }
        let Some(specifier) = declarator.init.as_deref().and_then(expr_require_specifier) else {
            return false;
        };

        let reassigned = self
            .model
            .binding_at(binding.id.span)
            .is_some_and(|symbol| symbol.has_assignments());
        if reassigned {
            return false;
        }

        debug!(specifier = %specifier.value, local = %binding.id.sym, "require declarator rewritten to import");
        self.imports
            .push(default_import(binding.id.clone(), Box::new(specifier.clone())));
        self.report.require_imports += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::transform::test_support::run;

    #[test]
    fn program_level_require_becomes_import() {
        let (output, report) = run(r#"var foo = require("foo");
foo();
"#);

        assert!(output.contains(r#"import foo from "foo";"#));
        assert!(!output.contains("require"));
        assert!(output.contains("foo();"));
        assert_eq!(report.require_imports, 1);
    }

    #[test]
    fn each_declarator_of_a_declaration_is_handled() {
        let (output, report) = run(r#"const a = require("a"), b = 2, c = require("c");"#);

        assert!(output.contains(r#"import a from "a";"#));
        assert!(output.contains(r#"import c from "c";"#));
        assert!(output.contains("const b = 2;"));
        assert_eq!(report.require_imports, 2);
    }

    #[test]
    fn imports_keep_source_order() {
        let (output, _) = run(r#"var a = require("a");
var b = require("b");
require("c");
"#);

        let a = output.find(r#"from "a""#).unwrap();
        let b = output.find(r#"from "b""#).unwrap();
        let c = output.find(r#"import "c""#).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn standalone_require_becomes_side_effect_import() {
        let (output, report) = run(r#"require("./polyfill");
run();
"#);

        assert!(output.starts_with(r#"import "./polyfill";"#));
        assert!(output.contains("run();"));
        assert_eq!(report.side_effect_imports, 1);
    }

    #[test]
    fn nested_standalone_require_is_hoisted() {
        let (output, _) = run(r#"function setup() {
    require("./side");
    return 1;
}
"#);

        assert!(output.starts_with(r#"import "./side";"#));
        assert!(output.contains("return 1;"));
        assert!(!output.contains("require"));
    }

    #[test]
    fn inline_require_gets_a_fresh_binding() {
        let (output, report) = run(r#"console.log(require("foo").bar);"#);

        assert!(output.contains(r#"import _require from "foo";"#));
        assert!(output.contains("console.log(_require.bar);"));
        assert_eq!(report.inline_requires, 1);
    }

    #[test]
    fn fresh_bindings_never_clash() {
        let (output, _) = run(r#"var _require = 1;
f(require("a"), require("b"));
"#);

        assert!(output.contains(r#"import _require2 from "a";"#));
        assert!(output.contains(r#"import _require3 from "b";"#));
        assert!(output.contains("f(_require2, _require3);"));
    }

    #[test]
    fn nested_declarator_uses_inline_rule() {
        let (output, report) = run(r#"function load() {
    var dep = require("dep");
    return dep;
}
"#);

        assert!(output.contains(r#"import _require from "dep";"#));
        assert!(output.contains("var dep = _require;"));
        assert_eq!(report.require_imports, 0);
        assert_eq!(report.inline_requires, 1);
    }

    #[test]
    fn reassigned_binding_uses_inline_rule() {
        let (output, _) = run(r#"var foo = require("foo");
foo = wrap(foo);
"#);

        assert!(output.contains(r#"import _require from "foo";"#));
        assert!(output.contains("var foo = _require;"));
        assert!(output.contains("foo = wrap(foo);"));
    }

    #[test]
    fn destructured_require_uses_inline_rule() {
        let (output, _) = run(r#"const { a, b } = require("pair");"#);

        assert!(output.contains(r#"import _require from "pair";"#));
        assert!(output.contains("= _require;"));
    }

    #[test]
    fn dynamic_require_is_left_alone() {
        let (output, report) = run("const m = require(name);");

        assert!(output.contains("require(name)"));
        assert_eq!(report, Default::default());
    }
}
