//! Node builders and small pattern matchers shared by the rewrite rules.

use std::collections::HashSet;

use swc_atoms::Atom;
use swc_common::{DUMMY_SP, Span, SyntaxContext};
use swc_ecma_ast::{
    AssignExpr, AssignOp, AssignTarget, BindingIdent, CallExpr, Callee, Decl, EmptyStmt,
    ExportDecl, ExportDefaultExpr, ExportNamedSpecifier, ExportSpecifier, Expr, Ident, IdentName,
    ImportDecl, ImportDefaultSpecifier, ImportPhase, ImportSpecifier, KeyValueProp, Lit,
    MemberExpr, MemberProp, Module, ModuleDecl, ModuleExportName, ModuleItem, NamedExport,
    ObjectLit, ParenExpr, Pat, Prop, PropName, PropOrSpread, SimpleAssignTarget, Stmt, Str,
    VarDecl, VarDeclKind, VarDeclarator,
};

pub(crate) fn ident(sym: impl Into<Atom>) -> Ident {
    Ident::new_no_ctxt(sym.into(), DUMMY_SP)
}

/// `obj.prop`
pub(crate) fn member(obj: &str, prop: &str) -> Expr {
    Expr::Member(MemberExpr {
        span: DUMMY_SP,
        obj: Box::new(Expr::Ident(ident(obj))),
        prop: MemberProp::Ident(IdentName::new(prop.into(), DUMMY_SP)),
    })
}

/// `import local from src;`
pub(crate) fn default_import(local: Ident, src: Box<Str>) -> ImportDecl {
    ImportDecl {
        span: DUMMY_SP,
        specifiers: vec![ImportSpecifier::Default(ImportDefaultSpecifier {
            span: DUMMY_SP,
            local,
        })],
        src,
        type_only: false,
        with: None,
        phase: ImportPhase::Evaluation,
    }
}

/// `import src;`
pub(crate) fn side_effect_import(src: Box<Str>) -> ImportDecl {
    ImportDecl {
        span: DUMMY_SP,
        specifiers: Vec::new(),
        src,
        type_only: false,
        with: None,
        phase: ImportPhase::Evaluation,
    }
}

/// `export default expr;`
///
/// Sequences, functions and classes are parenthesized: the first would
/// otherwise print as several exports, the others would read back as
/// declarations.
pub(crate) fn export_default(expr: Box<Expr>, span: Span) -> ModuleItem {
    let expr = match *expr {
        expr @ (Expr::Seq(_) | Expr::Fn(_) | Expr::Class(_)) => {
            Box::new(Expr::Paren(ParenExpr {
                span: DUMMY_SP,
                expr: Box::new(expr),
            }))
        }
        other => Box::new(other),
    };
    ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(ExportDefaultExpr { span, expr }))
}

pub(crate) fn const_decl(name: Ident, init: Expr) -> Box<VarDecl> {
    Box::new(VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind: VarDeclKind::Const,
        declare: false,
        decls: vec![VarDeclarator {
            span: DUMMY_SP,
            name: Pat::Ident(BindingIdent::from(name)),
            init: Some(Box::new(init)),
            definite: false,
        }],
    })
}

/// `export const name = init;`
pub(crate) fn export_const(name: Ident, init: Expr) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
        span: DUMMY_SP,
        decl: Decl::Var(const_decl(name, init)),
    }))
}

/// `export { local as exported };`
pub(crate) fn export_alias(local: Ident, exported: Ident) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(NamedExport {
        span: DUMMY_SP,
        specifiers: vec![ExportSpecifier::Named(ExportNamedSpecifier {
            span: DUMMY_SP,
            orig: ModuleExportName::Ident(local),
            exported: Some(ModuleExportName::Ident(exported)),
            is_type_only: false,
        })],
        src: None,
        type_only: false,
        with: None,
    }))
}

/// `{ key: value }`
pub(crate) fn object(props: Vec<(&str, Expr)>) -> Expr {
    Expr::Object(ObjectLit {
        span: DUMMY_SP,
        props: props
            .into_iter()
            .map(|(key, value)| {
                PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                    key: PropName::Ident(IdentName::new(key.into(), DUMMY_SP)),
                    value: Box::new(value),
                })))
            })
            .collect(),
    })
}

/// Placeholder for a statement a rule removed; dropped from statement lists.
pub(crate) fn removed_stmt() -> Stmt {
    Stmt::Empty(EmptyStmt { span: DUMMY_SP })
}

pub(crate) fn is_removed_stmt(stmt: &Stmt) -> bool {
    matches!(stmt, Stmt::Empty(empty) if empty.span.is_dummy())
}

pub(crate) fn unwrap_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unwrap_parens(&paren.expr),
        _ => expr,
    }
}

pub(crate) fn into_unparenthesized(expr: Box<Expr>) -> Box<Expr> {
    match *expr {
        Expr::Paren(paren) => into_unparenthesized(paren.expr),
        other => Box::new(other),
    }
}

/// The string literal passed to `require(...)`, when `call` is such a call.
pub(crate) fn require_specifier(call: &CallExpr) -> Option<&Str> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Ident(callee) = &**callee else {
        return None;
    };
    if callee.sym != "require" {
        return None;
    }

    let first = call.args.first()?;
    if first.spread.is_some() {
        return None;
    }
    match &*first.expr {
        Expr::Lit(Lit::Str(specifier)) => Some(specifier),
        _ => None,
    }
}

/// Any call to `require`, whatever its arguments.
pub(crate) fn is_require_call(expr: &Expr) -> bool {
    let Expr::Call(call) = unwrap_parens(expr) else {
        return false;
    };
    matches!(&call.callee, Callee::Expr(callee) if matches!(&**callee, Expr::Ident(i) if i.sym == "require"))
}

pub(crate) fn expr_require_specifier(expr: &Expr) -> Option<&Str> {
    match unwrap_parens(expr) {
        Expr::Call(call) => require_specifier(call),
        _ => None,
    }
}

/// `module.exports = ...` with a plain `=` and a non-computed property.
pub(crate) fn is_module_exports_assign(assign: &AssignExpr) -> bool {
    if assign.op != AssignOp::Assign {
        return false;
    }
    let AssignTarget::Simple(SimpleAssignTarget::Member(target)) = &assign.left else {
        return false;
    };
    let is_module = matches!(&*target.obj, Expr::Ident(obj) if obj.sym == "module");
    let is_exports = matches!(&target.prop, MemberProp::Ident(prop) if prop.sym == "exports");
    is_module && is_exports
}

/// Names the module exports, `default` included.
pub(crate) fn exported_names(module: &Module) -> HashSet<Atom> {
    let mut names = HashSet::new();

    for item in &module.body {
        let ModuleItem::ModuleDecl(decl) = item else {
            continue;
        };
        match decl {
            ModuleDecl::ExportDefaultExpr(_) | ModuleDecl::ExportDefaultDecl(_) => {
                names.insert(Atom::from("default"));
            }
            ModuleDecl::ExportDecl(export) => match &export.decl {
                Decl::Var(var) => {
                    for declarator in &var.decls {
                        let mut idents = Vec::new();
                        crate::semantic::visitor::pat_idents(&declarator.name, &mut idents);
                        names.extend(idents.into_iter().map(|i| i.sym.clone()));
                    }
                }
                Decl::Fn(f) => {
                    names.insert(f.ident.sym.clone());
                }
                Decl::Class(c) => {
                    names.insert(c.ident.sym.clone());
                }
                _ => {}
            },
            ModuleDecl::ExportNamed(named) => {
                for specifier in &named.specifiers {
                    let exported = match specifier {
                        ExportSpecifier::Named(s) => s.exported.as_ref().unwrap_or(&s.orig),
                        ExportSpecifier::Default(s) => {
                            names.insert(s.exported.sym.clone());
                            continue;
                        }
                        ExportSpecifier::Namespace(s) => &s.name,
                    };
                    names.insert(export_name_atom(exported));
                }
            }
            _ => {}
        }
    }

    names
}

pub(crate) fn has_default_export(module: &Module) -> bool {
    exported_names(module).contains(&Atom::from("default"))
}

fn export_name_atom(name: &ModuleExportName) -> Atom {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.clone(),
        ModuleExportName::Str(s) => s.value.clone(),
    }
}
