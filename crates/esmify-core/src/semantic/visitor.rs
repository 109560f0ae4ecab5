//! Scope visitor for building ScopeTree and SymbolTable from AST
//!
//! Declarations are recorded while walking; references are queued with the
//! scope they occur in and resolved once the walk is over, so hoisted `var`
//! and function declarations resolve no matter where they appear.

use std::collections::HashMap;

use swc_atoms::Atom;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    ArrayPat, ArrowExpr, AssignExpr, AssignTarget, AssignTargetPat, BlockStmt, BreakStmt,
    CatchClause, Class, ClassDecl, ClassExpr, Constructor, ContinueStmt, DefaultDecl,
    ExportDefaultDecl, ExportSpecifier, Expr, FnDecl, FnExpr, ForHead, ForInStmt, ForOfStmt,
    ForStmt, Function, GetterProp, Ident, ImportDecl, ImportSpecifier, JSXElementName, JSXObject,
    LabeledStmt, Module, ModuleExportName, NamedExport, ObjectPat, ObjectPatProp,
    ParamOrTsParamProp, Pat, Prop, SetterProp, SimpleAssignTarget, SwitchStmt, TsParamPropParam,
    UpdateExpr, VarDecl, VarDeclKind,
};
use swc_ecma_visit::{Visit, VisitWith};

use super::scope::{ScopeId, ScopeKind, ScopeTree};
use super::symbols::{
    DeclarationKind, Symbol, SymbolId, SymbolTable, UnresolvedReference, Violation,
    ViolationKind,
};

struct PendingReference {
    name: Atom,
    span: Span,
    scope: ScopeId,
    write_site: Option<Span>,
}

pub struct ScopeBuilder {
    scope_tree: ScopeTree,
    symbol_table: SymbolTable,
    current_scope: Option<ScopeId>,
    declaration_sites: HashMap<Span, SymbolId>,
    references: Vec<PendingReference>,
}

impl Default for ScopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of scope analysis over one module.
pub struct SemanticModel {
    pub scope_tree: ScopeTree,
    pub symbol_table: SymbolTable,
    pub unresolved_references: Vec<UnresolvedReference>,
    declaration_sites: HashMap<Span, SymbolId>,
}

impl SemanticModel {
    /// True when some reference to `name` resolves to no declaration at all.
    pub fn has_free_reference(&self, name: &str) -> bool {
        self.unresolved_references.iter().any(|r| r.name == name)
    }

    /// The binding declared (or redeclared) by the identifier at `span`.
    ///
    /// Synthesized identifiers carry no position and never match.
    pub fn binding_at(&self, span: Span) -> Option<&Symbol> {
        if span.is_dummy() {
            return None;
        }
        self.declaration_sites
            .get(&span)
            .map(|&id| self.symbol_table.get(id))
    }

    pub fn has_top_level_binding(&self, name: &str) -> bool {
        self.scope_tree
            .root()
            .and_then(|root| self.symbol_table.lookup_own(name, root))
            .is_some()
    }
}

impl ScopeBuilder {
    pub fn new() -> Self {
        Self {
            scope_tree: ScopeTree::new(),
            symbol_table: SymbolTable::new(),
            current_scope: None,
            declaration_sites: HashMap::new(),
            references: Vec::new(),
        }
    }

    pub fn build(module: &Module) -> SemanticModel {
        let mut builder = Self::new();
        module.visit_with(&mut builder);
        builder.finish()
    }

    fn finish(mut self) -> SemanticModel {
        let mut unresolved_references = Vec::new();

        for reference in std::mem::take(&mut self.references) {
            let resolved =
                self.symbol_table
                    .lookup(&reference.name, reference.scope, &self.scope_tree);
            match resolved {
                Some(symbol_id) => {
                    self.symbol_table.add_reference(symbol_id, reference.span);
                    if let Some(site) = reference.write_site {
                        self.symbol_table.add_violation(
                            symbol_id,
                            Violation {
                                kind: ViolationKind::Assignment,
                                span: site,
                            },
                        );
                    }
                }
                None => unresolved_references.push(UnresolvedReference {
                    name: reference.name.to_string(),
                    span: reference.span,
                    scope: reference.scope,
                }),
            }
        }

        SemanticModel {
            scope_tree: self.scope_tree,
            symbol_table: self.symbol_table,
            unresolved_references,
            declaration_sites: self.declaration_sites,
        }
    }

    fn scope(&mut self) -> ScopeId {
        match self.current_scope {
            Some(id) => id,
            None => {
                let id = self
                    .scope_tree
                    .create_scope(ScopeKind::Module, None, Span::default());
                self.current_scope = Some(id);
                id
            }
        }
    }

    fn with_scope(&mut self, kind: ScopeKind, span: Span, f: impl FnOnce(&mut Self)) {
        let parent = self.scope();
        let id = self.scope_tree.create_scope(kind, Some(parent), span);
        self.current_scope = Some(id);
        f(self);
        self.current_scope = Some(parent);
    }

    fn declare(&mut self, ident: &Ident, kind: DeclarationKind, site: Span) {
        let current = self.scope();
        let scope = if kind == DeclarationKind::Var {
            self.scope_tree.var_scope(current)
        } else {
            current
        };

        let symbol_id = match self.symbol_table.lookup_own(&ident.sym, scope) {
            Some(existing) => {
                let violation_kind = if kind == DeclarationKind::Var {
                    ViolationKind::Declarator
                } else {
                    ViolationKind::Assignment
                };
                self.symbol_table.add_violation(
                    existing,
                    Violation {
                        kind: violation_kind,
                        span: site,
                    },
                );
                existing
            }
            None => self
                .symbol_table
                .declare(&ident.sym, kind, scope, ident.span),
        };

        if !ident.span.is_dummy() {
            self.declaration_sites.insert(ident.span, symbol_id);
        }
    }

    fn declare_pat(&mut self, pat: &Pat, kind: DeclarationKind, site: Span) {
        let mut idents = Vec::new();
        pat_idents(pat, &mut idents);
        for ident in idents {
            self.declare(ident, kind, site);
        }
    }

    fn reference(&mut self, ident: &Ident) {
        let scope = self.scope();
        self.references.push(PendingReference {
            name: ident.sym.clone(),
            span: ident.span,
            scope,
            write_site: None,
        });
    }

    fn write(&mut self, ident: &Ident, site: Span) {
        let scope = self.scope();
        self.references.push(PendingReference {
            name: ident.sym.clone(),
            span: ident.span,
            scope,
            write_site: Some(site),
        });
    }

    fn function_body(&mut self, body: Option<&BlockStmt>) {
        if let Some(body) = body {
            body.visit_children_with(self);
        }
    }
}

impl Visit for ScopeBuilder {
    fn visit_module(&mut self, module: &Module) {
        let id = self
            .scope_tree
            .create_scope(ScopeKind::Module, None, module.span);
        self.current_scope = Some(id);
        module.visit_children_with(self);
    }

    fn visit_import_decl(&mut self, import: &ImportDecl) {
        for specifier in &import.specifiers {
            let local = match specifier {
                ImportSpecifier::Named(named) => &named.local,
                ImportSpecifier::Default(default) => &default.local,
                ImportSpecifier::Namespace(namespace) => &namespace.local,
            };
            self.declare(local, DeclarationKind::Import, local.span);
        }
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        if export.src.is_some() {
            return;
        }
        for specifier in &export.specifiers {
            if let ExportSpecifier::Named(named) = specifier {
                if let ModuleExportName::Ident(orig) = &named.orig {
                    self.reference(orig);
                }
            }
        }
    }

    fn visit_export_default_decl(&mut self, export: &ExportDefaultDecl) {
        match &export.decl {
            DefaultDecl::Fn(fn_expr) => {
                if let Some(ident) = &fn_expr.ident {
                    self.declare(ident, DeclarationKind::Function, ident.span);
                }
                fn_expr.function.visit_with(self);
            }
            DefaultDecl::Class(class_expr) => {
                if let Some(ident) = &class_expr.ident {
                    self.declare(ident, DeclarationKind::Class, ident.span);
                }
                class_expr.class.visit_with(self);
            }
            DefaultDecl::TsInterfaceDecl(_) => {}
        }
    }

    fn visit_fn_decl(&mut self, fn_decl: &FnDecl) {
        self.declare(
            &fn_decl.ident,
            DeclarationKind::Function,
            fn_decl.ident.span,
        );
        fn_decl.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, fn_expr: &FnExpr) {
        self.with_scope(ScopeKind::Function, fn_expr.function.span, |builder| {
            if let Some(ident) = &fn_expr.ident {
                builder.declare(ident, DeclarationKind::Function, ident.span);
            }
            fn_expr.function.visit_with(builder);
        });
    }

    fn visit_function(&mut self, function: &Function) {
        function.decorators.visit_with(self);
        self.with_scope(ScopeKind::Function, function.span, |builder| {
            for param in &function.params {
                builder.declare_pat(&param.pat, DeclarationKind::Parameter, param.span);
                param.visit_children_with(builder);
            }
            builder.function_body(function.body.as_ref());
        });
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.with_scope(ScopeKind::ArrowFunction, arrow.span, |builder| {
            for pat in &arrow.params {
                builder.declare_pat(pat, DeclarationKind::Parameter, pat.span());
                pat.visit_with(builder);
            }
            arrow.body.visit_with(builder);
        });
    }

    fn visit_constructor(&mut self, constructor: &Constructor) {
        constructor.key.visit_with(self);
        self.with_scope(ScopeKind::Function, constructor.span, |builder| {
            for param in &constructor.params {
                match param {
                    ParamOrTsParamProp::Param(param) => {
                        builder.declare_pat(&param.pat, DeclarationKind::Parameter, param.span);
                        param.visit_children_with(builder);
                    }
                    ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                        TsParamPropParam::Ident(binding) => {
                            builder.declare(&binding.id, DeclarationKind::Parameter, prop.span);
                        }
                        TsParamPropParam::Assign(assign) => {
                            builder.declare_pat(&assign.left, DeclarationKind::Parameter, prop.span);
                            assign.right.visit_with(builder);
                        }
                    },
                }
            }
            builder.function_body(constructor.body.as_ref());
        });
    }

    fn visit_getter_prop(&mut self, getter: &GetterProp) {
        getter.key.visit_with(self);
        self.with_scope(ScopeKind::Function, getter.span, |builder| {
            builder.function_body(getter.body.as_ref());
        });
    }

    fn visit_setter_prop(&mut self, setter: &SetterProp) {
        setter.key.visit_with(self);
        self.with_scope(ScopeKind::Function, setter.span, |builder| {
            builder.declare_pat(&setter.param, DeclarationKind::Parameter, setter.param.span());
            setter.param.visit_with(builder);
            builder.function_body(setter.body.as_ref());
        });
    }

    fn visit_class_decl(&mut self, class_decl: &ClassDecl) {
        self.declare(
            &class_decl.ident,
            DeclarationKind::Class,
            class_decl.ident.span,
        );
        class_decl.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, class_expr: &ClassExpr) {
        self.with_scope(ScopeKind::Class, class_expr.class.span, |builder| {
            if let Some(ident) = &class_expr.ident {
                builder.declare(ident, DeclarationKind::Class, ident.span);
            }
            class_expr.class.visit_with(builder);
        });
    }

    fn visit_class(&mut self, class: &Class) {
        self.with_scope(ScopeKind::Class, class.span, |builder| {
            class.visit_children_with(builder);
        });
    }

    fn visit_block_stmt(&mut self, block: &BlockStmt) {
        self.with_scope(ScopeKind::Block, block.span, |builder| {
            block.visit_children_with(builder);
        });
    }

    fn visit_for_stmt(&mut self, for_stmt: &ForStmt) {
        self.with_scope(ScopeKind::For, for_stmt.span, |builder| {
            for_stmt.visit_children_with(builder);
        });
    }

    fn visit_for_in_stmt(&mut self, for_in: &ForInStmt) {
        self.with_scope(ScopeKind::For, for_in.span, |builder| {
            for_in.visit_children_with(builder);
        });
    }

    fn visit_for_of_stmt(&mut self, for_of: &ForOfStmt) {
        self.with_scope(ScopeKind::For, for_of.span, |builder| {
            for_of.visit_children_with(builder);
        });
    }

    fn visit_for_head(&mut self, head: &ForHead) {
        match head {
            ForHead::Pat(pat) => {
                let mut idents = Vec::new();
                pat_idents(pat, &mut idents);
                for ident in idents {
                    self.write(ident, pat.span());
                }
                pat.visit_with(self);
            }
            _ => head.visit_children_with(self),
        }
    }

    fn visit_switch_stmt(&mut self, switch: &SwitchStmt) {
        switch.discriminant.visit_with(self);
        self.with_scope(ScopeKind::Block, switch.span, |builder| {
            switch.cases.visit_with(builder);
        });
    }

    fn visit_catch_clause(&mut self, catch: &CatchClause) {
        self.with_scope(ScopeKind::Catch, catch.span, |builder| {
            if let Some(param) = &catch.param {
                builder.declare_pat(param, DeclarationKind::CatchParameter, param.span());
                param.visit_with(builder);
            }
            catch.body.visit_children_with(builder);
        });
    }

    fn visit_var_decl(&mut self, var_decl: &VarDecl) {
        let kind = match var_decl.kind {
            VarDeclKind::Var => DeclarationKind::Var,
            VarDeclKind::Let => DeclarationKind::Let,
            VarDeclKind::Const => DeclarationKind::Const,
        };

        for declarator in &var_decl.decls {
            self.declare_pat(&declarator.name, kind, declarator.span);
            declarator.name.visit_with(self);
            declarator.init.visit_with(self);
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.reference(ident),
            _ => expr.visit_children_with(self),
        }
    }

    fn visit_assign_expr(&mut self, assign: &AssignExpr) {
        match &assign.left {
            AssignTarget::Simple(SimpleAssignTarget::Ident(binding)) => {
                self.write(&binding.id, assign.span);
            }
            AssignTarget::Simple(target) => target.visit_with(self),
            AssignTarget::Pat(pat) => {
                let mut idents = Vec::new();
                match pat {
                    AssignTargetPat::Array(array) => array_pat_idents(array, &mut idents),
                    AssignTargetPat::Object(object) => object_pat_idents(object, &mut idents),
                    AssignTargetPat::Invalid(_) => {}
                }
                for ident in idents {
                    self.write(ident, assign.span);
                }
                pat.visit_with(self);
            }
        }
        assign.right.visit_with(self);
    }

    fn visit_update_expr(&mut self, update: &UpdateExpr) {
        match &*update.arg {
            Expr::Ident(ident) => self.write(ident, update.span),
            arg => arg.visit_with(self),
        }
    }

    fn visit_prop(&mut self, prop: &Prop) {
        match prop {
            Prop::Shorthand(ident) => self.reference(ident),
            _ => prop.visit_children_with(self),
        }
    }

    fn visit_labeled_stmt(&mut self, labeled: &LabeledStmt) {
        labeled.body.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _: &ContinueStmt) {}

    fn visit_jsx_element_name(&mut self, name: &JSXElementName) {
        match name {
            JSXElementName::Ident(ident) => {
                if ident.sym.starts_with(|c: char| c.is_ascii_uppercase()) {
                    self.reference(ident);
                }
            }
            JSXElementName::JSXMemberExpr(member) => member.obj.visit_with(self),
            JSXElementName::JSXNamespacedName(_) => {}
        }
    }

    fn visit_jsx_object(&mut self, object: &JSXObject) {
        match object {
            JSXObject::Ident(ident) => self.reference(ident),
            JSXObject::JSXMemberExpr(member) => member.obj.visit_with(self),
        }
    }
}

/// Collects the identifiers a pattern binds or assigns.
pub(crate) fn pat_idents<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
    match pat {
        Pat::Ident(binding) => out.push(&binding.id),
        Pat::Array(array) => array_pat_idents(array, out),
        Pat::Object(object) => object_pat_idents(object, out),
        Pat::Rest(rest) => pat_idents(&rest.arg, out),
        Pat::Assign(assign) => pat_idents(&assign.left, out),
        Pat::Expr(expr) => {
            if let Expr::Ident(ident) = &**expr {
                out.push(ident);
            }
        }
        Pat::Invalid(_) => {}
    }
}

fn array_pat_idents<'a>(array: &'a ArrayPat, out: &mut Vec<&'a Ident>) {
    for elem in array.elems.iter().flatten() {
        pat_idents(elem, out);
    }
}

fn object_pat_idents<'a>(object: &'a ObjectPat, out: &mut Vec<&'a Ident>) {
    for prop in &object.props {
        match prop {
            ObjectPatProp::KeyValue(kv) => pat_idents(&kv.value, out),
            ObjectPatProp::Assign(assign) => out.push(&assign.key.id),
            ObjectPatProp::Rest(rest) => pat_idents(&rest.arg, out),
        }
    }
}
