//! Local `module`/`exports` bindings for CommonJS usage left in place.

use swc_ecma_ast::{Decl, Module, ModuleDecl, ModuleItem, Stmt};
use tracing::debug;

use super::TransformReport;
use super::ast::{const_decl, export_default, has_default_export, ident, member, object};
use crate::semantic::ScopeBuilder;

/// When `module` or `exports` is still referenced as a global, declares
/// both after the last import and default-exports `module.exports` unless
/// the module already has a default export.
pub(super) fn inject_module_shim(module: &mut Module, report: &mut TransformReport) {
    let model = ScopeBuilder::build(module);
    if !model.has_free_reference("module") && !model.has_free_reference("exports") {
        return;
    }

    let position = module
        .body
        .iter()
        .rposition(|item| matches!(item, ModuleItem::ModuleDecl(ModuleDecl::Import(_))))
        .map_or(0, |last_import| last_import + 1);

    let module_binding = const_decl(
        ident("module"),
        object(vec![("exports", object(Vec::new()))]),
    );
    let exports_binding = const_decl(ident("exports"), member("module", "exports"));
    module.body.splice(
        position..position,
        [
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(module_binding))),
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(exports_binding))),
        ],
    );

    if !has_default_export(module) {
        module.body.push(export_default(
            Box::new(member("module", "exports")),
            swc_common::DUMMY_SP,
        ));
    }

    report.shim_injected = true;
    debug!("module/exports shim injected");
}
