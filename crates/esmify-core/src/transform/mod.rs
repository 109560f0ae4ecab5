//! CommonJS to ES module rewriting.
//!
//! [`transform`] runs over one parsed module:
//!
//! 1. scope analysis and fresh-name bookkeeping over the untouched tree;
//! 2. detection of UMD factory exports;
//! 3. a single rewriting pass for `require(...)`, `module.exports = ...`
//!    and redeclared requires, collecting new imports instead of inserting
//!    them mid-traversal;
//! 4. the collected imports and hoisted default exports are placed at the
//!    top, factory exports at the end;
//! 5. every import and re-export source is resolved;
//! 6. a `module`/`exports` shim is added when CommonJS globals survive.

mod ast;
mod duplicates;
mod module_exports;
mod require;
mod rewriter;
mod shim;
mod sources;
mod umd;

use std::path::Path;

use serde::Serialize;
use swc_ecma_ast::{ModuleDecl, ModuleItem};
use swc_ecma_visit::VisitMutWith;
use tracing::debug;

use crate::parser::ParsedModule;
use crate::resolver::{ModuleResolver, ResolveConfig, ResolveError};
use crate::semantic::{ScopeBuilder, UniqueNames};
use rewriter::Rewriter;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("failed to resolve '{specifier}': {source}")]
    Resolve {
        specifier: String,
        #[source]
        source: ResolveError,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TransformOptions<'a> {
    /// Path of the module being transformed; relative specifiers resolve
    /// against its directory.
    pub module_path: &'a Path,
    pub config: &'a ResolveConfig,
}

impl<'a> TransformOptions<'a> {
    pub fn new(module_path: &'a Path, config: &'a ResolveConfig) -> Self {
        Self {
            module_path,
            config,
        }
    }

    pub fn module_dir(&self) -> &'a Path {
        self.module_path.parent().unwrap_or(Path::new(""))
    }
}

/// What a transform changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    /// `var x = require("m")` turned into `import x from "m"`.
    pub require_imports: usize,
    /// `require("m");` turned into `import "m"`.
    pub side_effect_imports: usize,
    /// `require("m")` calls replaced by a fresh import binding.
    pub inline_requires: usize,
    pub default_exports: usize,
    pub umd_exports: usize,
    pub duplicate_declarators: usize,
    pub rewritten_sources: usize,
    pub removed_sources: Vec<String>,
    pub shim_injected: bool,
}

impl TransformReport {
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }
}

/// Rewrites `parsed` in place into an ES module.
///
/// On error the tree may be partially rewritten and should be discarded.
pub fn transform<R: ModuleResolver + ?Sized>(
    parsed: &mut ParsedModule,
    resolver: &R,
    options: &TransformOptions<'_>,
) -> Result<TransformReport, TransformError> {
    let module = &mut parsed.module;
    let mut report = TransformReport::default();

    let model = ScopeBuilder::build(module);
    let mut names = UniqueNames::from_module(module);
    let factory_exports = umd::find_factory_exports(module);
    for name in &factory_exports {
        names.reserve(name);
    }

    let (imports, hoisted) = {
        let mut rewriter = Rewriter::new(&model, &mut names, &mut report);
        module.visit_mut_with(&mut rewriter);
        (rewriter.imports, rewriter.hoisted)
    };

    let body = std::mem::take(&mut module.body);
    module.body = imports
        .into_iter()
        .map(|import| ModuleItem::ModuleDecl(ModuleDecl::Import(import)))
        .chain(hoisted)
        .chain(body)
        .collect();

    umd::append_factory_exports(module, &factory_exports, &model, &mut names, &mut report);
    sources::rewrite_sources(
        module,
        resolver,
        options.module_dir(),
        options.config,
        &mut report,
    )?;
    shim::inject_module_shim(module, &mut report);

    debug!(
        module = %options.module_path.display(),
        require_imports = report.require_imports,
        side_effect_imports = report.side_effect_imports,
        inline_requires = report.inline_requires,
        default_exports = report.default_exports,
        umd_exports = report.umd_exports,
        duplicate_declarators = report.duplicate_declarators,
        rewritten_sources = report.rewritten_sources,
        removed_sources = report.removed_sources.len(),
        shim = report.shim_injected,
        "module transformed"
    );

    Ok(report)
}


#[cfg(test)]
mod tests {
    use super::test_support::run;
    use super::*;

    #[test]
    fn module_dir_is_the_parent_directory() {
        let config = ResolveConfig::default();
        let options = TransformOptions::new(Path::new("/app/client/main.js"), &config);

        assert_eq!(options.module_dir(), Path::new("/app/client"));
    }

    #[test]
    fn imports_come_before_hoisted_defaults() {
        let (output, _) = run(r#"var a = b = module.exports = require("dep");"#);

        let import = output.find(r#"import _require from "dep";"#).unwrap();
        let default = output.find("export default _require;").unwrap();
        let chain = output.find("var a = b = _require;").unwrap();
        assert!(import < default && default < chain);
    }

    #[test]
    fn untouched_module_reports_no_change() {
        let (_, report) = run("export const a = 1;");

        assert!(report.is_unchanged());
    }

    #[test]
    fn rerunning_on_output_changes_nothing() {
        let source = r#"var path = require("path");
require("./setup");
module.exports = { join: (p) => path.join(p, require("./suffix")) };
exports.extra = 1;
"#;
        let (first, _) = run(source);
        let (second, report) = run(&first);

        assert_eq!(first, second);
        assert!(report.is_unchanged());
    }
}
