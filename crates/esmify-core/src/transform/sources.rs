//! Rewrites import and re-export sources to resolved file paths.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use swc_atoms::Atom;
use swc_ecma_ast::{Module, ModuleDecl, ModuleItem, Str};
use tracing::debug;

use super::{TransformError, TransformReport};
use crate::resolver::{ModuleResolver, ResolveConfig};

static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\]+").expect("Invalid regex pattern"));

/// Resolves the source of every import, `export * from` and
/// `export { .. } from` item. Sources resolving to JavaScript are replaced
/// by the resolved path; the rest are dropped when `remove_unresolved` is
/// set and left alone otherwise.
pub(super) fn rewrite_sources<R: ModuleResolver + ?Sized>(
    module: &mut Module,
    resolver: &R,
    from_dir: &Path,
    config: &ResolveConfig,
    report: &mut TransformReport,
) -> Result<(), TransformError> {
    let mut keep = Vec::with_capacity(module.body.len());

    for item in module.body.iter_mut() {
        let kept = match source_of(item) {
            Some(src) => rewrite_source(src, resolver, from_dir, config, report)?,
            None => true,
        };
        keep.push(kept);
    }

    let mut keep = keep.into_iter();
    module.body.retain(|_| keep.next().unwrap_or(true));
    Ok(())
}

fn source_of(item: &mut ModuleItem) -> Option<&mut Str> {
    let ModuleItem::ModuleDecl(decl) = item else {
        return None;
    };
    match decl {
        ModuleDecl::Import(import) => Some(&mut *import.src),
        ModuleDecl::ExportAll(export) => Some(&mut *export.src),
        ModuleDecl::ExportNamed(export) => export.src.as_deref_mut(),
        _ => None,
    }
}

/// Returns whether the declaration owning `src` stays in the module.
fn rewrite_source<R: ModuleResolver + ?Sized>(
    src: &mut Str,
    resolver: &R,
    from_dir: &Path,
    config: &ResolveConfig,
    report: &mut TransformReport,
) -> Result<bool, TransformError> {
    let specifier = src.value.to_string();
    let resolved = resolver
        .resolve(&specifier, from_dir, config)
        .map_err(|source| TransformError::Resolve {
            specifier: specifier.clone(),
            source,
        })?;

    match resolved {
        Some(path) if config.is_javascript(&path) => {
            let value = SEPARATOR_RUNS
                .replace_all(&path.to_string_lossy(), "/")
                .into_owned();
            if value != specifier {
                debug!(from = %specifier, to = %value, "source rewritten");
                src.value = Atom::from(value);
                src.raw = None;
                report.rewritten_sources += 1;
            }
            Ok(true)
        }
        _ if config.remove_unresolved => {
            debug!(specifier = %specifier, "unresolved source removed");
            report.removed_sources.push(specifier);
            Ok(false)
        }
        _ => Ok(true),
    }
}
