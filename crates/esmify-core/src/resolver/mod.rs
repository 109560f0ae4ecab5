//! Module specifier resolution
//!
//! The transform only needs [`ModuleResolver`]; [`NodeResolver`] is the
//! Node-style implementation used by the CLI, generic over a [`FileSystem`]
//! so tests can run against [`MemoryFileSystem`].

pub mod fs;
pub mod node;

use std::path::{Path, PathBuf};

pub use fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use node::NodeResolver;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid package manifest {path}: {source}")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings shared by resolution and the source rewriter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Resolved paths are rendered relative to this directory, with a leading `/`.
    pub root: PathBuf,
    /// Drop imports that do not resolve to a JavaScript file.
    pub remove_unresolved: bool,
    /// Extensions probed in order; also the set considered JavaScript.
    pub extensions: Vec<String>,
    /// `package.json` fields naming a package entry point, in priority order.
    pub main_fields: Vec<String>,
    /// Basename of a directory's entry file.
    pub index: String,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            remove_unresolved: true,
            extensions: vec!["js".to_string(), "mjs".to_string(), "cjs".to_string()],
            main_fields: vec![
                "module".to_string(),
                "jsnext:main".to_string(),
                "main".to_string(),
            ],
            index: "index".to_string(),
        }
    }
}

impl ResolveConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_remove_unresolved(mut self, remove_unresolved: bool) -> Self {
        self.remove_unresolved = remove_unresolved;
        self
    }

    /// Whether `path` names a JavaScript file, judged by its extension.
    pub fn is_javascript(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}

pub trait ModuleResolver {
    /// Resolves `specifier` as imported from a module living in `from_dir`.
    ///
    /// `Ok(None)` means the specifier does not resolve; errors are reserved
    /// for faults such as unreadable files or malformed manifests.
    fn resolve(
        &self,
        specifier: &str,
        from_dir: &Path,
        config: &ResolveConfig,
    ) -> Result<Option<PathBuf>, ResolveError>;
}

impl<R: ModuleResolver + ?Sized> ModuleResolver for &R {
    fn resolve(
        &self,
        specifier: &str,
        from_dir: &Path,
        config: &ResolveConfig,
    ) -> Result<Option<PathBuf>, ResolveError> {
        (**self).resolve(specifier, from_dir, config)
    }
}
