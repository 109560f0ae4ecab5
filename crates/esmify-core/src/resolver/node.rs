//! Node-style resolution of import specifiers.
//!
//! Relative specifiers resolve against the importing directory, `/`-prefixed
//! ones against the project root, and bare ones through `node_modules`
//! directories found walking up from the importer to the root.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};

use super::fs::{FileSystem, OsFileSystem};
use super::{ModuleResolver, ResolveConfig, ResolveError};

const MANIFEST: &str = "package.json";

#[derive(Debug, Clone, Default)]
pub struct NodeResolver<F = OsFileSystem> {
    fs: F,
}

impl NodeResolver<OsFileSystem> {
    pub fn new() -> Self {
        Self { fs: OsFileSystem }
    }
}

impl<F: FileSystem> NodeResolver<F> {
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }

    fn resolve_package(
        &self,
        specifier: &str,
        from_dir: &Path,
        config: &ResolveConfig,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let root = normalize(&config.root);
        let from_dir = normalize(from_dir);

        for dir in from_dir.ancestors() {
            let candidate = dir.join("node_modules").join(specifier);
            if let Some(found) = self.resolve_target(&candidate, config)? {
                return Ok(Some(found));
            }
            if dir == root {
                break;
            }
        }

        Ok(None)
    }

    /// Tries `path` as a file first, then as a directory.
    fn resolve_target(
        &self,
        path: &Path,
        config: &ResolveConfig,
    ) -> Result<Option<PathBuf>, ResolveError> {
        if let Some(file) = self.resolve_file(path, config) {
            return Ok(Some(file));
        }
        self.resolve_directory(path, config)
    }

    fn resolve_file(&self, path: &Path, config: &ResolveConfig) -> Option<PathBuf> {
        if self.fs.is_file(path) {
            trace!(candidate = %path.display(), "file hit");
            return Some(path.to_path_buf());
        }

        config.extensions.iter().find_map(|ext| {
            let mut candidate = OsString::from(path.as_os_str());
            candidate.push(".");
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            trace!(candidate = %candidate.display(), "probing");
            self.fs.is_file(&candidate).then_some(candidate)
        })
    }

    fn resolve_index(&self, dir: &Path, config: &ResolveConfig) -> Option<PathBuf> {
        config.extensions.iter().find_map(|ext| {
            let candidate = dir.join(format!("{}.{}", config.index, ext));
            self.fs.is_file(&candidate).then_some(candidate)
        })
    }

    fn resolve_directory(
        &self,
        dir: &Path,
        config: &ResolveConfig,
    ) -> Result<Option<PathBuf>, ResolveError> {
        if !self.fs.is_dir(dir) {
            return Ok(None);
        }

        let manifest = dir.join(MANIFEST);
        if self.fs.is_file(&manifest) {
            if let Some(entry) = self.manifest_entry(&manifest, config)? {
                let target = normalize(&dir.join(entry));
                if let Some(found) = self.resolve_file(&target, config) {
                    return Ok(Some(found));
                }
                if let Some(found) = self.resolve_index(&target, config) {
                    return Ok(Some(found));
                }
                debug!(
                    manifest = %manifest.display(),
                    entry = %target.display(),
                    "package entry point not found on disk, using declared path"
                );
                return Ok(Some(target));
            }
        }

        Ok(self.resolve_index(dir, config))
    }

    fn manifest_entry(
        &self,
        manifest: &Path,
        config: &ResolveConfig,
    ) -> Result<Option<String>, ResolveError> {
        let content = match self.fs.read_to_string(manifest) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ResolveError::Io {
                    path: manifest.to_path_buf(),
                    source,
                });
            }
        };

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| ResolveError::InvalidManifest {
                path: manifest.to_path_buf(),
                source,
            })?;

        Ok(config.main_fields.iter().find_map(|field| {
            value
                .get(field)
                .and_then(|entry| entry.as_str())
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
        }))
    }
}

impl<F: FileSystem> ModuleResolver for NodeResolver<F> {
    fn resolve(
        &self,
        specifier: &str,
        from_dir: &Path,
        config: &ResolveConfig,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let found = if is_relative(specifier) {
            self.resolve_target(&normalize(&from_dir.join(specifier)), config)?
        } else if let Some(rest) = specifier.strip_prefix('/') {
            self.resolve_target(&normalize(&config.root.join(rest)), config)?
        } else {
            self.resolve_package(specifier, from_dir, config)?
        };

        match &found {
            Some(path) => debug!(specifier, resolved = %path.display(), "resolved"),
            None => debug!(specifier, from = %from_dir.display(), "unresolved"),
        }

        Ok(found.map(|path| rooted(&path, &config.root)))
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Resolves `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Renders `path` relative to `root` with a leading `/`, as a browser sees it.
fn rooted(path: &Path, root: &Path) -> PathBuf {
    match path.strip_prefix(normalize(root)) {
        Ok(relative) => Path::new("/").join(relative),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryFileSystem;

    fn resolver(files: &[(&str, &str)]) -> NodeResolver<MemoryFileSystem> {
        let fs = files
            .iter()
            .fold(MemoryFileSystem::new(), |fs, (path, content)| {
                fs.with_file(*path, *content)
            });
        NodeResolver::with_fs(fs)
    }

    fn resolve(resolver: &NodeResolver<MemoryFileSystem>, specifier: &str) -> Option<PathBuf> {
        resolver
            .resolve(specifier, Path::new("/client"), &ResolveConfig::default())
            .unwrap()
    }

    #[test]
    fn package_module_field_wins() {
        let resolver = resolver(&[(
            "/node_modules/foo/package.json",
            r#"{"module": "es/index.js", "main": "lib/index.js"}"#,
        )]);

        assert_eq!(
            resolve(&resolver, "foo"),
            Some(PathBuf::from("/node_modules/foo/es/index.js"))
        );
    }

    #[test]
    fn package_jsnext_main_field_is_honoured() {
        let resolver = resolver(&[(
            "/node_modules/foo/package.json",
            r#"{"jsnext:main": "es/index.js"}"#,
        )]);

        assert_eq!(
            resolve(&resolver, "foo"),
            Some(PathBuf::from("/node_modules/foo/es/index.js"))
        );
    }

    #[test]
    fn package_main_without_extension_is_probed() {
        let resolver = resolver(&[
            ("/node_modules/foo/package.json", r#"{"main": "dist/index"}"#),
            ("/node_modules/foo/dist/index.js", ""),
        ]);

        assert_eq!(
            resolve(&resolver, "foo"),
            Some(PathBuf::from("/node_modules/foo/dist/index.js"))
        );
    }

    #[test]
    fn package_without_entry_fields_uses_index() {
        let resolver = resolver(&[
            ("/node_modules/bar/package.json", r#"{"name": "bar"}"#),
            ("/node_modules/bar/index.js", ""),
        ]);

        assert_eq!(
            resolve(&resolver, "bar"),
            Some(PathBuf::from("/node_modules/bar/index.js"))
        );
    }

    #[test]
    fn scoped_file_resolves_with_and_without_extension() {
        let resolver = resolver(&[("/node_modules/@foo/foo.js", "console.log('cool')")]);

        let expected = Some(PathBuf::from("/node_modules/@foo/foo.js"));
        assert_eq!(resolve(&resolver, "@foo/foo.js"), expected);
        assert_eq!(resolve(&resolver, "@foo/foo"), expected);
    }

    #[test]
    fn relative_specifier_gets_extension() {
        let resolver = resolver(&[("/client/foo.js", "")]);

        assert_eq!(
            resolve(&resolver, "./foo"),
            Some(PathBuf::from("/client/foo.js"))
        );
    }

    #[test]
    fn parent_relative_specifier_is_normalized() {
        let resolver = resolver(&[("/shared/util.js", "")]);

        assert_eq!(
            resolve(&resolver, "../shared/util"),
            Some(PathBuf::from("/shared/util.js"))
        );
    }

    #[test]
    fn directory_index_is_used() {
        let resolver = resolver(&[("/client/foo/index.js", "")]);

        assert_eq!(
            resolve(&resolver, "./foo"),
            Some(PathBuf::from("/client/foo/index.js"))
        );
    }

    #[test]
    fn file_takes_priority_over_directory() {
        let resolver = resolver(&[("/client/foo.js", ""), ("/client/foo/index.js", "")]);

        assert_eq!(
            resolve(&resolver, "./foo"),
            Some(PathBuf::from("/client/foo.js"))
        );
    }

    #[test]
    fn root_absolute_specifier_resolves_against_root() {
        let resolver = resolver(&[("/srv/app/lib/a.js", "")]);
        let config = ResolveConfig::new("/srv/app");

        let found = resolver
            .resolve("/lib/a", Path::new("/srv/app/client"), &config)
            .unwrap();

        assert_eq!(found, Some(PathBuf::from("/lib/a.js")));
    }

    #[test]
    fn node_modules_lookup_walks_up_to_root() {
        let resolver = resolver(&[
            ("/srv/app/node_modules/foo/index.js", ""),
            ("/srv/node_modules/outside/index.js", ""),
        ]);
        let config = ResolveConfig::new("/srv/app");
        let from = Path::new("/srv/app/client/deep/nested");

        assert_eq!(
            resolver.resolve("foo", from, &config).unwrap(),
            Some(PathBuf::from("/node_modules/foo/index.js"))
        );
        assert_eq!(resolver.resolve("outside", from, &config).unwrap(), None);
    }

    #[test]
    fn nearest_node_modules_wins() {
        let resolver = resolver(&[
            ("/client/node_modules/foo/index.js", ""),
            ("/node_modules/foo/index.js", ""),
        ]);

        assert_eq!(
            resolve(&resolver, "foo"),
            Some(PathBuf::from("/client/node_modules/foo/index.js"))
        );
    }

    #[test]
    fn missing_module_is_unresolved() {
        let resolver = resolver(&[]);

        assert_eq!(resolve(&resolver, "./foo.less"), None);
        assert_eq!(resolve(&resolver, "redux"), None);
    }

    #[test]
    fn non_javascript_file_still_resolves() {
        let resolver = resolver(&[("/client/foo.less", "")]);

        assert_eq!(
            resolve(&resolver, "./foo.less"),
            Some(PathBuf::from("/client/foo.less"))
        );
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let resolver = resolver(&[("/node_modules/foo/package.json", "{ not json")]);

        let error = resolver
            .resolve("foo", Path::new("/client"), &ResolveConfig::default())
            .unwrap_err();

        assert!(matches!(error, ResolveError::InvalidManifest { .. }));
    }

    #[test]
    fn normalize_collapses_dot_segments() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
    }
}
