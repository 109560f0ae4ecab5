//! Configuration loading and parsing for esmify
//!
//! Provides functionality to load and parse `esmify.toml` configuration files.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::resolver::ResolveConfig;

pub const CONFIG_FILENAME: &str = "esmify.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["root", "remove_unresolved", "resolve"];
const KNOWN_RESOLVE_KEYS: &[&str] = &["extensions", "main_fields", "index"];

/// Written by `esmify init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# Project root; resolved import paths are rooted here.
root = "."

# Remove imports that do not resolve to a JavaScript file.
remove_unresolved = true

[resolve]
extensions = ["js", "mjs", "cjs"]
main_fields = ["module", "jsnext:main", "main"]
index = "index"
"#;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub root: Option<PathBuf>,
    pub remove_unresolved: bool,
    pub resolve: ResolveSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            remove_unresolved: true,
            resolve: ResolveSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolveSection {
    pub extensions: Vec<String>,
    pub main_fields: Vec<String>,
    pub index: String,
}

impl Default for ResolveSection {
    fn default() -> Self {
        let defaults = ResolveConfig::default();
        Self {
            extensions: defaults.extensions,
            main_fields: defaults.main_fields,
            index: defaults.index,
        }
    }
}

impl Config {
    /// Builds resolver settings; a relative `root` is taken relative to `base_dir`,
    /// a missing one means `base_dir` itself.
    pub fn resolve_config(&self, base_dir: &Path) -> ResolveConfig {
        let root = match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base_dir.join(root),
            None => base_dir.to_path_buf(),
        };

        ResolveConfig {
            root,
            remove_unresolved: self.remove_unresolved,
            extensions: self
                .resolve
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
            main_fields: self.resolve.main_fields.clone(),
            index: self.resolve.index.clone(),
        }
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_warnings(path).map(|result| result.config)
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;

    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    if let Some(toml::Value::Table(resolve)) = table.get("resolve") {
        let known_resolve: HashSet<&str> = KNOWN_RESOLVE_KEYS.iter().copied().collect();
        for key in resolve.keys() {
            if !known_resolve.contains(key.as_str()) {
                warnings.push(format!("Unknown config option in [resolve]: '{}'", key));
            }
        }
    }

    warnings
}
