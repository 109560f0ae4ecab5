//! Transform command - rewrites CommonJS sources into ES modules

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use esmify_core::config::{Config, find_config_file, load_config_with_warnings};
use esmify_core::resolver::{NodeResolver, ResolveConfig};
use esmify_core::{TransformReport, transform_source_with_report};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

#[derive(Args, Debug)]
pub struct TransformArgs {
    /// File or directory to transform
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Write results under this directory instead of printing to stdout
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Project root that resolved import paths are relative to
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Keep imports that do not resolve to a JavaScript file
    #[arg(long)]
    pub keep_unresolved: bool,

    /// Print what was rewritten in each file as JSON on stderr
    #[arg(long)]
    pub report: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    #[serde(flatten)]
    report: &'a TransformReport,
}

impl TransformArgs {
    pub fn run(&self) -> Result<()> {
        self.configure_colors();

        let path = fs::canonicalize(&self.path)
            .with_context(|| format!("Path does not exist: {}", self.path.display()))?;
        let config = self.resolve_config(&path)?;
        let resolver = NodeResolver::new();

        if path.is_file() {
            let (code, report) = transform_file(&path, &resolver, &config)?;
            match &self.out {
                Some(out) => {
                    let name = path
                        .file_name()
                        .with_context(|| format!("Not a file: {}", path.display()))?;
                    fs::create_dir_all(out)?;
                    fs::write(out.join(name), code)?;
                }
                None => print!("{code}"),
            }
            if self.report {
                print_report(&path, &report)?;
            }
            return Ok(());
        }

        let Some(out) = &self.out else {
            anyhow::bail!("--out is required when transforming a directory");
        };
        fs::create_dir_all(out)?;
        let out = fs::canonicalize(out)?;

        let files = discover_files(&path, &out);
        let results: Vec<(PathBuf, Result<TransformReport>)> = files
            .par_iter()
            .map(|file| {
                let result = transform_into(file, &path, &out, &resolver, &config);
                (file.clone(), result)
            })
            .collect();

        let mut failures = 0;
        for (file, result) in &results {
            match result {
                Ok(report) if self.report => print_report(file, report)?,
                Ok(_) => {}
                Err(err) => {
                    failures += 1;
                    eprintln!("{} {:#}", "error:".red().bold(), err);
                }
            }
        }

        if failures > 0 {
            anyhow::bail!("{} of {} files failed to transform", failures, results.len());
        }

        println!(
            "{} Transformed {} files into {}",
            "✓".green().bold(),
            results.len(),
            out.display().to_string().cyan()
        );
        Ok(())
    }

    /// Settings from the nearest esmify.toml, overridden by flags.
    fn resolve_config(&self, path: &Path) -> Result<ResolveConfig> {
        let start = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };

        let cwd = std::env::current_dir()?;
        let (mut config, base_dir) = match find_config_file(start) {
            Some(config_path) => {
                debug!(config = %config_path.display(), "using config file");
                let result = load_config_with_warnings(&config_path)?;
                for warning in &result.warnings {
                    eprintln!("{} {}", "warning:".yellow().bold(), warning);
                }
                let base_dir = config_path.parent().unwrap_or(&cwd).to_path_buf();
                (result.config, base_dir)
            }
            None => (Config::default(), cwd.clone()),
        };

        if let Some(root) = &self.root {
            config.root = Some(cwd.join(root));
        }
        if self.keep_unresolved {
            config.remove_unresolved = false;
        }

        let mut resolve = config.resolve_config(&base_dir);
        if let Ok(root) = fs::canonicalize(&resolve.root) {
            resolve.root = root;
        }
        Ok(resolve)
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }
}

fn transform_file(
    path: &Path,
    resolver: &NodeResolver,
    config: &ResolveConfig,
) -> Result<(String, TransformReport)> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    transform_source_with_report(&path.to_string_lossy(), &source, resolver, config)
        .with_context(|| format!("Failed to transform {}", path.display()))
}

/// Transforms `file` and writes it to the same relative location under `out`.
fn transform_into(
    file: &Path,
    input_dir: &Path,
    out: &Path,
    resolver: &NodeResolver,
    config: &ResolveConfig,
) -> Result<TransformReport> {
    let (code, report) = transform_file(file, resolver, config)?;
    let relative = file.strip_prefix(input_dir).unwrap_or(file);
    let target = out.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&target, code).with_context(|| format!("Failed to write {}", target.display()))?;
    if report.is_unchanged() {
        debug!(file = %file.display(), "no CommonJS found");
    }
    Ok(report)
}

fn print_report(file: &Path, report: &TransformReport) -> Result<()> {
    let line = serde_json::to_string(&FileReport {
        file: file.display().to_string(),
        report,
    })?;
    eprintln!("{line}");
    Ok(())
}

fn discover_files(dir: &Path, out: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| !is_hidden(e) && e.path() != out)
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_file(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect()
}

fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn args(path: &Path) -> TransformArgs {
        TransformArgs {
            path: path.to_path_buf(),
            out: None,
            root: None,
            keep_unresolved: false,
            report: false,
            no_color: true,
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn discover_files_finds_javascript_sources() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("a.js"), "");
        write(&dir.path().join("lib/b.cjs"), "");
        write(&dir.path().join("view.jsx"), "");
        write(&dir.path().join("readme.md"), "");
        write(&dir.path().join(".cache/c.js"), "");

        let mut files = discover_files(dir.path(), &dir.path().join("dist"));
        files.sort();

        assert_eq!(
            files,
            vec![
                dir.path().join("a.js"),
                dir.path().join("lib/b.cjs"),
                dir.path().join("view.jsx"),
            ]
        );
    }

    #[test]
    fn discover_files_skips_output_directory() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("src.js"), "");
        write(&dir.path().join("dist/src.js"), "");

        let files = discover_files(dir.path(), &dir.path().join("dist"));

        assert_eq!(files, vec![dir.path().join("src.js")]);
    }

    #[test]
    fn is_supported_file_checks_extension() {
        assert!(is_supported_file(Path::new("a.js")));
        assert!(is_supported_file(Path::new("a.mjs")));
        assert!(!is_supported_file(Path::new("a.ts")));
        assert!(!is_supported_file(Path::new("a.less")));
    }

    #[test]
    #[serial]
    fn config_file_and_flags_are_combined() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        write(
            &root.join(esmify_core::config::CONFIG_FILENAME),
            "root = \".\"\n[resolve]\nextensions = [\"js\"]\n",
        );
        write(&root.join("client/app.js"), "");

        let mut transform = args(&root.join("client/app.js"));
        transform.keep_unresolved = true;
        let config = transform.resolve_config(&root.join("client/app.js")).unwrap();

        assert_eq!(config.root, root);
        assert_eq!(config.extensions, vec!["js"]);
        assert!(!config.remove_unresolved);
    }

    #[test]
    #[serial]
    fn directory_is_transformed_into_output() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        write(&root.join("esmify.toml"), "root = \".\"\n");
        write(
            &root.join("client/app.js"),
            "var util = require('./util');\nmodule.exports = util.run();\n",
        );
        write(&root.join("client/util.js"), "exports.run = function () {};\n");
        let out = root.join("dist");

        let mut transform = args(&root.join("client"));
        transform.out = Some(out.clone());
        transform.run().unwrap();

        let app = fs::read_to_string(out.join("app.js")).unwrap();
        assert!(app.contains("import util from \"/client/util.js\";"));
        assert!(app.contains("export default util.run();"));

        let util = fs::read_to_string(out.join("util.js")).unwrap();
        assert!(util.contains("const exports = module.exports;"));
        assert!(util.contains("export default module.exports;"));
    }

    #[test]
    #[serial]
    fn directory_without_output_is_rejected() {
        let dir = tempdir().unwrap();

        let err = args(dir.path()).run().unwrap_err();

        assert!(err.to_string().contains("--out"));
    }

    #[test]
    #[serial]
    fn single_file_is_written_to_output() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        write(&root.join("lib/index.js"), "require('./setup');\n");
        write(&root.join("lib/setup.js"), "");

        let mut transform = args(&root.join("lib/index.js"));
        transform.root = Some(root.clone());
        transform.out = Some(root.join("out"));
        transform.run().unwrap();

        let output = fs::read_to_string(root.join("out/index.js")).unwrap();
        assert!(output.contains("import \"/lib/setup.js\";"));
    }

    #[test]
    #[serial]
    fn parse_failures_are_reported() {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        write(&root.join("broken.js"), "var = ;");

        let mut transform = args(&root.join("broken.js"));
        transform.root = Some(root.clone());

        let err = transform.run().unwrap_err();

        assert!(format!("{err:#}").contains("Failed to transform"));
    }
}
