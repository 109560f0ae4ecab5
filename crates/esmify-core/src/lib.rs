//! Rewrites CommonJS modules into ES modules.
//!
//! The usual entry point is [`transform_source`], which parses, rewrites
//! and prints one module:
//!
//! ```no_run
//! use esmify_core::resolver::{NodeResolver, ResolveConfig};
//!
//! let config = ResolveConfig::new("/srv/app");
//! let output = esmify_core::transform_source(
//!     "/srv/app/client/main.js",
//!     "var lib = require('lib');\nmodule.exports = lib.wrap();\n",
//!     &NodeResolver::new(),
//!     &config,
//! )?;
//! # Ok::<(), esmify_core::Error>(())
//! ```
//!
//! Callers that want the [`TransformReport`] or their own parsing drive
//! [`parser`], [`transform::transform`] and [`printer`] directly.

pub mod config;
pub mod parser;
pub mod printer;
pub mod resolver;
pub mod semantic;
pub mod transform;

use std::path::Path;

use parser::{ParseError, Parser};
use printer::{PrintError, print_module};
use resolver::{ModuleResolver, ResolveConfig};
pub use transform::{TransformError, TransformOptions, TransformReport, transform};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Transform(#[from] TransformError),
    #[error("print error: {0}")]
    Print(#[from] PrintError),
}

/// Transforms the module at `filename` and returns the printed result.
pub fn transform_source<R: ModuleResolver + ?Sized>(
    filename: &str,
    source: &str,
    resolver: &R,
    config: &ResolveConfig,
) -> Result<String, Error> {
    transform_source_with_report(filename, source, resolver, config).map(|(code, _)| code)
}

/// Like [`transform_source`], also returning what was rewritten.
pub fn transform_source_with_report<R: ModuleResolver + ?Sized>(
    filename: &str,
    source: &str,
    resolver: &R,
    config: &ResolveConfig,
) -> Result<(String, TransformReport), Error> {
    let mut parsed = Parser::for_file(filename).parse_module(filename, source)?;
    let options = TransformOptions::new(Path::new(filename), config);
    let report = transform(&mut parsed, resolver, &options)?;
    let code = print_module(&parsed)?;
    Ok((code, report))
}
