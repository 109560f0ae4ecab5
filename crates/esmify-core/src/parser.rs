//! Parser module for JavaScript source code
//!
//! Integrates with SWC for parsing source files into a module AST. Comments are
//! collected alongside the tree so the printer can emit them again.

use swc_common::comments::SingleThreadedComments;
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_parser::{EsSyntax, Syntax, parse_file_as_module};
use tracing::debug;

pub use swc_ecma_ast::{EsVersion, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    Jsx,
}

pub fn detect_language(filename: &str) -> Language {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "jsx" => Language::Jsx,
        _ => Language::JavaScript,
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub span_lo: u32,
    pub span_hi: u32,
    pub message: String,
}

/// A parsed module together with the source map and comments it was read with.
///
/// The transform mutates `module` in place; the printer needs the other two
/// to reproduce literals and comments of the untouched parts.
pub struct ParsedModule {
    pub module: Module,
    pub source_map: Lrc<SourceMap>,
    pub comments: SingleThreadedComments,
    filename: String,
}

impl std::fmt::Debug for ParsedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedModule")
            .field("filename", &self.filename)
            .field("item_count", &self.module.body.len())
            .finish()
    }
}

impl ParsedModule {
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    jsx: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jsx(mut self, enabled: bool) -> Self {
        self.jsx = enabled;
        self
    }

    pub fn build(self) -> Parser {
        Parser {
            syntax: Syntax::Es(EsSyntax {
                jsx: self.jsx,
                ..Default::default()
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Es(Default::default()),
        }
    }

    pub fn for_file(filename: &str) -> Self {
        match detect_language(filename) {
            Language::JavaScript => Self::new(),
            Language::Jsx => Self::builder().jsx(true).build(),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    /// Parses `code` as an ES module.
    ///
    /// CommonJS sources are frequently sloppy-mode scripts, so errors the
    /// parser recovers from (strict mode violations and the like) are logged
    /// and ignored. Only a fatal error fails the parse.
    pub fn parse_module(&self, filename: &str, code: &str) -> Result<ParsedModule, ParseError> {
        let source_map: Lrc<SourceMap> = Default::default();
        let comments = SingleThreadedComments::default();
        let fm = source_map.new_source_file(
            FileName::Custom(filename.to_string()).into(),
            code.to_string(),
        );

        let mut recovered_errors = Vec::new();
        let result = parse_file_as_module(
            &fm,
            self.syntax,
            EsVersion::latest(),
            Some(&comments),
            &mut recovered_errors,
        );

        for error in &recovered_errors {
            debug!(
                file = filename,
                "recovered parse error: {}",
                error.kind().msg()
            );
        }

        let module = result.map_err(|e| {
            let span = e.span();
            let loc = source_map.lookup_char_pos(span.lo);
            ParseError {
                line: loc.line,
                column: loc.col_display,
                span_lo: span.lo.0,
                span_hi: span.hi.0,
                message: e.kind().msg().to_string(),
            }
        })?;

        Ok(ParsedModule {
            module,
            source_map,
            comments,
            filename: filename.to_string(),
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
