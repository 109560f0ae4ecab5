//! Turns a (possibly rewritten) module back into JavaScript text.

use std::cell::RefCell;
use std::rc::Rc;

use swc_common::comments::SingleThreadedComments;
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_codegen::{Config, Emitter};

use crate::parser::{EsVersion, ParsedModule};

#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("failed to emit module: {0}")]
    Emit(#[from] std::io::Error),
    #[error("emitted code is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Prints `parsed` with its comments.
///
/// The code generator consumes comments as it writes them, so it works on a
/// copy and the module can be printed any number of times.
pub fn print_module(parsed: &ParsedModule) -> Result<String, PrintError> {
    let comments = snapshot_comments(&parsed.comments);
    let mut buf = Vec::new();

    {
        let mut emitter = Emitter {
            cfg: Config::default().with_target(EsVersion::latest()),
            cm: parsed.source_map.clone(),
            comments: Some(&comments),
            wr: JsWriter::new(parsed.source_map.clone(), "\n", &mut buf, None),
        };
        emitter.emit_module(&parsed.module)?;
    }

    Ok(String::from_utf8(buf)?)
}

fn snapshot_comments(comments: &SingleThreadedComments) -> SingleThreadedComments {
    let (leading, trailing) = comments.borrow_all();
    SingleThreadedComments::from_leading_and_trailing(
        Rc::new(RefCell::new((*leading).clone())),
        Rc::new(RefCell::new((*trailing).clone())),
    )
}
