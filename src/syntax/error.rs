//! Grammar errors raised by the tokenizer.
//!
//! A `SyntaxError` is fatal to the stream that produced it: the decoder keeps
//! returning the same error on every later call.

use std::{io, sync::Arc};

use thiserror::Error;

/// A malformed line in a linebased script.
#[derive(Debug, Clone, Error)]
#[error("{line}: {message}")]
pub struct SyntaxError {
    /// Line number (1-indexed).
    pub line: usize,
    /// Message without the line prefix.
    pub message: String,
    /// Underlying read failure, if the error did not come from the grammar.
    #[source]
    pub source: Option<Arc<io::Error>>,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a read failure at `line`.
    pub fn io(line: usize, err: io::Error) -> Self {
        Self {
            line,
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }

    pub(crate) fn leading_whitespace(line: usize) -> Self {
        Self::new(line, "unexpected whitespace at start of line")
    }

    pub(crate) fn invalid_utf8(line: usize) -> Self {
        Self::new(line, "line is not valid UTF-8")
    }
}
