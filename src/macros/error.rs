//! Errors raised while expanding a script.
//!
//! [`ExpandError`] says what went wrong; [`ExpressionError`] pins it to the
//! expression that caused it. Both are `Clone` so a failed expander can hand
//! out the same error on every later call.

use std::{io, sync::Arc};

use thiserror::Error;

use crate::macros::types::Expanded;
use crate::syntax::{Expression, SyntaxError};

/// The cause of an expansion failure.
#[derive(Debug, Clone, Error)]
pub enum ExpandError {
    #[error("{message}")]
    Syntax {
        message: String,
        #[source]
        source: Option<Arc<io::Error>>,
    },

    // ------------------------------------------------------------------------
    // define
    // ------------------------------------------------------------------------
    #[error("define: missing name argument")]
    MissingTemplateName,

    #[error("define: name contains invalid characters: {name:?}")]
    InvalidTemplateName { name: String },

    #[error("template {name:?} redefined; previous define: {previous}")]
    Redefined { name: String, previous: String },

    // ------------------------------------------------------------------------
    // template calls
    // ------------------------------------------------------------------------
    #[error("template {name:?} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown parameter reference: {name:?}")]
    UnknownParameter { name: String },

    #[error("expansion of {template:?} contains illegal nested define: {text:?}")]
    NestedDefine { template: String, text: String },

    #[error("recursion detected in template {name}:\n{trace}")]
    Recursion { name: String, trace: String },

    // ------------------------------------------------------------------------
    // include
    // ------------------------------------------------------------------------
    #[error("include: missing filename")]
    MissingIncludePath,

    #[error("include: expects exactly one filename, got {count} arguments")]
    IncludeArguments { count: usize },

    #[error("include: path {path:?} contains '/'; only root-level includes are allowed")]
    IncludeSeparator { path: String },

    #[error(
        "include: path {path:?} has {extension} extension; the extension is not required and will be added automatically"
    )]
    IncludeExtension { path: String, extension: String },

    #[error("include cycle detected: {}", .chain.join(" -> "))]
    IncludeCycle { chain: Vec<String> },

    #[error("open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },
}

/// Broad classes of [`ExpandError`], used for diagnostic codes and by tools
/// that only care what kind of thing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    Grammar,
    Definition,
    Invocation,
    Include,
    Io,
}

impl ExpandError {
    pub fn error_type(&self) -> ErrorType {
        match self {
            ExpandError::Syntax { .. } => ErrorType::Grammar,
            ExpandError::MissingTemplateName
            | ExpandError::InvalidTemplateName { .. }
            | ExpandError::Redefined { .. } => ErrorType::Definition,
            ExpandError::ArgumentCount { .. }
            | ExpandError::UnknownParameter { .. }
            | ExpandError::NestedDefine { .. }
            | ExpandError::Recursion { .. } => ErrorType::Invocation,
            ExpandError::MissingIncludePath
            | ExpandError::IncludeArguments { .. }
            | ExpandError::IncludeSeparator { .. }
            | ExpandError::IncludeExtension { .. }
            | ExpandError::IncludeCycle { .. } => ErrorType::Include,
            ExpandError::Open { .. } => ErrorType::Io,
        }
    }

    /// Short snake_case name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ExpandError::Syntax { .. } => "syntax",
            ExpandError::MissingTemplateName => "missing_template_name",
            ExpandError::InvalidTemplateName { .. } => "invalid_template_name",
            ExpandError::Redefined { .. } => "redefined",
            ExpandError::ArgumentCount { .. } => "argument_count",
            ExpandError::UnknownParameter { .. } => "unknown_parameter",
            ExpandError::NestedDefine { .. } => "nested_define",
            ExpandError::Recursion { .. } => "recursion",
            ExpandError::MissingIncludePath => "missing_include_path",
            ExpandError::IncludeArguments { .. } => "include_arguments",
            ExpandError::IncludeSeparator { .. } => "include_separator",
            ExpandError::IncludeExtension { .. } => "include_extension",
            ExpandError::IncludeCycle { .. } => "include_cycle",
            ExpandError::Open { .. } => "open",
        }
    }

    /// The underlying I/O error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            ExpandError::Open { source, .. } => Some(source),
            ExpandError::Syntax {
                source: Some(source),
                ..
            } => Some(source),
            _ => None,
        }
    }
}

impl From<SyntaxError> for ExpandError {
    fn from(err: SyntaxError) -> Self {
        ExpandError::Syntax {
            message: err.message,
            source: err.source,
        }
    }
}

/// An [`ExpandError`] located at the expression that triggered it.
///
/// Displays as `LOCATION: CAUSE`, where LOCATION is
/// [`Expanded::error_location`].
#[derive(Debug, Clone, Error)]
#[error("{}: {}", .expr.error_location(), .cause)]
pub struct ExpressionError {
    pub expr: Expanded,
    pub cause: ExpandError,
}

impl ExpressionError {
    pub fn new(expr: Expanded, cause: ExpandError) -> Self {
        Self { expr, cause }
    }

    /// A grammar error read from `file`.
    pub(crate) fn syntax(file: impl Into<String>, err: SyntaxError) -> Self {
        let expr = Expanded::new(
            Expression {
                line: err.line,
                ..Expression::default()
            },
            file,
        );
        Self::new(expr, err.into())
    }

    pub fn cause(&self) -> &ExpandError {
        &self.cause
    }

    pub fn location(&self) -> String {
        self.expr.error_location()
    }

    pub fn error_type(&self) -> ErrorType {
        self.cause.error_type()
    }
}
