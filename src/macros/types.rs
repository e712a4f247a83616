//! Core data types for template expansion.

use std::fmt;

use serde::Serialize;

use crate::macros::error::ExpandError;
use crate::syntax::{cut_field, Expression};

// ============================================================================
// EXPANDED
// ============================================================================

/// An [`Expression`] together with where it came from: the file it was read
/// from and the chain of template calls that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Expanded {
    #[serde(flatten)]
    pub expr: Expression,
    /// Display path of the source file.
    pub file: String,
    /// Active template calls, outermost first. Empty at top level.
    pub stack: Vec<Expanded>,
}

impl Expanded {
    pub fn new(expr: Expression, file: impl Into<String>) -> Self {
        Self {
            expr,
            file: file.into(),
            stack: Vec::new(),
        }
    }

    /// An expression with nothing but a location, used to pin errors that
    /// have no parsed expression of their own.
    pub(crate) fn at(file: impl Into<String>, line: usize) -> Self {
        Self::new(
            Expression {
                line,
                ..Expression::default()
            },
            file,
        )
    }

    pub fn line(&self) -> usize {
        self.expr.line
    }

    pub fn name(&self) -> &str {
        &self.expr.name
    }

    pub fn body(&self) -> &str {
        &self.expr.body
    }

    pub fn comment(&self) -> &str {
        &self.expr.comment
    }

    /// Reconstructs parseable source text for the expression.
    pub fn to_source(&self) -> String {
        self.expr.to_source()
    }

    /// The template call that produced this expression, or `None` at top
    /// level.
    pub fn caller(&self) -> Option<&Expanded> {
        self.stack.last()
    }

    /// Where the expression appears and executes, as
    /// `FILE:LINE: TEMPLATE@LOCALLINE`.
    ///
    /// Inside an expansion LINE is the line of the outermost call and
    /// TEMPLATE is the immediate caller; at top level TEMPLATE is `main`.
    pub fn location(&self) -> String {
        let file = if self.file.is_empty() {
            "<unknown>"
        } else {
            &self.file
        };
        match (self.stack.first(), self.stack.last()) {
            (Some(bottom), Some(caller)) => format!(
                "{}:{}: {}@{}",
                file,
                bottom.line(),
                caller.name(),
                self.line()
            ),
            _ => format!("{}:{}: main@{}", file, self.line(), self.line()),
        }
    }

    /// Location prefix for error messages. Top-level expressions drop the
    /// `main@LINE` suffix, and a zero line drops the line entirely.
    pub fn error_location(&self) -> String {
        if !self.stack.is_empty() {
            return self.location();
        }
        let file = if self.file.is_empty() {
            "<unknown>"
        } else {
            &self.file
        };
        if self.line() == 0 {
            file.to_string()
        } else {
            format!("{}:{}", file, self.line())
        }
    }
}

impl fmt::Display for Expanded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

/// Renders one `PREFIX LOCATION> SOURCE` line per frame.
pub fn format_stack(prefix: &str, frames: &[Expanded]) -> String {
    let mut out = String::new();
    for frame in frames {
        out.push_str(prefix);
        out.push_str(&frame.location());
        out.push_str("> ");
        out.push_str(&frame.to_source());
    }
    out
}

/// Writes [`format_stack`] output to `w`.
pub fn write_stack<W: fmt::Write>(w: &mut W, prefix: &str, frames: &[Expanded]) -> fmt::Result {
    w.write_str(&format_stack(prefix, frames))
}

// ============================================================================
// TEMPLATE
// ============================================================================

/// A template registered by `define`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    /// Positional parameter names. Duplicates are accepted; lookups resolve
    /// to the last one.
    pub params: Vec<String>,
    /// Raw, unexpanded text of the continuation lines, each ending in `\n`.
    pub body: String,
    /// The `define` expression itself.
    pub source: Expanded,
}

impl Template {
    /// Parses a `define` expression: the header names the template and its
    /// parameters, the continuation lines form the body.
    pub fn parse(decl: &Expanded) -> Result<Self, ExpandError> {
        debug_assert_eq!(decl.name(), "define");
        let (head, body) = split_define(decl.body());
        let (name, rest) = cut_field(head);

        if name.is_empty() {
            return Err(ExpandError::MissingTemplateName);
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ExpandError::InvalidTemplateName {
                name: name.to_string(),
            });
        }

        Ok(Template {
            name: name.to_string(),
            params: rest.split_whitespace().map(str::to_string).collect(),
            body,
            source: decl.clone(),
        })
    }

    /// Defining file.
    pub fn file(&self) -> &str {
        &self.source.file
    }

    /// Line of the `define`.
    pub fn line(&self) -> usize {
        self.source.line()
    }

    /// Position of parameter `name`, favoring the last duplicate.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().rposition(|p| p == name)
    }
}

/// Splits a `define` body into its header line and the template text.
///
/// The expression body drops the terminator of its last line, so one is
/// restored here: a trailing blank continuation line then still reads as a
/// blank expression.
pub(crate) fn split_define(body: &str) -> (&str, String) {
    match body.split_once('\n') {
        Some((head, rest)) => (head, format!("{rest}\n")),
        None => (body, String::new()),
    }
}
