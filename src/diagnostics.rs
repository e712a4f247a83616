//! `miette` integration for expansion errors.
//!
//! Every [`ExpressionError`] carries a stable code of the form
//! `linebased::<kind>` and, where there is something useful to say, a help
//! line. [`report`] attaches the offending expression as source text so the
//! graphical handler can point at it.

use std::fmt;

use miette::{Diagnostic, LabeledSpan, NamedSource, Report};

use crate::macros::{ErrorType, ExpandError, ExpressionError};

impl Diagnostic for ExpressionError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("linebased::{}", self.cause.kind())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        help_for(&self.cause).map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let name = self.expr.name();
        if name.is_empty() {
            return None;
        }
        let label = LabeledSpan::new_with_span(Some(label_for(self.error_type())), 0..name.len());
        Some(Box::new(std::iter::once(label)))
    }
}

fn label_for(kind: ErrorType) -> String {
    match kind {
        ErrorType::Grammar => "malformed line",
        ErrorType::Definition => "bad definition",
        ErrorType::Invocation => "in this call",
        ErrorType::Include => "bad include",
        ErrorType::Io => "could not open",
    }
    .to_string()
}

fn help_for(cause: &ExpandError) -> Option<String> {
    let help = match cause {
        ExpandError::Syntax { .. } => {
            "continuation lines start with exactly one tab and must follow a command".to_string()
        }
        ExpandError::InvalidTemplateName { .. } => {
            "template names may not contain whitespace or control characters".to_string()
        }
        ExpandError::Redefined { name, .. } => {
            format!("templates are global; rename one of the definitions of {name:?}")
        }
        ExpandError::ArgumentCount { expected, .. } => format!(
            "the last of the {expected} argument(s) absorbs any remaining text; supply at least {expected}"
        ),
        ExpandError::UnknownParameter { .. } => {
            "references must name a parameter listed on the define line".to_string()
        }
        ExpandError::Recursion { .. } => {
            "a template may not call itself, directly or through other templates".to_string()
        }
        ExpandError::IncludeExtension { path, extension } => {
            format!("write {:?}", path.strip_suffix(extension.as_str()).unwrap_or(path))
        }
        ExpandError::IncludeSeparator { .. } => {
            "all includes resolve against the script root".to_string()
        }
        _ => return None,
    };
    Some(help)
}

/// Wraps `err` in a [`Report`] with the offending expression as source.
pub fn report(err: &ExpressionError) -> Report {
    let source = NamedSource::new(err.location(), err.expr.to_source());
    Report::new(err.clone()).with_source_code(source)
}

/// Prints `err` to stderr with full diagnostics.
pub fn print_error(err: &ExpressionError) {
    eprintln!("{:?}", report(err));
}
