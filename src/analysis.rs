//! Editor-style analysis of a single script.
//!
//! Unlike the expander, analysis never fails as a whole: it collects what it
//! can from the document and the files it includes and reports problems as
//! [`Issue`]s. Missing includes and include cycles are ignored.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use tracing::debug;

use crate::macros::types::split_define;
use crate::macros::{ExpandOptions, ExpandingDecoder, ExpressionError};
use crate::source::{FileSystem, MemFs};
use crate::syntax::{cut_field, parse_args, Decoder, Expression};

/// A template definition found during analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub name: String,
    pub params: Vec<String>,
    /// Raw template body, each line ending in `\n`.
    pub body: String,
    /// The comment above the `define`, with `#` markers and surrounding
    /// blank lines removed.
    pub doc: String,
    /// Line of the `define` (1-indexed).
    pub line: usize,
    /// File the definition appears in.
    pub file: String,
}

impl Definition {
    /// The `define` expression this definition was read from, minus its
    /// comment.
    pub fn to_source(&self) -> String {
        let mut header = self.name.clone();
        for param in &self.params {
            header.push(' ');
            header.push_str(param);
        }
        let body = if self.body.is_empty() {
            header
        } else {
            format!("{header}\n{}", self.body)
        };
        Expression {
            name: "define".to_string(),
            body,
            ..Expression::default()
        }
        .to_source()
    }
}

/// A problem found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub line: usize,
    pub message: String,
}

/// A character range on one line. Lines count from 1, columns count
/// characters from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    fn new(line: usize, start: usize, len: usize) -> Self {
        Self {
            line,
            start,
            end: start + len,
        }
    }

    fn contains(&self, line: usize, column: usize) -> bool {
        self.line == line && (self.start..self.end).contains(&column)
    }
}

/// A use or declaration of a template name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub file: String,
    pub span: Span,
}

/// One expression of the analyzed document.
#[derive(Debug, Clone)]
struct Entry {
    expr: Expression,
    /// For `define`, the template name.
    defines: Option<String>,
}

/// An analyzed script.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    entries: Vec<Entry>,
    definitions: HashMap<String, Definition>,
    issues: Vec<Issue>,
}

impl Document {
    /// Analyzes `text` as the contents of `name`, resolving includes in `fs`.
    pub fn parse<F: FileSystem>(name: &str, text: &str, fs: &F, options: &ExpandOptions) -> Self {
        let mut doc = Document {
            name: name.to_string(),
            entries: Vec::new(),
            definitions: HashMap::new(),
            issues: Vec::new(),
        };

        let mut seen = HashSet::new();
        let mut scan = Scan {
            fs,
            options,
            seen: &mut seen,
            doc: &mut doc,
        };
        scan.file(name, text, true);
        doc.check_calls();
        debug!(
            file = %name,
            definitions = doc.definitions.len(),
            issues = doc.issues.len(),
            "analyzed document"
        );
        doc
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expressions of the document itself, in order.
    pub fn expressions(&self) -> impl Iterator<Item = &Expression> {
        self.entries.iter().map(|e| &e.expr)
    }

    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    /// All known definitions, sorted by name.
    pub fn definitions(&self) -> Vec<&Definition> {
        let mut defs: Vec<&Definition> = self.definitions.values().collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Problems in the document, in line order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Every call of `name` in the document, including calls made from
    /// template bodies. With `include_declaration`, the name on its
    /// `define` line too, even when that line is in an included file.
    pub fn references(&self, name: &str, include_declaration: bool) -> Vec<Reference> {
        let mut refs = Vec::new();
        let width = name.chars().count();
        let here = |span: Span| Reference {
            file: self.name.clone(),
            span,
        };

        if include_declaration {
            if let Some(def) = self.definitions.get(name).filter(|d| d.file != self.name) {
                refs.push(Reference {
                    file: def.file.clone(),
                    span: Span::new(def.line, "define ".len(), width),
                });
            }
        }

        for entry in &self.entries {
            if entry.expr.name == name {
                refs.push(here(Span::new(entry.expr.line, 0, width)));
            }
            let Some(defined) = &entry.defines else {
                continue;
            };
            if include_declaration && defined == name {
                refs.push(here(Span::new(entry.expr.line, "define ".len(), width)));
            }
            refs.extend(
                body_calls(&entry.expr)
                    .filter(|(_, call)| call == name)
                    .map(|(line, _)| here(Span::new(line, 1, width))),
            );
        }
        refs
    }

    /// The name under a cursor: a command, the name in a `define` line, or
    /// a call inside a template body.
    pub fn symbol_at(&self, line: usize, column: usize) -> Option<(String, Span)> {
        for entry in &self.entries {
            let name = entry.expr.name.as_str();
            if entry.expr.line == line {
                let span = Span::new(line, 0, name.chars().count());
                if span.contains(line, column) {
                    return Some((name.to_string(), span));
                }
                if let Some(defined) = &entry.defines {
                    let span = Span::new(line, name.chars().count() + 1, defined.chars().count());
                    if span.contains(line, column) {
                        return Some((defined.clone(), span));
                    }
                }
            }
            if entry.defines.is_some() {
                for (call_line, call) in body_calls(&entry.expr) {
                    let span = Span::new(call_line, 1, call.chars().count());
                    if span.contains(line, column) {
                        return Some((call, span));
                    }
                }
            }
        }
        None
    }

    /// Expands a single call of `name` with argument text `args` against the
    /// known definitions, returning the resulting source text.
    pub fn preview(&self, name: &str, args: &str) -> Result<String, ExpressionError> {
        let mut script = String::new();
        for def in self.definitions() {
            script.push_str(&def.to_source());
        }
        let call = Expression {
            name: name.to_string(),
            body: args.to_string(),
            ..Expression::default()
        };
        script.push_str(&call.to_source());

        let fs = MemFs::new().with("preview", script);
        let options = ExpandOptions {
            extension: None,
            ..ExpandOptions::default()
        };
        let mut out = String::new();
        for expr in ExpandingDecoder::with_options("preview", fs, options) {
            out.push_str(&expr?.to_source());
        }
        Ok(out)
    }

    fn check_calls(&mut self) {
        for entry in &self.entries {
            let expr = &entry.expr;
            if matches!(expr.name.as_str(), "" | "define" | "include") {
                continue;
            }
            let Some(def) = self.definitions.get(&expr.name) else {
                continue;
            };

            if def.file == self.name && def.line > expr.line {
                self.issues.push(Issue {
                    line: expr.line,
                    message: format!(
                        "template {:?} used before definition on line {}",
                        expr.name, def.line
                    ),
                });
                continue;
            }

            let expected = def.params.len();
            let supplied = parse_args(&expr.body, expected + 1)
                .iter()
                .filter(|arg| !arg.trim().is_empty())
                .count();
            if supplied < expected {
                self.issues.push(Issue {
                    line: expr.line,
                    message: format!(
                        "{} requires {} argument(s), got {}",
                        expr.name, expected, supplied
                    ),
                });
            }
        }
        self.issues.sort_by_key(|issue| issue.line);
    }
}

/// Walks a file and its includes, filling in a [`Document`].
struct Scan<'a, F> {
    fs: &'a F,
    options: &'a ExpandOptions,
    seen: &'a mut HashSet<String>,
    doc: &'a mut Document,
}

impl<F: FileSystem> Scan<'_, F> {
    fn file(&mut self, file: &str, text: &str, is_document: bool) {
        if !self.seen.insert(file.to_string()) {
            return;
        }

        for result in Decoder::new(text.as_bytes()) {
            let expr = match result {
                Ok(expr) => expr,
                Err(err) => {
                    if is_document {
                        self.doc.issues.push(Issue {
                            line: err.line,
                            message: err.message,
                        });
                    }
                    break;
                }
            };

            match expr.name.as_str() {
                "define" => self.define(file, &expr),
                "include" => {
                    let path = expr.body.lines().next().unwrap_or("").trim();
                    if !path.is_empty() {
                        self.include(path);
                    }
                }
                _ => {}
            }

            if is_document {
                let defines = (expr.name == "define")
                    .then(|| define_header(&expr).0.to_string())
                    .filter(|name| !name.is_empty());
                self.doc.entries.push(Entry { expr, defines });
            }
        }
    }

    fn define(&mut self, file: &str, expr: &Expression) {
        let (name, params) = define_header(expr);
        if name.is_empty() || self.doc.definitions.contains_key(name) {
            return;
        }
        let (_, body) = split_define(&expr.body);
        self.doc.definitions.insert(
            name.to_string(),
            Definition {
                name: name.to_string(),
                params: params.split_whitespace().map(str::to_string).collect(),
                body,
                doc: format_comment(&expr.comment),
                line: expr.line,
                file: file.to_string(),
            },
        );
    }

    fn include(&mut self, path: &str) {
        let file = format!("{}{}", path, self.options.extension.as_deref().unwrap_or(""));
        let mut text = String::new();
        let read = self
            .fs
            .open(&file)
            .and_then(|mut reader| reader.read_to_string(&mut text));
        if let Err(err) = read {
            debug!(file = %file, error = %err, "skipping unreadable include");
            return;
        }
        self.file(&file, &text, false);
    }
}

/// Splits a `define` body's first line into the template name and the
/// parameter text.
fn define_header(expr: &Expression) -> (&str, &str) {
    let head = expr.body.split('\n').next().unwrap_or("");
    cut_field(head)
}

/// Template calls inside a `define` body, with their physical line numbers.
fn body_calls(define: &Expression) -> impl Iterator<Item = (usize, String)> + '_ {
    let body = define.body.split_once('\n').map_or("", |(_, body)| body);
    Decoder::new(body.as_bytes())
        .map_while(Result::ok)
        .filter(|expr| !expr.is_blank())
        .map(move |expr| (define.line + expr.line, expr.name))
}

/// Strips `#` markers from a comment block and trims blank edge lines.
fn format_comment(comment: &str) -> String {
    let lines: Vec<&str> = comment
        .strip_suffix('\n')
        .unwrap_or(comment)
        .split('\n')
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('#').unwrap_or(line).trim()
        })
        .collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_comment_strips_markers() {
        assert_eq!(
            format_comment("# Greets someone.\n#\n# Usage: greet NAME\n"),
            "Greets someone.\n\nUsage: greet NAME"
        );
        assert_eq!(format_comment("## Heading\n"), "# Heading");
        assert_eq!(format_comment("#\n# only\n#\n"), "only");
        assert_eq!(format_comment(""), "");
    }

    #[test]
    fn body_calls_map_to_physical_lines() {
        let expr = crate::syntax::parse_str("define outer\n\tinner a\n\t\n\tinner b\n")
            .unwrap()
            .remove(0);
        let calls: Vec<_> = body_calls(&expr).collect();
        assert_eq!(calls, vec![(2, "inner".to_string()), (4, "inner".to_string())]);
    }

    #[test]
    fn span_contains() {
        let span = Span::new(3, 2, 4);
        assert!(span.contains(3, 2));
        assert!(span.contains(3, 5));
        assert!(!span.contains(3, 6));
        assert!(!span.contains(2, 3));
    }

    #[test]
    fn definition_source_round_trips() {
        let def = Definition {
            name: "greet".into(),
            params: vec!["name".into()],
            body: "echo $name\n".into(),
            doc: String::new(),
            line: 1,
            file: "main.lb".into(),
        };
        assert_eq!(def.to_source(), "define greet name\n\techo $name\n");
    }
}
