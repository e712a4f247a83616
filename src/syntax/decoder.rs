//! The line tokenizer.
//!
//! Turns raw script text into [`Expression`] records. It knows nothing about
//! templates or includes; those are layered on top by the expander.

use std::io::{self, BufRead};

use serde::Serialize;

use super::args::{parse_args, Args, Limit};
use super::error::SyntaxError;

// ============================================================================
// EXPRESSION
// ============================================================================

/// One command (with its continuation lines) or one blank line, together
/// with the comment lines immediately preceding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Expression {
    /// Line where the command or blank line starts (1-indexed). Comment lines
    /// before it do not count.
    pub line: usize,
    /// Raw `#` lines that preceded the expression.
    pub comment: String,
    /// First word of the command line; empty for a blank line.
    pub name: String,
    /// Everything after the name, continuation lines joined with `\n` and
    /// stripped of their leading tab. No trailing line terminator.
    pub body: String,
}

impl Expression {
    /// Splits the body into at most `limit` whitespace-separated arguments.
    pub fn args(&self, limit: impl Into<Limit>) -> Args {
        parse_args(&self.body, limit)
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty()
    }

    /// Reconstructs parseable source text: the name, the body separated by a
    /// single space (or starting on the next line when it did originally),
    /// continuation lines re-indented with a tab, and a final newline.
    pub fn to_source(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + self.body.len() + 2);
        out.push_str(&self.name);

        let tail = self.body.strip_suffix('\n').unwrap_or(&self.body);
        let tail = if tail.starts_with('\n') {
            tail
        } else {
            let tail = tail.trim_start();
            if !tail.is_empty() {
                out.push(' ');
            }
            tail
        };
        out.push_str(&tail.replace('\n', "\n\t"));
        out.push('\n');
        out
    }

    fn from_text(line: usize, comment: String, text: &str) -> Self {
        let text = text.strip_suffix('\n').unwrap_or(text);
        let (name, body) = split_name(text);
        Expression {
            line,
            comment,
            name: name.to_string(),
            body: body.to_string(),
        }
    }
}

/// Splits command text into the name and the tail after it.
fn split_name(text: &str) -> (&str, &str) {
    match text.find([' ', '\t', '\n']) {
        Some(i) => (
            text[..i].trim(),
            text[i..].trim_start_matches([' ', '\t']),
        ),
        None => (text.trim(), ""),
    }
}

// ============================================================================
// DECODER
// ============================================================================

/// Reads [`Expression`]s from a buffered reader.
///
/// `&[u8]` works directly; wrap files in a `BufReader`.
pub struct Decoder<R> {
    reader: R,
    /// Number of the line most recently read.
    line: usize,
    failed: Option<SyntaxError>,
}

impl<R: BufRead> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            failed: None,
        }
    }

    /// Returns the next expression, `Ok(None)` at end of input, or the
    /// grammar error that ended the stream.
    pub fn decode(&mut self) -> Result<Option<Expression>, SyntaxError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let result = self.decode_inner();
        if let Err(err) = &result {
            self.failed = Some(err.clone());
        }
        result
    }

    fn decode_inner(&mut self) -> Result<Option<Expression>, SyntaxError> {
        let mut comment = String::new();

        loop {
            let line = self.read_line()?;
            let Some(first) = line.bytes().next() else {
                // End of input. Trailing comments still surface, as a blank
                // expression; without a final newline they stay on their line.
                if comment.is_empty() {
                    return Ok(None);
                }
                let line = if comment.ends_with('\n') {
                    self.line
                } else {
                    self.line - 1
                };
                return Ok(Some(Expression {
                    line,
                    comment,
                    ..Expression::default()
                }));
            };

            match first {
                b'\n' => {
                    return Ok(Some(Expression {
                        line: self.line,
                        comment,
                        ..Expression::default()
                    }))
                }
                b'#' => comment.push_str(&line),
                b' ' | b'\t' => return Err(SyntaxError::leading_whitespace(self.line)),
                _ => {
                    let start = self.line;
                    let mut text = line;
                    while self.peek()? == Some(b'\t') {
                        let continuation = self.read_line()?;
                        text.push_str(&continuation[1..]);
                    }
                    return Ok(Some(Expression::from_text(start, comment, &text)));
                }
            }
        }
    }

    /// Reads one line including its terminator. Empty at end of input.
    fn read_line(&mut self) -> Result<String, SyntaxError> {
        self.line += 1;
        let mut buf = Vec::new();
        self.reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| SyntaxError::io(self.line, e))?;
        String::from_utf8(buf).map_err(|_| SyntaxError::invalid_utf8(self.line))
    }

    fn peek(&mut self) -> Result<Option<u8>, SyntaxError> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SyntaxError::io(self.line, e)),
            }
        }
    }
}

impl<R: BufRead> Iterator for Decoder<R> {
    type Item = Result<Expression, SyntaxError>;

    /// Yields expressions until end of input. A grammar error is yielded once
    /// and ends the iteration.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed.is_some() {
            return None;
        }
        self.decode().transpose()
    }
}

/// Tokenizes a whole string.
pub fn parse_str(text: &str) -> Result<Vec<Expression>, SyntaxError> {
    Decoder::new(text.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(exprs: &[Expression]) -> Vec<String> {
        exprs
            .iter()
            .map(|e| format!("line={} name={:?} comment={:?}", e.line, e.name, e.comment))
            .collect()
    }

    #[test]
    fn command_with_comments() {
        let exprs = parse_str("# first\n# second\ncmd tail\n").unwrap();
        assert_eq!(
            summary(&exprs),
            vec![r##"line=3 name="cmd" comment="# first\n# second\n""##]
        );
        assert_eq!(exprs[0].body, "tail");
    }

    #[test]
    fn blank_line_with_comment() {
        let exprs = parse_str("# heading\n\n").unwrap();
        assert_eq!(summary(&exprs), vec![r##"line=2 name="" comment="# heading\n""##]);
        assert!(exprs[0].body.is_empty());
    }

    #[test]
    fn multiple_expressions() {
        let input = "# first\none tail\ntwo tail\n# third\n# comment\nthree tail\n";
        let exprs = parse_str(input).unwrap();
        assert_eq!(
            summary(&exprs),
            vec![
                r##"line=2 name="one" comment="# first\n""##.to_string(),
                r#"line=3 name="two" comment="""#.to_string(),
                r##"line=6 name="three" comment="# third\n# comment\n""##.to_string(),
            ]
        );
    }

    #[test]
    fn continuation_lines_join_without_tabs() {
        let exprs = parse_str("sql query users\n\tSELECT id\n\tFROM users\nnext\n").unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[0].name, "sql");
        assert_eq!(exprs[0].body, "query users\nSELECT id\nFROM users");
        assert_eq!(exprs[1].line, 4);
        assert_eq!(exprs[1].name, "next");
    }

    #[test]
    fn body_on_following_lines_keeps_leading_newline() {
        let exprs = parse_str("check\n\thello\n").unwrap();
        assert_eq!(exprs[0].body, "\nhello");
        assert_eq!(exprs[0].to_source(), "check\n\thello\n");
    }

    #[test]
    fn command_without_tail_has_empty_body() {
        let exprs = parse_str("greet\n").unwrap();
        assert_eq!(exprs[0].name, "greet");
        assert_eq!(exprs[0].body, "");
    }

    #[test]
    fn leading_space_is_fatal_and_sticky() {
        let mut dec = Decoder::new(" foo\nbar\n".as_bytes());
        let err = dec.decode().unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.message, "unexpected whitespace at start of line");
        let again = dec.decode().unwrap_err();
        assert_eq!(again.line, 1);
    }

    #[test]
    fn tab_after_blank_line_is_fatal() {
        let err = parse_str("cmd\n\n\tstray\n").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn trailing_comment_without_newline() {
        let exprs = parse_str("cmd\n# tail").unwrap();
        assert_eq!(exprs.len(), 2);
        assert_eq!(exprs[1].line, 2);
        assert_eq!(exprs[1].comment, "# tail");
        assert!(exprs[1].is_blank());
    }

    #[test]
    fn trailing_comment_with_newline() {
        let exprs = parse_str("# only\n").unwrap();
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].line, 2);
    }

    #[test]
    fn last_line_without_newline() {
        let exprs = parse_str("echo hi\n\tthere").unwrap();
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].body, "hi\nthere");
    }

    #[test]
    fn invalid_utf8_is_a_syntax_error() {
        let err = Decoder::new(&b"ok\n\xff\xfe\n"[..])
            .collect::<Result<Vec<_>, _>>()
            .unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut dec = Decoder::new("a\n b\n".as_bytes());
        assert!(matches!(dec.next(), Some(Ok(_))));
        assert!(matches!(dec.next(), Some(Err(_))));
        assert!(dec.next().is_none());
    }

    #[test]
    fn to_source_cases() {
        let cases = [
            ("cmd", "arg1 arg2\n", "cmd arg1 arg2\n"),
            ("cmd", "arg1\targ2\n", "cmd arg1\targ2\n"),
            ("cmd", "\narg1 arg2\n", "cmd\n\targ1 arg2\n"),
            ("", "arg1 arg2\n", " arg1 arg2\n"),
            ("cmd", "", "cmd\n"),
            ("cmd", "arg1", "cmd arg1\n"),
            ("cmd", "\narg1", "cmd\n\targ1\n"),
            ("cmd", "\targ1", "cmd arg1\n"),
            ("sql", "query\nSELECT 1", "sql query\n\tSELECT 1\n"),
            ("define", "greet name\n\n\techo $name", "define greet name\n\t\n\t\techo $name\n"),
        ];
        for (name, body, want) in cases {
            let expr = Expression {
                name: name.to_string(),
                body: body.to_string(),
                ..Expression::default()
            };
            assert_eq!(expr.to_source(), want, "to_source({name:?}, {body:?})");
        }
    }

    #[test]
    fn to_source_reparses_to_same_expression() {
        let original = parse_str("cmd   spaced   out\n\tmore\n").unwrap();
        let reparsed = parse_str(&original[0].to_source()).unwrap();
        assert_eq!(reparsed[0].name, original[0].name);
        assert_eq!(reparsed[0].body, original[0].body);
    }
}
