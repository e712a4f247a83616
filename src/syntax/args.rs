//! Whitespace argument splitting.
//!
//! There is no quoting: arguments are separated by runs of whitespace and the
//! final argument keeps whatever text remains, newlines included.

use std::ops::Deref;

/// Arguments extracted from an expression body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(pub Vec<String>);

impl Args {
    /// Returns the `i`-th argument with any trailing newline removed, or the
    /// empty string when `i` is out of bounds.
    pub fn at(&self, i: usize) -> &str {
        self.0
            .get(i)
            .map(|arg| arg.strip_suffix('\n').unwrap_or(arg))
            .unwrap_or("")
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for Args {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for Args {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Args(iter.into_iter().map(Into::into).collect())
    }
}

/// How many arguments to split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// Split every field.
    Unlimited,
    /// Split at most this many; the last one absorbs the remainder.
    AtMost(usize),
}

impl From<usize> for Limit {
    fn from(n: usize) -> Self {
        Limit::AtMost(n)
    }
}

/// Slices `s` around its first run of whitespace, returning the text before
/// and after the run. Leading whitespace is skipped.
pub fn cut_field(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

/// Splits `s` into at most `limit` whitespace-separated arguments.
///
/// Returns no arguments when the limit is zero or `s` is empty.
pub fn parse_args(s: &str, limit: impl Into<Limit>) -> Args {
    let mut remaining = match limit.into() {
        Limit::AtMost(0) => return Args::default(),
        Limit::AtMost(n) => Some(n),
        Limit::Unlimited => None,
    };

    let mut args = Vec::new();
    let mut s = s;
    while !s.is_empty() {
        if remaining == Some(1) {
            args.push(s.to_string());
            break;
        }
        let (arg, rest) = cut_field(s);
        args.push(arg.to_string());
        s = rest;
        remaining = remaining.map(|n| n - 1);
    }
    Args(args)
}

/// Splits `s` into two arguments; the second keeps the remaining text.
pub fn parse_args2(s: &str) -> (String, String) {
    let args = parse_args(s, 2);
    (args.at(0).to_string(), args.at(1).to_string())
}

/// Splits `s` into three arguments; the third keeps the remaining text.
pub fn parse_args3(s: &str) -> (String, String, String) {
    let args = parse_args(s, 3);
    (
        args.at(0).to_string(),
        args.at(1).to_string(),
        args.at(2).to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_field_cases() {
        let cases = [
            ("hello world", "hello", "world"),
            ("hello\tworld", "hello", "world"),
            ("hello   world", "hello", "world"),
            ("hello", "hello", ""),
            ("", "", ""),
            ("   ", "", ""),
            ("\t\t\t", "", ""),
            (" \t \n ", "", ""),
            ("   hello world", "hello", "world"),
            ("hello world   ", "hello", "world   "),
            ("cmd   ", "cmd", ""),
            ("hello world\nmore", "hello", "world\nmore"),
            ("cmd arg1\narg2\n", "cmd", "arg1\narg2\n"),
            ("hello\u{00A0}world", "hello", "world"),
            (" \t hello \t world \n more ", "hello", "world \n more "),
            ("\u{2000}\u{2001}\u{2002}", "", ""),
            // zero-width characters are not whitespace
            ("\u{200B}\u{200C}\u{200D}", "\u{200B}\u{200C}\u{200D}", ""),
        ];
        for (input, name, tail) in cases {
            assert_eq!(cut_field(input), (name, tail), "cut_field({input:?})");
        }
    }

    #[test]
    fn parse_args_limits() {
        let cases: &[(Limit, &str, &[&str])] = &[
            (Limit::Unlimited, "", &[]),
            (Limit::AtMost(0), "", &[]),
            (Limit::AtMost(1), "", &[]),
            (Limit::Unlimited, "arg1 arg2", &["arg1", "arg2"]),
            (Limit::AtMost(0), "arg1 arg2", &[]),
            (Limit::AtMost(1), "arg1 arg2", &["arg1 arg2"]),
            (Limit::AtMost(2), "arg1 arg2", &["arg1", "arg2"]),
            (Limit::AtMost(3), "arg1 arg2", &["arg1", "arg2"]),
            (Limit::AtMost(1), "arg1\targ2", &["arg1\targ2"]),
            (Limit::AtMost(1), "arg1 arg2\t\t\t", &["arg1 arg2\t\t\t"]),
            (Limit::AtMost(2), "arg1 arg2\t\t\t", &["arg1", "arg2\t\t\t"]),
            (Limit::AtMost(3), "arg1 arg2\t\t\t", &["arg1", "arg2"]),
            (Limit::AtMost(2), "arg1\n\targ2", &["arg1", "arg2"]),
        ];
        for (limit, input, want) in cases {
            let got = parse_args(input, *limit);
            let want: Args = want.iter().copied().collect();
            assert_eq!(got, want, "parse_args({input:?}, {limit:?})");
        }
    }

    #[test]
    fn at_trims_newline_and_bounds() {
        let args: Args = ["one", "two\n"].into_iter().collect();
        assert_eq!(args.at(0), "one");
        assert_eq!(args.at(1), "two");
        assert_eq!(args.at(2), "");
    }

    #[test]
    fn fixed_arity_helpers() {
        assert_eq!(
            parse_args2("key some value"),
            ("key".to_string(), "some value".to_string())
        );
        assert_eq!(
            parse_args3("a b"),
            ("a".to_string(), "b".to_string(), String::new())
        );
    }
}
