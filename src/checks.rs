//! Assertions for script-driven tests.
//!
//! A check compares a value produced by whatever runs the script against an
//! expected value named in the script, e.g. `body contains Welcome` or
//! `/user/name == "Alice"`.

use regex::Regex;
use serde_json::Value;

use crate::macros::Expanded;
use crate::syntax::parse_args3;

/// Result of a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    /// The comparison did not hold.
    Fail(String),
    /// The check itself is malformed.
    Invalid(String),
}

impl CheckOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, CheckOutcome::Pass)
    }

    /// The failure or validation message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            CheckOutcome::Pass => None,
            CheckOutcome::Fail(msg) | CheckOutcome::Invalid(msg) => Some(msg),
        }
    }
}

/// Compares `got` with `want` under `op`, naming the value `what` in
/// failure messages.
///
/// Operators: `==`, `!=`, `~` and `!~` (regular expression), `contains` and
/// `!contains`.
pub fn check_text(what: &str, op: &str, got: &str, want: &str) -> CheckOutcome {
    let regex = match op {
        "~" | "!~" => match Regex::new(want) {
            Ok(re) => Some(re),
            Err(err) => {
                return CheckOutcome::Invalid(format!(
                    "error compiling regex {}: {}",
                    quote(want),
                    err
                ))
            }
        },
        _ if want.is_empty() => {
            return CheckOutcome::Invalid(
                "non-regex comparison requires non-empty want value".to_string(),
            )
        }
        _ => None,
    };

    let failure = match (op, regex) {
        ("==", _) => (got != want).then(|| format!("{what} = {}, want {}", quote(got), quote(want))),
        ("!=", _) => (got == want).then(|| format!("{what} == {} (but should not)", quote(want))),
        ("~", Some(re)) => (!re.is_match(got)).then(|| {
            format!(
                "{what} does not match {} (but should)\t{}",
                quote(want),
                indent_text(got)
            )
        }),
        ("!~", Some(re)) => re.is_match(got).then(|| {
            format!(
                "{what} matches {} (but should not)\t{}",
                quote(want),
                indent_text(got)
            )
        }),
        ("contains", _) => (!got.contains(want)).then(|| {
            format!(
                "{what} does not contain {} (but should)\t{}",
                quote(want),
                indent_text(got)
            )
        }),
        ("!contains", _) => got.contains(want).then(|| {
            format!(
                "{what} contains {} (but should not)\t{}",
                quote(want),
                indent_text(got)
            )
        }),
        _ => return CheckOutcome::Invalid(format!("unknown operator {op:?}")),
    };

    match failure {
        Some(msg) => CheckOutcome::Fail(msg),
        None => CheckOutcome::Pass,
    }
}

/// Checks a JSON document at the RFC 6901 pointer named in `expr`'s body,
/// which reads `POINTER OP WANT`.
///
/// Values compare as compact JSON text, so strings keep their quotes. A
/// pointer that resolves to nothing yields `undefined`.
pub fn check_json(expr: &Expanded, body: &str) -> CheckOutcome {
    let (pointer, op, want) = parse_args3(expr.body());

    let probe = check_text(&pointer, &op, "_", &want);
    if let CheckOutcome::Invalid(_) = probe {
        return probe;
    }

    let doc: Value = match serde_json::from_str(body) {
        Ok(doc) => doc,
        Err(err) => return CheckOutcome::Invalid(format!("error parsing JSON: {err}")),
    };

    let target = if pointer == "/" { "" } else { pointer.as_str() };
    let got = match doc.pointer(target) {
        Some(value) => value.to_string(),
        None => "undefined".to_string(),
    };
    check_text(&pointer, &op, &got, &want)
}

/// Formats text for a failure message: continuation lines are tab-indented
/// and empty text gets a placeholder.
pub fn indent_text(text: &str) -> String {
    match text {
        "" => "(empty)".to_string(),
        "\n" => "(blank line)".to_string(),
        _ => match text.trim_end_matches('\n') {
            "" => "(blank lines)".to_string(),
            trimmed => trimmed.replace('\n', "\n\t"),
        },
    }
}

/// Backquotes `s` when it can be shown raw, otherwise falls back to a
/// debug-quoted string.
fn quote(s: &str) -> String {
    if s.contains('`') || s.chars().any(|c| c.is_control() && c != '\t') {
        format!("{s:?}")
    } else {
        format!("`{s}`")
    }
}
