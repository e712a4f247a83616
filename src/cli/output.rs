//! Handles all user-facing output for the CLI.
//!
//! Every printer writes to a [`WriteColor`] so commands can target a colored
//! terminal or an in-memory buffer alike.

use std::io::{self, Write};

use termcolor::{Color, ColorSpec, WriteColor};

use crate::analysis::{Definition, Issue};
use crate::macros::{format_stack, Expanded, ExpressionError};

// ============================================================================
// EXPANSION OUTPUT
// ============================================================================

/// Writes one expanded expression as source text or as a JSON line.
pub fn write_expanded(out: &mut dyn WriteColor, expr: &Expanded, json: bool) -> io::Result<()> {
    if json {
        let line = serde_json::to_string(expr)?;
        return writeln!(out, "{line}");
    }
    write!(out, "{}", expr.to_source())
}

/// Writes `LOCATION> SOURCE` for an expression, followed by its call chain
/// from the innermost caller outward.
pub fn write_trace(out: &mut dyn WriteColor, expr: &Expanded) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    write!(out, "{}", expr.location())?;
    out.reset()?;
    write!(out, "> {}", expr.to_source())?;

    let callers: Vec<Expanded> = expr.stack.iter().rev().cloned().collect();
    if !callers.is_empty() {
        out.set_color(ColorSpec::new().set_dimmed(true))?;
        write!(out, "{}", format_stack("    from ", &callers))?;
        out.reset()?;
    }
    Ok(())
}

// ============================================================================
// CHECK OUTPUT
// ============================================================================

/// Writes a PASS or FAIL line for one script.
pub fn write_check_result(
    out: &mut dyn WriteColor,
    name: &str,
    result: &Result<usize, ExpressionError>,
) -> io::Result<()> {
    match result {
        Ok(count) => {
            write_tag(out, "PASS", Color::Green)?;
            writeln!(out, " {name} ({count} expressions)")
        }
        Err(err) => {
            write_tag(out, "FAIL", Color::Red)?;
            writeln!(out, " {name}")?;
            for line in err.to_string().lines() {
                writeln!(out, "    {line}")?;
            }
            Ok(())
        }
    }
}

pub fn write_summary(out: &mut dyn WriteColor, passed: usize, failed: usize) -> io::Result<()> {
    let color = if failed == 0 { Color::Green } else { Color::Red };
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    writeln!(out, "{passed} passed, {failed} failed")?;
    out.reset()
}

// ============================================================================
// ANALYSIS OUTPUT
// ============================================================================

pub fn write_issue(out: &mut dyn WriteColor, file: &str, issue: &Issue) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    write!(out, "{}:{}", file, issue.line)?;
    out.reset()?;
    writeln!(out, ": {}", issue.message)
}

/// Writes a definition header and its doc comment.
pub fn write_definition(out: &mut dyn WriteColor, def: &Definition) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    write!(out, "{}", def.name)?;
    out.reset()?;
    for param in &def.params {
        write!(out, " {param}")?;
    }
    writeln!(out, "  ({}:{})", def.file, def.line)?;
    for line in def.doc.lines() {
        writeln!(out, "    {line}")?;
    }
    Ok(())
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn write_tag(out: &mut dyn WriteColor, tag: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{tag}")?;
    out.reset()
}
