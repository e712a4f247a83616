// Script runner: expands every tests/scripts/*.lb that has a matching
// .expected file and compares the output. Files starting with `_` are
// include fixtures and are not run on their own.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use walkdir::WalkDir;

use linebased::{DirFs, ExpandOptions, ExpandingDecoder};

const SCRIPTS: &str = "tests/scripts";

fn find_test_scripts(dir: &str) -> Vec<(String, PathBuf)> {
    let mut tests = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !path.is_file() || name.starts_with('_') || !name.ends_with(".lb") {
            continue;
        }
        let expected = path.with_extension("expected");
        if expected.exists() {
            tests.push((name, expected));
        }
    }
    tests
}

fn read_file_trimmed(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?
        .replace("\r\n", "\n")
        .trim()
        .to_string())
}

/// Expanded source text, followed by the error message if expansion failed.
fn run_script(name: &str) -> String {
    let options = ExpandOptions {
        extension: Some(".lb".to_string()),
        ..ExpandOptions::default()
    };
    let mut output = String::new();
    for expr in ExpandingDecoder::with_options(name, DirFs::new(SCRIPTS), options) {
        match expr {
            Ok(expr) => output.push_str(&expr.to_source()),
            Err(err) => {
                output.push_str(&err.to_string());
                output.push('\n');
            }
        }
    }
    output.trim().to_string()
}

fn print_diff(out: &mut StandardStream, expected: &str, actual: &str) {
    let changes = Changeset::new(expected, actual, "\n");
    for diff in &changes.diffs {
        let (sign, color, text) = match diff {
            Difference::Same(text) => (' ', None, text),
            Difference::Rem(text) => ('-', Some(Color::Red), text),
            Difference::Add(text) => ('+', Some(Color::Green), text),
        };
        let _ = out.set_color(ColorSpec::new().set_fg(color));
        for line in text.lines() {
            let _ = writeln!(out, "  {sign} {line}");
        }
    }
    let _ = out.reset();
}

#[test]
fn integration_scripts() {
    let scripts = find_test_scripts(SCRIPTS);
    assert!(!scripts.is_empty(), "No .lb test scripts found in {SCRIPTS}/");

    let mut failed = Vec::new();
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    for (name, expected) in scripts {
        let expected_output = read_file_trimmed(&expected).expect("Failed to read expected output");
        let actual_output = run_script(&name);

        if actual_output == expected_output {
            let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
            let _ = writeln!(stdout, "PASS: {name}");
        } else {
            let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
            let _ = writeln!(stdout, "FAIL: {name}");
            print_diff(&mut stdout, &expected_output, &actual_output);
            failed.push(name);
        }
        let _ = stdout.reset();
    }

    assert!(failed.is_empty(), "Scripts failed: {failed:?}");
}
