//! The `linebased` command-line interface.
//!
//! Dispatches subcommands to the library and renders their results. Script
//! names are resolved against `--dir`, the same way includes are.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use termcolor::{ColorChoice, StandardStream, WriteColor};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::analysis::Document;
use crate::cli::args::{Command, GlobalArgs, LinebasedArgs};
use crate::diagnostics;
use crate::macros::{ExpandOptions, ExpandingDecoder, ExpressionError};
use crate::source::{DirFs, FileSystem};

pub mod args;
pub mod output;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "LINEBASED_LOG";

/// Failures that end a command early.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Expand(#[from] ExpressionError),

    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Whether a command found problems in its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Problems,
}

/// The main entry point for the CLI.
pub fn run() {
    let args = LinebasedArgs::parse();
    init_tracing(args.global.verbose);

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    match execute(&args, &mut stdout) {
        Ok(Outcome::Clean) => {}
        Ok(Outcome::Problems) => process::exit(1),
        Err(CliError::Expand(err)) => {
            diagnostics::print_error(&err);
            process::exit(1);
        }
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Runs one parsed command, writing its output to `out`.
pub fn execute(args: &LinebasedArgs, out: &mut dyn WriteColor) -> Result<Outcome, CliError> {
    let global = &args.global;
    match &args.command {
        Command::Expand { file, json } => handle_expand(global, file, *json, out),
        Command::Trace { file } => handle_trace(global, file, out),
        Command::Check { path } => handle_check(global, path, out),
        Command::Lint { file } => handle_lint(global, file, out),
        Command::Templates { file } => handle_templates(global, file, out),
    }
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn handle_expand(
    global: &GlobalArgs,
    file: &str,
    json: bool,
    out: &mut dyn WriteColor,
) -> Result<Outcome, CliError> {
    let fs = DirFs::new(&global.dir);
    for expr in ExpandingDecoder::with_options(file, fs, global.options()) {
        output::write_expanded(out, &expr?, json)?;
    }
    Ok(Outcome::Clean)
}

fn handle_trace(
    global: &GlobalArgs,
    file: &str,
    out: &mut dyn WriteColor,
) -> Result<Outcome, CliError> {
    let fs = DirFs::new(&global.dir);
    for expr in ExpandingDecoder::with_options(file, fs, global.options()) {
        let expr = expr?;
        if expr.expr.is_blank() {
            continue;
        }
        output::write_trace(out, &expr)?;
    }
    Ok(Outcome::Clean)
}

fn handle_check(
    global: &GlobalArgs,
    path: &Path,
    out: &mut dyn WriteColor,
) -> Result<Outcome, CliError> {
    let dir = global.dir.join(path);
    let mut options = global.options();
    if options.root.is_empty() {
        options.root = dir.display().to_string();
    }

    let scripts = discover_scripts(&dir, options.extension.as_deref())?;
    info!(dir = %dir.display(), count = scripts.len(), "checking scripts");

    let (mut passed, mut failed) = (0, 0);
    for name in &scripts {
        let result = expand_all(name, DirFs::new(&dir), options.clone());
        if result.is_ok() {
            passed += 1;
        } else {
            failed += 1;
        }
        output::write_check_result(out, name, &result)?;
    }
    output::write_summary(out, passed, failed)?;

    Ok(if failed == 0 {
        Outcome::Clean
    } else {
        Outcome::Problems
    })
}

fn handle_lint(
    global: &GlobalArgs,
    file: &str,
    out: &mut dyn WriteColor,
) -> Result<Outcome, CliError> {
    let (fs, doc) = analyze(global, file)?;
    debug!(file = %fs.root().join(file).display(), "linting");

    let shown = global.options().display_path(file);
    for issue in doc.issues() {
        output::write_issue(out, &shown, issue)?;
    }
    Ok(if doc.issues().is_empty() {
        Outcome::Clean
    } else {
        Outcome::Problems
    })
}

fn handle_templates(
    global: &GlobalArgs,
    file: &str,
    out: &mut dyn WriteColor,
) -> Result<Outcome, CliError> {
    let (_, doc) = analyze(global, file)?;
    for def in doc.definitions() {
        output::write_definition(out, def)?;
    }
    Ok(Outcome::Clean)
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn analyze(global: &GlobalArgs, file: &str) -> Result<(DirFs, Document), CliError> {
    let fs = DirFs::new(&global.dir);
    let mut text = String::new();
    fs.open(file)
        .and_then(|mut reader| reader.read_to_string(&mut text))
        .map_err(|source| CliError::Read {
            path: file.to_string(),
            source,
        })?;
    let doc = Document::parse(file, &text, &fs, &global.options());
    Ok((fs, doc))
}

/// Expands `name` to the end, returning the number of non-blank
/// expressions produced.
pub fn expand_all<F: FileSystem>(
    name: &str,
    fs: F,
    options: ExpandOptions,
) -> Result<usize, ExpressionError> {
    let mut count = 0;
    for expr in ExpandingDecoder::with_options(name, fs, options) {
        if !expr?.expr.is_blank() {
            count += 1;
        }
    }
    Ok(count)
}

/// Script files under `dir` as `/`-separated paths relative to it, sorted.
/// With no extension every file counts.
pub fn discover_scripts(dir: &Path, extension: Option<&str>) -> Result<Vec<String>, CliError> {
    let mut scripts = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = relative_name(dir, entry.path()) else {
            continue;
        };
        if extension.map_or(true, |ext| name.ends_with(ext)) {
            scripts.push(name);
        }
    }
    scripts.sort();
    Ok(scripts)
}

fn relative_name(dir: &Path, path: &Path) -> Option<String> {
    let rel: PathBuf = path.strip_prefix(dir).ok()?.to_path_buf();
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
