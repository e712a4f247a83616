//! Command-line arguments and subcommands for the `linebased` CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::macros::ExpandOptions;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "linebased",
    version,
    about = "Expand, trace and check linebased scripts."
)]
pub struct LinebasedArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand.
#[derive(Debug, clap::Args)]
pub struct GlobalArgs {
    /// Directory that script names and includes resolve against.
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Prefix shown in front of file names in messages.
    #[arg(long, global = true, default_value = "")]
    pub root: String,

    /// Extension appended to include paths.
    #[arg(long, global = true, value_name = "EXT")]
    pub ext: Option<String>,

    /// Use include paths exactly as written.
    #[arg(long, global = true, conflicts_with = "ext")]
    pub no_ext: bool,

    /// Log expansion steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn options(&self) -> ExpandOptions {
        let mut options = ExpandOptions {
            root: self.root.clone(),
            ..ExpandOptions::default()
        };
        if self.no_ext {
            options.extension = None;
        } else if let Some(ext) = &self.ext {
            options.extension = Some(ext.clone());
        }
        options
    }
}

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the fully expanded script.
    Expand {
        /// Script name, relative to --dir.
        #[arg(required = true)]
        file: String,
        /// Emit one JSON object per expression.
        #[arg(long)]
        json: bool,
    },
    /// Print every expanded expression with its location and call chain.
    Trace {
        /// Script name, relative to --dir.
        #[arg(required = true)]
        file: String,
    },
    /// Expand every script under --dir and report which ones fail.
    Check {
        /// Directory to search, relative to --dir.
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Report likely mistakes without expanding.
    Lint {
        /// Script name, relative to --dir.
        #[arg(required = true)]
        file: String,
    },
    /// List the templates a script defines or includes.
    Templates {
        /// Script name, relative to --dir.
        #[arg(required = true)]
        file: String,
    },
}
