//! # linebased
//!
//! A line-oriented script notation and the preprocessor that expands it.
//!
//! A script is a sequence of commands, one per line. A command's first word
//! is its name and the rest of the line is its body; lines starting with a
//! tab continue the previous command and lines starting with `#` are
//! comments attached to the next one.
//!
//! ```text
//! # Greets someone.
//! define greet name
//! 	echo Hello, $name!
//!
//! include common
//! greet World
//! ```
//!
//! The [`syntax`] module tokenizes text into [`Expression`]s. The [`macros`]
//! module layers `define` templates and `include` files on top and yields
//! fully expanded [`Expanded`] expressions, each carrying the file and chain
//! of template calls it came from. What the commands mean is up to the
//! program consuming them.

pub use crate::macros::{
    expand, ExpandError, ExpandOptions, Expanded, ExpandingDecoder, ExpressionError,
};
pub use crate::source::{DirFs, FileSystem, MemFs};
pub use crate::syntax::{parse_args, parse_args2, parse_args3, Args, Decoder, Expression, SyntaxError};

pub mod analysis;
pub mod checks;
pub mod cli;
pub mod diagnostics;
pub mod macros;
pub mod source;
pub mod syntax;
