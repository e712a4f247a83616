//! The linebased line grammar.
//!
//! ```text
//! script       = { expression } .
//! expression   = { comment } ( command | blankline ) .
//! comment      = "#" text newline .
//! command      = name [ whitespace text ] newline { continuation } .
//! continuation = TAB text newline .
//! blankline    = newline .
//! name         = nonwhitespace { nonwhitespace } .
//! ```
//!
//! A leading space or tab on a line that is not a continuation is a syntax
//! error. There is no quoting or escaping.

pub mod args;
pub mod decoder;
pub mod error;

pub use args::{cut_field, parse_args, parse_args2, parse_args3, Args, Limit};
pub use decoder::{parse_str, Decoder, Expression};
pub use error::SyntaxError;
