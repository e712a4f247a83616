//! # Template and Include Expansion
//!
//! Layered on top of the tokenizer, this module turns a script and the files
//! it includes into a flat stream of [`Expanded`] expressions.
//!
//! ## Directives
//!
//! - `define NAME [PARAM...]` registers a template whose body is the
//!   continuation lines. Names are global to one expansion run and may not
//!   be redefined.
//! - `include PATH` splices another file from the same root. The path may not
//!   contain `/` and may not carry the configured extension, which is added
//!   automatically.
//!
//! Any other command whose name matches a template with a non-empty body is
//! a call: its arguments are split to the template's arity, substituted for
//! `$param` and `${param}` references, and the result is classified again.
//! Calling a template that is already expanding is an error, as is
//! including a file that is already open.
//!
//! ## Modules
//!
//! - **`expander`**: the [`ExpandingDecoder`] engine
//! - **`types`**: [`Expanded`] and [`Template`]
//! - **`registry`**: append-only template storage
//! - **`stack`**: call and include stacks
//! - **`substitute`**: parameter reference scanning
//! - **`error`**: located expansion errors

pub mod error;
pub mod expander;
pub mod registry;
pub mod stack;
pub mod substitute;
pub mod types;

pub use error::{ErrorType, ExpandError, ExpressionError};
pub use expander::{expand, ExpandOptions, ExpandingDecoder, State, DEFAULT_EXTENSION};
pub use registry::TemplateRegistry;
pub use stack::{CallStack, IncludeStack};
pub use substitute::substitute;
pub use types::{format_stack, write_stack, Expanded, Template};
