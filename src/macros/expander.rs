//! The expansion engine.
//!
//! [`ExpandingDecoder`] pulls raw expressions from a stack of file decoders,
//! consumes `define` and `include` directives, passes plain commands
//! through, and replaces template calls with their substituted bodies.
//! Template bodies are run back through the same classification, so
//! expansion is depth-first: a call's full output is produced before the
//! next expression of the enclosing file is read.
//!
//! Any error poisons the decoder. Every later call returns the same error.

use std::collections::VecDeque;
use std::io::{BufReader, Read};
use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::macros::error::{ExpandError, ExpressionError};
use crate::macros::registry::TemplateRegistry;
use crate::macros::stack::{CallStack, IncludeStack};
use crate::macros::substitute::substitute;
use crate::macros::types::{format_stack, Expanded, Template};
use crate::source::FileSystem;
use crate::syntax::{parse_args, Decoder, Limit};

/// Suffix appended to `include` paths unless configured otherwise.
pub const DEFAULT_EXTENSION: &str = ".linebased";

// =============================
// Options
// =============================

/// Settings for an [`ExpandingDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Prefix joined onto file names when they are reported.
    pub root: String,
    /// Suffix appended to `include` paths. `None` uses paths as written.
    pub extension: Option<String>,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            root: String::new(),
            extension: Some(DEFAULT_EXTENSION.to_string()),
        }
    }
}

impl ExpandOptions {
    /// Joins `name` onto the root the way file names are reported.
    pub fn display_path(&self, name: &str) -> String {
        if self.root.is_empty() {
            return name.to_string();
        }
        format!("{}/{}", self.root.trim_end_matches('/'), name)
    }
}

// =============================
// Decoder state
// =============================

/// Lifecycle of an [`ExpandingDecoder`].
#[derive(Debug, Clone)]
pub enum State {
    Running,
    /// Failed; the error is returned from every later call.
    Poisoned(ExpressionError),
    /// All input consumed.
    Finished,
}

/// Where an expression came from, which decides whether `include` is a
/// directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    File,
    Template,
}

struct FileFrame {
    decoder: Decoder<BufReader<Box<dyn Read>>>,
    name: String,
}

impl FileFrame {
    fn new(name: &str, reader: Box<dyn Read>) -> Self {
        Self {
            decoder: Decoder::new(BufReader::new(reader)),
            name: name.to_string(),
        }
    }
}

// =============================
// ExpandingDecoder
// =============================

/// Reads a script and its includes, yielding fully expanded expressions.
///
/// ```
/// use linebased::{ExpandingDecoder, MemFs};
///
/// let fs = MemFs::new().with(
///     "main.lb",
///     "define greet name\n\techo Hello, $name!\ngreet World\n",
/// );
/// let mut dec = ExpandingDecoder::new("main.lb", fs);
/// let expr = dec.decode().unwrap().unwrap();
/// assert_eq!(expr.to_source(), "echo Hello, World!\n");
/// assert!(dec.decode().unwrap().is_none());
/// ```
pub struct ExpandingDecoder<F> {
    fs: F,
    options: ExpandOptions,
    templates: TemplateRegistry,
    files: Vec<FileFrame>,
    includes: IncludeStack,
    calls: CallStack,
    pending: VecDeque<Expanded>,
    state: State,
    reported: bool,
}

impl<F: FileSystem> ExpandingDecoder<F> {
    /// Opens `name` in `fs` with default options.
    pub fn new(name: &str, fs: F) -> Self {
        Self::with_options(name, fs, ExpandOptions::default())
    }

    /// Opens `name` in `fs`. An open failure is not returned here; it
    /// poisons the decoder and surfaces from the first [`decode`] call.
    ///
    /// [`decode`]: ExpandingDecoder::decode
    pub fn with_options(name: &str, fs: F, options: ExpandOptions) -> Self {
        let mut decoder = Self {
            fs,
            options,
            templates: TemplateRegistry::new(),
            files: Vec::new(),
            includes: IncludeStack::new(),
            calls: CallStack::new(),
            pending: VecDeque::new(),
            state: State::Running,
            reported: false,
        };

        match decoder.fs.open(name) {
            Ok(reader) => {
                debug!(file = %name, "opened entry file");
                decoder.includes.push(name);
                decoder.files.push(FileFrame::new(name, reader));
            }
            Err(err) => {
                let expr = Expanded::at(decoder.options.display_path(name), 1);
                let cause = ExpandError::Open {
                    path: name.to_string(),
                    source: Arc::new(err),
                };
                decoder.state = State::Poisoned(ExpressionError::new(expr, cause));
            }
        }
        decoder
    }

    /// Sets the prefix used when reporting file names.
    pub fn set_root(&mut self, root: impl Into<String>) {
        self.options.root = root.into();
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.set_root(root);
        self
    }

    /// Sets the suffix appended to `include` paths.
    pub fn with_extension(mut self, extension: Option<&str>) -> Self {
        self.options.extension = extension.map(str::to_string);
        self
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Templates defined so far.
    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Returns the next expanded expression, or `Ok(None)` once all input
    /// is consumed.
    pub fn decode(&mut self) -> Result<Option<Expanded>, ExpressionError> {
        match &self.state {
            State::Poisoned(err) => return Err(err.clone()),
            State::Finished => return Ok(None),
            State::Running => {}
        }

        match self.advance() {
            Ok(Some(expr)) => Ok(Some(expr)),
            Ok(None) => {
                self.state = State::Finished;
                Ok(None)
            }
            Err(err) => {
                debug!(error = %err, "expansion failed");
                self.state = State::Poisoned(err.clone());
                Err(err)
            }
        }
    }

    fn advance(&mut self) -> Result<Option<Expanded>, ExpressionError> {
        loop {
            if let Some(expr) = self.pending.pop_front() {
                return Ok(Some(expr));
            }

            let Some(frame) = self.files.last_mut() else {
                return Ok(None);
            };
            let decoded = frame.decoder.decode();
            let name = frame.name.clone();

            let raw = match decoded {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    debug!(file = %name, "finished file");
                    self.files.pop();
                    self.includes.pop();
                    continue;
                }
                Err(err) => {
                    return Err(ExpressionError::syntax(
                        self.options.display_path(&name),
                        err,
                    ))
                }
            };

            let expr = Expanded::new(raw, self.options.display_path(&name));
            let mut results = self.classify(expr, Origin::File)?.into_iter();
            if let Some(first) = results.next() {
                self.pending.extend(results);
                return Ok(Some(first));
            }
        }
    }

    /// Consumes directives and expands template calls. Returns everything
    /// `expr` turns into, in output order.
    fn classify(
        &mut self,
        mut expr: Expanded,
        origin: Origin,
    ) -> Result<Vec<Expanded>, ExpressionError> {
        match expr.name() {
            "define" => {
                self.define(&expr)
                    .map_err(|cause| ExpressionError::new(expr, cause))?;
                Ok(Vec::new())
            }
            "include" if origin == Origin::File => {
                self.include(&expr)
                    .map_err(|cause| ExpressionError::new(expr, cause))?;
                Ok(Vec::new())
            }
            "" => Ok(vec![expr]),
            name => match self.templates.get(name) {
                Some(template) if !template.body.is_empty() => {
                    self.expand_template(template, expr)
                }
                _ => {
                    trace!(name = %expr.name(), line = expr.line(), "pass through");
                    expr.stack = self.calls.snapshot();
                    Ok(vec![expr])
                }
            },
        }
    }

    fn define(&mut self, expr: &Expanded) -> Result<(), ExpandError> {
        let template = self.templates.define(Template::parse(expr)?)?;
        debug!(
            template = %template.name,
            params = ?template.params,
            file = %template.file(),
            line = template.line(),
            "defined template"
        );
        Ok(())
    }

    fn include(&mut self, expr: &Expanded) -> Result<(), ExpandError> {
        let args = expr.expr.args(Limit::Unlimited);
        let path = match args.len() {
            0 => return Err(ExpandError::MissingIncludePath),
            1 => args.at(0),
            count => return Err(ExpandError::IncludeArguments { count }),
        };
        if path.contains('/') {
            return Err(ExpandError::IncludeSeparator {
                path: path.to_string(),
            });
        }

        let extension = self.options.extension.as_deref().unwrap_or("");
        if !extension.is_empty() && path.ends_with(extension) {
            return Err(ExpandError::IncludeExtension {
                path: path.to_string(),
                extension: extension.to_string(),
            });
        }
        let file = format!("{path}{extension}");

        if !self.includes.push(&file) {
            return Err(ExpandError::IncludeCycle {
                chain: self.includes.cycle(&file),
            });
        }

        match self.fs.open(&file) {
            Ok(reader) => {
                debug!(file = %file, depth = self.includes.depth(), "included file");
                self.files.push(FileFrame::new(&file, reader));
                Ok(())
            }
            Err(err) => {
                self.includes.pop();
                Err(ExpandError::Open {
                    path: file,
                    source: Arc::new(err),
                })
            }
        }
    }

    fn expand_template(
        &mut self,
        template: Rc<Template>,
        mut callsite: Expanded,
    ) -> Result<Vec<Expanded>, ExpressionError> {
        callsite.stack = self.calls.snapshot();

        if !self.calls.push(callsite.clone()) {
            let mut trace = format_stack("    ", self.calls.frames());
            trace.push_str(&format_stack("    ", std::slice::from_ref(&callsite)));
            let trace = trace.strip_suffix('\n').unwrap_or(&trace).to_string();
            let cause = ExpandError::Recursion {
                name: template.name.clone(),
                trace,
            };
            return Err(ExpressionError::new(callsite, cause));
        }

        trace!(
            template = %template.name,
            depth = self.calls.depth(),
            "expanding template"
        );
        let result = self.expand_body(&template, &callsite);
        self.calls.pop();
        result
    }

    fn expand_body(
        &mut self,
        template: &Template,
        callsite: &Expanded,
    ) -> Result<Vec<Expanded>, ExpressionError> {
        let expected = template.params.len();
        let args = parse_args(callsite.body(), expected);
        if args.len() != expected {
            return Err(ExpressionError::new(
                callsite.clone(),
                ExpandError::ArgumentCount {
                    name: template.name.clone(),
                    expected,
                    actual: args.len(),
                },
            ));
        }

        let lookup = |name: &str| {
            template
                .param_index(name)
                .map(|i| args.at(i).to_string())
        };
        let unknown = |name: String| {
            ExpressionError::new(
                template.source.clone(),
                ExpandError::UnknownParameter { name },
            )
        };

        let mut body = Decoder::new(template.body.as_bytes());
        let mut expanded = Vec::new();
        loop {
            let raw = match body.decode() {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(err) => return Err(ExpressionError::syntax(template.file(), err)),
            };

            let mut expr = Expanded::new(raw, template.file());
            expr.expr.name = substitute(expr.name(), &lookup).map_err(unknown)?;
            expr.expr.body = substitute(expr.body(), &lookup).map_err(unknown)?;

            if expr.name() == "define" {
                return Err(ExpressionError::new(
                    callsite.clone(),
                    ExpandError::NestedDefine {
                        template: template.name.clone(),
                        text: expr.to_source(),
                    },
                ));
            }

            for mut result in self.classify(expr, Origin::Template)? {
                if result.stack.is_empty() {
                    result.stack = self.calls.snapshot();
                }
                expanded.push(result);
            }
        }
        Ok(expanded)
    }
}

impl<F: FileSystem> Iterator for ExpandingDecoder<F> {
    type Item = Result<Expanded, ExpressionError>;

    /// Yields expressions until input ends. An error is yielded once and
    /// ends the iteration.
    fn next(&mut self) -> Option<Self::Item> {
        if self.reported {
            return None;
        }
        match self.decode() {
            Ok(expr) => expr.map(Ok),
            Err(err) => {
                self.reported = true;
                Some(Err(err))
            }
        }
    }
}

/// Starts expanding `name` from `fs` with default options.
pub fn expand<F: FileSystem>(name: &str, fs: F) -> ExpandingDecoder<F> {
    ExpandingDecoder::new(name, fs)
}
