//! The two stacks that guard expansion against loops.
//!
//! [`CallStack`] tracks active template calls and rejects a call to a
//! template that is already expanding. [`IncludeStack`] does the same for
//! files.

use std::collections::HashSet;

use crate::macros::types::Expanded;

// ============================================================================
// CALL STACK
// ============================================================================

/// Active template calls, outermost first, with an index of active names.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<Expanded>,
    active: HashSet<String>,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a call frame. Returns `false` without pushing if a call to the
    /// same template is already active.
    pub fn push(&mut self, frame: Expanded) -> bool {
        if !self.active.insert(frame.expr.name.clone()) {
            return false;
        }
        self.frames.push(frame);
        true
    }

    pub fn pop(&mut self) -> Option<Expanded> {
        let frame = self.frames.pop()?;
        self.active.remove(&frame.expr.name);
        Some(frame)
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    pub fn frames(&self) -> &[Expanded] {
        &self.frames
    }

    /// An owned copy of the frames, for attaching to output expressions.
    pub fn snapshot(&self) -> Vec<Expanded> {
        self.frames.clone()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

// ============================================================================
// INCLUDE STACK
// ============================================================================

/// Files currently being read, entry file first.
#[derive(Debug, Clone, Default)]
pub struct IncludeStack {
    files: Vec<String>,
}

impl IncludeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `file`. Returns `false` without pushing if it is already open.
    pub fn push(&mut self, file: &str) -> bool {
        if self.contains(file) {
            return false;
        }
        self.files.push(file.to_string());
        true
    }

    pub fn pop(&mut self) -> Option<String> {
        self.files.pop()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.iter().any(|f| f == file)
    }

    /// The open files followed by `next`, for cycle reports.
    pub fn cycle(&self, next: &str) -> Vec<String> {
        let mut chain = self.files.clone();
        chain.push(next.to_string());
        chain
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn depth(&self) -> usize {
        self.files.len()
    }
}
