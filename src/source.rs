//! Where script files come from.
//!
//! The expander only needs to open a named entry for reading. Names are
//! always relative to a single root; there is no path resolution beyond
//! that.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, Cursor, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Opens script files by name.
pub trait FileSystem {
    /// Opens `name` for reading, failing with `NotFound` or another I/O error.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        (**self).open(name)
    }
}

impl<F: FileSystem + ?Sized> FileSystem for Arc<F> {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        (**self).open(name)
    }
}

// ============================================================================
// DIRECTORY-BACKED
// ============================================================================

/// Files under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSystem for DirFs {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        let file = File::open(self.root.join(name))?;
        Ok(Box::new(file))
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// An in-memory map of file names to contents.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, name: impl Into<String>, data: impl AsRef<[u8]>) {
        self.files.insert(name.into(), Arc::from(data.as_ref()));
    }

    /// Builder form of [`MemFs::insert`].
    pub fn with(mut self, name: impl Into<String>, data: impl AsRef<[u8]>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }
}

impl<N: Into<String>, D: AsRef<[u8]>> FromIterator<(N, D)> for MemFs {
    fn from_iter<I: IntoIterator<Item = (N, D)>>(iter: I) -> Self {
        let mut fs = MemFs::new();
        for (name, data) in iter {
            fs.insert(name, data);
        }
        fs
    }
}

impl FileSystem for MemFs {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        match self.files.get(name) {
            Some(data) => Ok(Box::new(Cursor::new(Arc::clone(data)))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "file does not exist",
            )),
        }
    }
}
