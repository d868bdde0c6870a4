//! Corpus enumeration
//!
//! Recursive, name-sorted walk over a directory tree of compiled class
//! units. Each unit's bytes are read, handed to the callback, and dropped
//! before the next unit is opened.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::errors::ClassfileError;

const CLASS_EXTENSION: &str = "class";

/// A directory tree (or a single `.class` file) of compiled units
#[derive(Debug, Clone)]
pub struct ClassCorpus {
    root: PathBuf,
}

impl ClassCorpus {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Invoke `consumer` once per class unit, in file-name order
    ///
    /// Enumeration and read errors abort immediately; a partially
    /// consumed corpus never produces a report. The error type is generic
    /// so callers can thread their own failures through the walk.
    pub fn for_each_unit<E>(
        &self,
        mut consumer: impl FnMut(&Path, &[u8]) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<ClassfileError>,
    {
        let mut visited = 0usize;
        let walker = WalkDir::new(&self.root).sort_by_file_name();
        for entry in walker {
            let entry =
                entry.map_err(|e| ClassfileError::Io(std::io::Error::from(e)))?;
            if !entry.file_type().is_file() || !is_class_file(entry.path()) {
                continue;
            }
            let bytes = fs::read(entry.path()).map_err(ClassfileError::Io)?;
            consumer(entry.path(), &bytes)?;
            visited += 1;
        }
        debug!(root = %self.root.display(), units = visited, "corpus walk complete");
        Ok(())
    }
}

fn is_class_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == CLASS_EXTENSION)
}
