//! Table sources for completeness checks.
//!
//! A [`TableSource`] turns a table identifier into a [`TableSnapshot`]. The
//! checker only needs to tell a missing table apart from one that failed
//! to load, which [`LoadError::is_not_found`] provides.
//!
//! # Module Structure
//! - `csv`: `<data_dir>/<table>.csv` loader
//! - `options`: CSV parsing options and null markers

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::table::TableSnapshot;

pub mod csv;
pub mod options;

pub use self::csv::CsvDirectorySource;
pub use options::{CsvOptions, DEFAULT_NULL_MARKERS};

/// Reasons a table could not be loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No data exists for the table
    #[error("no data found at {}", path.display())]
    NotFound { path: PathBuf },

    /// Table identifier is not usable as a file name
    #[error("invalid table identifier '{table}'")]
    InvalidIdentifier { table: String },

    /// File could not be opened or read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid CSV
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },

    /// A row does not fit the header
    #[error("malformed row {line} in {}: expected at most {expected} fields, found {found}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// File has no header row
    #[error("no columns to parse from {}", path.display())]
    NoHeader { path: PathBuf },
}

impl LoadError {
    /// Whether the table simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}

/// Capability that loads tables by identifier.
pub trait TableSource {
    /// Loads a snapshot of the named table.
    ///
    /// # Errors
    /// Returns [`LoadError::NotFound`] when the table does not exist and
    /// another variant for every other failure.
    fn load_table(&self, table: &str) -> Result<TableSnapshot, LoadError>;
}

impl<S: TableSource + ?Sized> TableSource for &S {
    fn load_table(&self, table: &str) -> Result<TableSnapshot, LoadError> {
        (**self).load_table(table)
    }
}

/// Tables held in memory, keyed by identifier.
///
/// Unknown identifiers load as [`LoadError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, TableSnapshot>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a table.
    pub fn with_table(mut self, name: impl Into<String>, snapshot: TableSnapshot) -> Self {
        self.tables.insert(name.into(), snapshot);
        self
    }
}

impl TableSource for MemorySource {
    fn load_table(&self, table: &str) -> Result<TableSnapshot, LoadError> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                path: PathBuf::from(table),
            })
    }
}
