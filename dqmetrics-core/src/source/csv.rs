//! CSV directory source.
//!
//! Each table identifier maps to `<data_dir>/<table>.<extension>`. The
//! first row is the header. Identifiers are validated before any path is
//! built, so a table name can never address a file outside `data_dir`.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ::csv::ReaderBuilder;
use regex::Regex;

use super::options::CsvOptions;
use super::{LoadError, TableSource};
use crate::table::TableSnapshot;

const TABLE_IDENTIFIER_PATTERN: &str = r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$";

fn identifier_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(TABLE_IDENTIFIER_PATTERN).ok())
        .as_ref()
}

/// Whether a table identifier is safe to use as a file stem.
///
/// ```rust
/// use dqmetrics_core::source::csv::is_valid_table_identifier;
///
/// assert!(is_valid_table_identifier("sales_2026.q1"));
/// assert!(!is_valid_table_identifier("../secrets"));
/// assert!(!is_valid_table_identifier("nested/table"));
/// ```
pub fn is_valid_table_identifier(table: &str) -> bool {
    identifier_pattern().is_some_and(|pattern| pattern.is_match(table))
}

/// Loads tables from CSV files in one directory.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    data_dir: PathBuf,
    options: CsvOptions,
}

impl CsvDirectorySource {
    /// Creates a source over `data_dir` with default options.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            options: CsvOptions::default(),
        }
    }

    /// Builder method to set parsing options.
    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    /// Directory tables are read from.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// File a table identifier maps to.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", table, self.options.extension))
    }

    fn read_snapshot(&self, path: &Path, file: File) -> Result<TableSnapshot, LoadError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = reader
            .headers()
            .map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?
            .clone();

        if header.is_empty() {
            return Err(LoadError::NoHeader {
                path: path.to_path_buf(),
            });
        }

        let columns = column_names(header.iter());
        let width = columns.len();
        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

            if record.len() > width {
                return Err(LoadError::Malformed {
                    path: path.to_path_buf(),
                    line: record.position().map_or(0, ::csv::Position::line),
                    expected: width,
                    found: record.len(),
                });
            }

            rows.push(
                record
                    .iter()
                    .map(|value| (!self.options.is_null(value)).then(|| value.to_string()))
                    .collect(),
            );
        }

        Ok(TableSnapshot::new(columns, rows))
    }
}

impl TableSource for CsvDirectorySource {
    fn load_table(&self, table: &str) -> Result<TableSnapshot, LoadError> {
        if !is_valid_table_identifier(table) {
            return Err(LoadError::InvalidIdentifier {
                table: table.to_string(),
            });
        }

        let path = self.table_path(table);
        let file = File::open(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound { path: path.clone() }
            } else {
                LoadError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let snapshot = self.read_snapshot(&path, file)?;
        tracing::debug!(
            "Loaded table '{}' from {} ({} rows, {} columns)",
            table,
            path.display(),
            snapshot.row_count(),
            snapshot.columns().len()
        );

        Ok(snapshot)
    }
}

/// Names header columns, filling blanks and de-duplicating repeats.
///
/// A blank header at position `i` becomes `Unnamed: i`; the second and
/// later occurrences of a name get `.1`, `.2`, ... suffixes.
fn column_names<'a>(header: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut names = Vec::new();

    for (index, raw) in header.enumerate() {
        let base = if raw.is_empty() {
            format!("Unnamed: {}", index)
        } else {
            raw.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 0u32;
        while used.contains(&candidate) {
            suffix += 1;
            candidate = format!("{}.{}", base, suffix);
        }

        used.insert(candidate.clone());
        names.push(candidate);
    }

    names
}
