//! In-memory table snapshots.
//!
//! A [`TableSnapshot`] is loaded once per table per run and only read
//! afterwards. Cells are `None` when the loader classified them as null.

use std::collections::HashMap;

/// Read-only rows of one table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSnapshot {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl TableSnapshot {
    /// Creates a snapshot from column names and row-major cells.
    ///
    /// Rows shorter than the column list are treated as null for the
    /// trailing columns. Cells beyond the column list are ignored.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Column names in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows.
    pub fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Whether the column exists in the snapshot schema.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// A table with no rows or no columns has nothing to measure.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Counts nulls for every column in a single pass over the rows.
    pub fn null_counts(&self) -> NullCounts {
        let width = self.columns.len();
        let mut counts = vec![0u64; width];

        for row in &self.rows {
            for (index, count) in counts.iter_mut().enumerate() {
                if row.get(index).is_none_or(Option::is_none) {
                    *count += 1;
                }
            }
        }

        NullCounts {
            counts: self.columns.iter().cloned().zip(counts).collect(),
        }
    }
}

/// Per-column null counts computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NullCounts {
    counts: HashMap<String, u64>,
}

impl NullCounts {
    /// Null count for a column, `None` if the column was not in the snapshot.
    pub fn get(&self, column: &str) -> Option<u64> {
        self.counts.get(column).copied()
    }

    /// Number of columns counted.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no columns were counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
