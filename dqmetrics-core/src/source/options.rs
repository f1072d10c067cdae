//! CSV parsing options.

use serde::{Deserialize, Serialize};

/// Cell values treated as null. Matching is exact and case-sensitive.
pub const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Options for reading `<table>.csv` files.
///
/// # Example
/// ```rust
/// use dqmetrics_core::source::CsvOptions;
///
/// let options = CsvOptions::new().with_delimiter(b';').with_null_markers(["", "-"]);
/// assert!(options.is_null("-"));
/// assert!(!options.is_null("NULL"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field delimiter byte
    pub delimiter: u8,
    /// File extension appended to the table identifier
    pub extension: String,
    /// Values classified as null
    pub null_markers: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            extension: "csv".to_string(),
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

impl CsvOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder method to set the file extension (without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Builder method to replace the null markers.
    pub fn with_null_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a raw cell value is null.
    pub fn is_null(&self, value: &str) -> bool {
        self.null_markers.iter().any(|m| m == value)
    }
}
