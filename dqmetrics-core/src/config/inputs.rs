//! Input documents: table list, required columns, and store field mapping.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::quality::{CompletenessMetric, METRIC_FIELDS};

/// Tables to check, in order.
///
/// Document shape: `{"tables": ["users", "orders"]}`. A missing `tables`
/// key reads as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableList {
    /// Table identifiers
    #[serde(default)]
    pub tables: Vec<String>,
}

impl TableList {
    /// Creates a list from identifiers.
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether no tables are configured.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Required columns per table.
///
/// Document shape: `{"users": ["email", "name"], "orders": ["total"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredColumns(HashMap<String, Vec<String>>);

impl RequiredColumns {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the columns for a table.
    pub fn with_table<I, S>(mut self, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .insert(table.into(), columns.into_iter().map(Into::into).collect());
        self
    }

    /// Columns to check for a table; `None` when absent or empty.
    pub fn columns_for(&self, table: &str) -> Option<&[String]> {
        self.0
            .get(table)
            .map(Vec::as_slice)
            .filter(|columns| !columns.is_empty())
    }

    /// Number of tables with an entry.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renames metric fields to store column names.
///
/// Document shape: `{"metric_date": "date", "missing_rows": "nulls"}`.
/// Only mapped fields are sent to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(BTreeMap<String, String>);

impl FieldMapping {
    /// Creates a mapping from `(metric_field, store_column)` pairs.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Checks that every key names a metric field and every target is a
    /// non-empty store column used by one field only.
    ///
    /// # Errors
    /// Returns a configuration error naming the first bad entry.
    pub fn validate(&self) -> crate::Result<()> {
        if self.0.is_empty() {
            return Err(crate::error::DqError::configuration(
                "field mapping must map at least one metric field",
            ));
        }

        let mut targets: BTreeMap<&str, &str> = BTreeMap::new();
        for (field, column) in &self.0 {
            if !METRIC_FIELDS.contains(&field.as_str()) {
                return Err(crate::error::DqError::configuration(format!(
                    "field mapping references unknown metric field '{}'",
                    field
                )));
            }
            if column.trim().is_empty() {
                return Err(crate::error::DqError::configuration(format!(
                    "field mapping for '{}' has an empty store column",
                    field
                )));
            }
            if let Some(previous) = targets.insert(column.as_str(), field.as_str()) {
                return Err(crate::error::DqError::configuration(format!(
                    "field mapping sends both '{}' and '{}' to store column '{}'",
                    previous, field, column
                )));
            }
        }

        Ok(())
    }

    /// Store column for a metric field, if mapped.
    pub fn column_for(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Builds the store row for one metric using only mapped fields.
    ///
    /// # Errors
    /// Returns a configuration error if a mapped field is not present on
    /// the serialized metric.
    pub fn apply(
        &self,
        metric: &CompletenessMetric,
    ) -> crate::Result<serde_json::Map<String, serde_json::Value>> {
        let value = serde_json::to_value(metric).map_err(|e| {
            crate::error::DqError::serialization("Failed to serialize metric for mapping", e)
        })?;

        let mut row = serde_json::Map::new();
        for (field, column) in &self.0 {
            let cell = value.get(field).cloned().ok_or_else(|| {
                crate::error::DqError::configuration(format!(
                    "metric record has no field '{}'",
                    field
                ))
            })?;
            row.insert(column.clone(), cell);
        }

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStamp;
    use crate::quality::build_metric_record;

    #[test]
    fn test_table_list_parsing() {
        let list: TableList = serde_json::from_str(r#"{"tables": ["users", "orders"]}"#).unwrap();
        assert_eq!(list, TableList::new(["users", "orders"]));

        let empty: TableList = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_required_columns_lookup() {
        let required: RequiredColumns =
            serde_json::from_str(r#"{"users": ["email", "name"], "orders": []}"#).unwrap();

        assert_eq!(
            required.columns_for("users"),
            Some(&["email".to_string(), "name".to_string()][..])
        );
        assert_eq!(required.columns_for("orders"), None);
        assert_eq!(required.columns_for("missing"), None);
        assert_eq!(required.len(), 2);
    }

    #[test]
    fn test_field_mapping_validation() {
        assert!(FieldMapping::new([("metric_date", "date")]).validate().is_ok());
        assert!(FieldMapping::new([("row_total", "total")]).validate().is_err());
        assert!(FieldMapping::new([("metric_date", " ")]).validate().is_err());

        let error = FieldMapping::new([("table_name", "x"), ("column_name", "x")])
            .validate()
            .unwrap_err();
        assert!(error.to_string().contains("store column 'x'"));
        assert!(FieldMapping::default().validate().is_err());
    }

    #[test]
    fn test_field_mapping_apply_renames_and_filters() {
        let stamp = RunStamp {
            run_timestamp: "2026-02-05 12:00:00".to_string(),
            metric_date: "2026-02-05".to_string(),
        };
        let metric = build_metric_record("daily", &stamp, "users", "email", 10, 2);
        let mapping = FieldMapping::new([
            ("metric_date", "date"),
            ("table_name", "tbl"),
            ("missing_percentage", "pct"),
        ]);

        let row = mapping.apply(&metric).unwrap();

        assert_eq!(row.len(), 3);
        assert_eq!(row["date"], "2026-02-05");
        assert_eq!(row["tbl"], "users");
        assert_eq!(row["pct"], 20.0);
        assert!(!row.contains_key("pipeline_name"));
        assert_eq!(mapping.column_for("table_name"), Some("tbl"));
    }
}
