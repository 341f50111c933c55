//! Column-named table of string cells, the unit a [`TableStore`](super::TableStore) persists.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rectangular table: every row has one cell per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Empty table with the given header.
    ///
    /// # Errors
    /// `InvalidArgument` if there are no columns, a column name is blank, or
    /// a name repeats.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(AnalyticsError::InvalidArgument(
                "a table needs at least one column".into(),
            ));
        }
        let mut seen = HashSet::new();
        for c in &columns {
            if c.trim().is_empty() {
                return Err(AnalyticsError::InvalidArgument("blank column name".into()));
            }
            if !seen.insert(c.as_str()) {
                return Err(AnalyticsError::InvalidArgument(format!(
                    "duplicate column '{}'",
                    c
                )));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Table with rows; every row must match the header width.
    pub fn with_rows<I, S>(columns: I, rows: Vec<Vec<String>>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| AnalyticsError::missing_column(name))?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Fails with `SchemaMismatch` naming the first column that differs
    /// unless `other` has exactly the same header in the same order.
    pub fn check_same_columns(&self, other: &Table) -> Result<()> {
        if self.columns == other.columns {
            return Ok(());
        }
        let differing = other
            .columns
            .iter()
            .find(|c| !self.columns.contains(c))
            .or_else(|| self.columns.iter().find(|c| !other.columns.contains(c)))
            .or_else(|| {
                self.columns
                    .iter()
                    .zip(&other.columns)
                    .find(|(a, b)| a != b)
                    .map(|(_, b)| b)
            })
            .cloned()
            .unwrap_or_default();
        Err(AnalyticsError::SchemaMismatch { column: differing })
    }

    /// Append the rows of a table with the same header.
    pub fn extend(&mut self, other: Table) -> Result<()> {
        self.check_same_columns(&other)?;
        self.rows.extend(other.rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn rows_must_match_header_width() {
        let mut table = Table::new(["a", "b"]).unwrap();
        table.push_row(cells(&["1", "2"])).unwrap();
        assert_eq!(
            table.push_row(cells(&["1"])),
            Err(AnalyticsError::DimensionMismatch { expected: 2, got: 1 })
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.column("b").unwrap(), vec!["2"]);
    }

    #[test]
    fn header_is_validated() {
        assert!(Table::new(Vec::<String>::new()).is_err());
        assert!(Table::new(["a", " "]).is_err());
        assert!(Table::new(["a", "a"]).is_err());
    }

    #[test]
    fn missing_column_is_named() {
        let table = Table::new(["a"]).unwrap();
        assert_eq!(table.column("z"), Err(AnalyticsError::missing_column("z")));
    }

    #[test]
    fn extend_requires_identical_header() {
        let mut base = Table::with_rows(["a", "b"], vec![cells(&["1", "2"])]).unwrap();
        let extra = Table::with_rows(["a", "c"], vec![cells(&["3", "4"])]).unwrap();
        assert_eq!(
            base.extend(extra),
            Err(AnalyticsError::SchemaMismatch { column: "c".into() })
        );

        let err = base.check_same_columns(&Table::new(["a", "c"]).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "schema mismatch at column 'c'");

        let reordered = Table::new(["b", "a"]).unwrap();
        assert_eq!(
            base.check_same_columns(&reordered),
            Err(AnalyticsError::SchemaMismatch { column: "b".into() })
        );

        let same = Table::with_rows(["a", "b"], vec![cells(&["5", "6"])]).unwrap();
        base.extend(same).unwrap();
        assert_eq!(base.column("a").unwrap(), vec!["1", "5"]);
    }
}
