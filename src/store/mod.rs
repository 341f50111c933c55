//! Table persistence.
//!
//! A [`TableStore`] keeps named [`Table`]s. Two backends are provided:
//! [`MemoryStore`] for tests and single-process use, and [`CsvDirStore`]
//! which writes one `<name>.csv` file per table. Both serialize writes, so a
//! store can be shared across threads behind an `Arc`.
//!
//! # Example
//!
//! ```
//! use mursis_analytics::data::create_sample_sales_data;
//! use mursis_analytics::store::{load, save, MemoryStore, WriteMode};
//! use mursis_analytics::core::SalesRecord;
//!
//! let store = MemoryStore::new();
//! let records = create_sample_sales_data(10, 1).unwrap();
//! save(&store, "sales", &records, WriteMode::Replace).unwrap();
//! save(&store, "sales", &records, WriteMode::Append).unwrap();
//! let back: Vec<SalesRecord> = load(&store, "sales").unwrap();
//! assert_eq!(back.len(), 20);
//! ```

mod convert;
mod csv_dir;
mod feedback;
mod memory;
mod table;

pub use convert::{forecast_from_table, forecast_to_table, from_table, to_table, RowView, TableRow};
pub use csv_dir::CsvDirStore;
pub use feedback::{FeedbackBook, FeedbackRecord, FEEDBACK_TABLE};
pub use memory::MemoryStore;
pub use table::Table;

use crate::error::{AnalyticsError, Result};

/// Named-table storage.
///
/// Implementations must be safe to share between threads and must
/// serialize writes to a table.
pub trait TableStore: Send + Sync {
    /// Create or overwrite `name`.
    fn replace(&self, name: &str, table: Table) -> Result<()>;

    /// Add rows to `name`, creating it when absent.
    ///
    /// # Errors
    /// `SchemaMismatch` if the table exists with a different header.
    fn append(&self, name: &str, table: Table) -> Result<()>;

    /// # Errors
    /// `NotFound` if no table has that name.
    fn read(&self, name: &str) -> Result<Table>;

    /// Stored table names, sorted.
    fn table_names(&self) -> Result<Vec<String>>;

    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.table_names()?.iter().any(|n| n == name))
    }

    fn backend_type(&self) -> &'static str;
}

/// How [`save`] treats an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Replace,
    Append,
}

/// Write records to `name`.
pub fn save<T: TableRow>(store: &dyn TableStore, name: &str, records: &[T], mode: WriteMode) -> Result<()> {
    let table = to_table(records)?;
    match mode {
        WriteMode::Replace => store.replace(name, table),
        WriteMode::Append => store.append(name, table),
    }
}

/// Read and parse every row of `name`.
pub fn load<T: TableRow>(store: &dyn TableStore, name: &str) -> Result<Vec<T>> {
    from_table(&store.read(name)?)
}

/// Names become file stems, so only ASCII letters, digits, `_` and `-` are allowed.
pub(crate) fn validate_table_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AnalyticsError::InvalidArgument(format!(
            "invalid table name '{}'",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_restricted() {
        assert!(validate_table_name("sales_2024").is_ok());
        assert!(validate_table_name("forecast-arima").is_ok());
        for bad in ["", "../etc", "a b", "x.csv"] {
            assert!(matches!(
                validate_table_name(bad),
                Err(AnalyticsError::InvalidArgument(_))
            ));
        }
    }
}
