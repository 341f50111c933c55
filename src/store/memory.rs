//! In-process table store.

use super::{validate_table_name, Table, TableStore};
use crate::error::{AnalyticsError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Tables kept in a lock-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Drop a table; returns whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.tables.write().remove(name).is_some()
    }
}

impl TableStore for MemoryStore {
    fn replace(&self, name: &str, table: Table) -> Result<()> {
        validate_table_name(name)?;
        debug!(table = name, rows = table.len(), "replacing table");
        self.tables.write().insert(name.to_string(), table);
        Ok(())
    }

    fn append(&self, name: &str, table: Table) -> Result<()> {
        validate_table_name(name)?;
        let mut tables = self.tables.write();
        debug!(table = name, rows = table.len(), "appending to table");
        match tables.get_mut(name) {
            Some(existing) => existing.extend(table),
            None => {
                tables.insert(name.to_string(), table);
                Ok(())
            }
        }
    }

    fn read(&self, name: &str) -> Result<Table> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AnalyticsError::NotFound(format!("table '{}'", name)))
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn table(rows: &[(&str, &str)]) -> Table {
        Table::with_rows(
            ["id", "value"],
            rows.iter()
                .map(|(a, b)| vec![a.to_string(), b.to_string()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn replace_overwrites() {
        let store = MemoryStore::new();
        store.replace("t", table(&[("1", "a")])).unwrap();
        store.replace("t", table(&[("2", "b"), ("3", "c")])).unwrap();
        assert_eq!(store.read("t").unwrap().len(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn append_creates_then_extends() {
        let store = MemoryStore::new();
        store.append("t", table(&[("1", "a")])).unwrap();
        store.append("t", table(&[("2", "b")])).unwrap();
        assert_eq!(store.read("t").unwrap().column("id").unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn append_with_other_header_is_rejected() {
        let store = MemoryStore::new();
        store.append("t", table(&[("1", "a")])).unwrap();
        let other = Table::new(["id", "score"]).unwrap();
        assert_eq!(
            store.append("t", other),
            Err(AnalyticsError::SchemaMismatch {
                column: "score".into()
            })
        );
        assert_eq!(store.read("t").unwrap().len(), 1);
    }

    #[test]
    fn missing_table_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.read("nope"), Err(AnalyticsError::NotFound(_))));
        assert!(!store.contains("nope").unwrap());
        assert!(!store.remove("nope"));
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..25 {
                        let id = format!("{i}-{j}");
                        store.append("log", table(&[(id.as_str(), "x")])).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.read("log").unwrap().len(), 200);
    }
}
