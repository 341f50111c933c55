//! Table store backed by a directory of CSV files.

use super::{validate_table_name, Table, TableStore};
use crate::error::{AnalyticsError, Result};
use parking_lot::RwLock;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One `<name>.csv` per table under a root directory.
///
/// Replacements are written to a temporary file and renamed into place.
#[derive(Debug)]
pub struct CsvDirStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl CsvDirStore {
    /// Open (and create if needed) the store directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| AnalyticsError::io(root.display(), e))?;
        info!(root = %root.display(), "opened csv table store");
        Ok(Self {
            root,
            lock: RwLock::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `name`.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.csv", name))
    }

    fn write_file(&self, path: &Path, table: &Table) -> Result<()> {
        let tmp = path.with_extension("csv.tmp");
        {
            let mut writer =
                csv::Writer::from_path(&tmp).map_err(|e| AnalyticsError::io(tmp.display(), e))?;
            write_rows(&mut writer, table, true).map_err(|e| AnalyticsError::io(tmp.display(), e))?;
        }
        fs::rename(&tmp, path).map_err(|e| AnalyticsError::io(path.display(), e))
    }

    fn read_file(&self, path: &Path) -> Result<Table> {
        let mut reader =
            csv::Reader::from_path(path).map_err(|e| AnalyticsError::io(path.display(), e))?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| AnalyticsError::io(path.display(), e))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut table = Table::new(columns)?;
        for record in reader.records() {
            let record = record.map_err(|e| AnalyticsError::io(path.display(), e))?;
            table.push_row(record.iter().map(str::to_string).collect())?;
        }
        Ok(table)
    }
}

fn write_rows<W: std::io::Write>(writer: &mut csv::Writer<W>, table: &Table, header: bool) -> csv::Result<()> {
    if header {
        writer.write_record(table.columns())?;
    }
    for row in table.rows() {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

impl TableStore for CsvDirStore {
    fn replace(&self, name: &str, table: Table) -> Result<()> {
        validate_table_name(name)?;
        let _guard = self.lock.write();
        let path = self.path_of(name);
        self.write_file(&path, &table)?;
        debug!(table = name, rows = table.len(), path = %path.display(), "replaced table");
        Ok(())
    }

    fn append(&self, name: &str, table: Table) -> Result<()> {
        validate_table_name(name)?;
        let _guard = self.lock.write();
        let path = self.path_of(name);
        if !path.exists() {
            self.write_file(&path, &table)?;
            debug!(table = name, rows = table.len(), "created table on append");
            return Ok(());
        }

        let existing = self.read_file(&path)?;
        existing.check_same_columns(&table)?;
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| AnalyticsError::io(path.display(), e))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        write_rows(&mut writer, &table, false).map_err(|e| AnalyticsError::io(path.display(), e))?;
        debug!(
            table = name,
            rows = table.len(),
            total = existing.len() + table.len(),
            "appended to table"
        );
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Table> {
        validate_table_name(name)?;
        let _guard = self.lock.read();
        let path = self.path_of(name);
        if !path.exists() {
            return Err(AnalyticsError::NotFound(format!("table '{}'", name)));
        }
        self.read_file(&path)
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let _guard = self.lock.read();
        let entries = fs::read_dir(&self.root).map_err(|e| AnalyticsError::io(self.root.display(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| AnalyticsError::io(self.root.display(), e))?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_table_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn backend_type(&self) -> &'static str {
        "csv-dir"
    }
}
