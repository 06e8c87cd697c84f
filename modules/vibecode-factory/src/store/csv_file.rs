use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ColumnLayout, RowStore};
use crate::error::StoreError;
use crate::types::{OutputFields, Row};

/// A local CSV file with a header line.
///
/// Every write rewrites the whole file through a temporary file in the same
/// directory followed by a rename.
pub struct CsvStore {
    path: PathBuf,
    table: Mutex<Option<Table>>,
}

#[derive(Debug, Clone)]
struct Table {
    layout: ColumnLayout,
    records: Vec<Vec<String>>,
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::StoreUnavailable(format!("{}: {err}", path.display()))
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Table, StoreError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| unavailable(&self.path, e))?;
        let contents = contents.strip_prefix('\u{feff}').unwrap_or(&contents);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(contents.as_bytes());

        let mut lines = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| unavailable(&self.path, e))?;
            lines.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let mut lines = lines.into_iter();
        let header = lines.next().unwrap_or_default();
        let layout = ColumnLayout::from_header(&header)?;
        let records = lines.collect();
        Ok(Table { layout, records })
    }

    fn save(&self, table: &Table) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| unavailable(dir, e))?;

        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(tmp.as_file_mut());
            writer
                .write_record(table.layout.header())
                .map_err(|e| unavailable(&self.path, e))?;
            let width = table.layout.width();
            for record in &table.records {
                let mut cells = record.clone();
                if cells.len() < width {
                    cells.resize(width, String::new());
                }
                writer
                    .write_record(&cells)
                    .map_err(|e| unavailable(&self.path, e))?;
            }
            writer.flush().map_err(|e| unavailable(&self.path, e))?;
        }
        tmp.as_file_mut()
            .flush()
            .map_err(|e| unavailable(&self.path, e))?;

        tmp.persist(&self.path)
            .map_err(|e| unavailable(&self.path, e.error))?;
        Ok(())
    }
}

#[async_trait]
impl RowStore for CsvStore {
    async fn read_all(&self) -> Result<Vec<Row>, StoreError> {
        let table = self.load()?;
        let rows = table
            .records
            .iter()
            .enumerate()
            .map(|(index, cells)| table.layout.row_from_cells(index, cells))
            .collect();
        info!(path = %self.path.display(), rows = table.records.len(), "Loaded CSV");
        *self.table.lock().await = Some(table);
        Ok(rows)
    }

    async fn write_fields(&self, index: usize, fields: &OutputFields) -> Result<(), StoreError> {
        let mut guard = self.table.lock().await;
        let mut table = match guard.as_ref() {
            Some(table) => table.clone(),
            None => self.load()?,
        };

        let added = table.layout.ensure_outputs();
        if !added.is_empty() {
            debug!(columns = added.len(), "Appending output columns to CSV header");
        }
        let columns = table
            .layout
            .output_columns()
            .ok_or_else(|| unavailable(&self.path, "output columns unresolved"))?;
        let width = table.layout.width();

        let record = table
            .records
            .get_mut(index)
            .ok_or_else(|| unavailable(&self.path, format!("no data row at index {index}")))?;
        if record.len() < width {
            record.resize(width, String::new());
        }
        for (column, value) in columns.into_iter().zip(fields.values()) {
            record[column] = value.to_string();
        }

        self.save(&table)?;
        *guard = Some(table);
        Ok(())
    }
}
