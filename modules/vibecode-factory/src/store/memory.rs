use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{ColumnLayout, RowStore};
use crate::error::StoreError;
use crate::types::{OutputFields, Row};

/// In-memory table for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    rows: Vec<Row>,
    header: Option<Vec<String>>,
    unavailable: Option<String>,
    failing_writes: HashSet<usize>,
    writes: usize,
}

impl MemoryStore {
    /// Rows are re-indexed by position.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| Row { index, ..row })
            .collect();
        Self {
            state: Mutex::new(State {
                rows,
                ..Default::default()
            }),
        }
    }

    /// Validate this header on every read, as a file or sheet store would.
    pub fn with_header(self, header: &[&str]) -> Self {
        self.lock().header = Some(header.iter().map(|h| h.to_string()).collect());
        self
    }

    /// Every operation fails with `StoreUnavailable(reason)`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let store = Self::default();
        store.lock().unavailable = Some(reason.into());
        store
    }

    /// Writes to these data rows fail.
    pub fn fail_writes_for(self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.lock().failing_writes.extend(indices);
        self
    }

    pub fn rows(&self) -> Vec<Row> {
        self.lock().rows.clone()
    }

    /// Successful `write_fields` calls so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn read_all(&self) -> Result<Vec<Row>, StoreError> {
        let state = self.lock();
        if let Some(reason) = &state.unavailable {
            return Err(StoreError::StoreUnavailable(reason.clone()));
        }
        if let Some(header) = &state.header {
            ColumnLayout::from_header(header)?;
        }
        Ok(state.rows.clone())
    }

    async fn write_fields(&self, index: usize, fields: &OutputFields) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(reason) = &state.unavailable {
            return Err(StoreError::StoreUnavailable(reason.clone()));
        }
        if state.failing_writes.contains(&index) {
            return Err(StoreError::StoreUnavailable(format!(
                "write to row {index} rejected"
            )));
        }
        let row = state
            .rows
            .get_mut(index)
            .ok_or_else(|| StoreError::StoreUnavailable(format!("no row at index {index}")))?;
        row.output = fields.clone();
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_replace_all_five_fields() {
        let store = MemoryStore::from_rows([Row::new(7, "a", "", "x"), Row::new(7, "b", "", "y")]);
        let fields = OutputFields::from_values(["1", "2", "3", "4", "5"].map(String::from));

        store.write_fields(1, &fields).await.unwrap();

        let rows = store.read_all().await.unwrap();
        assert_eq!(rows[0].index, 0);
        assert!(rows[0].output.is_empty());
        assert_eq!(rows[1].output, fields);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn failing_rows_are_left_alone() {
        let store = MemoryStore::from_rows([Row::new(0, "a", "", "x")]).fail_writes_for([0]);
        let err = store
            .write_fields(0, &OutputFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StoreUnavailable(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn header_is_checked_on_read() {
        let store = MemoryStore::default().with_header(&["title", "transcription"]);
        assert!(matches!(
            store.read_all().await,
            Err(StoreError::SchemaMismatch { .. })
        ));
    }
}
