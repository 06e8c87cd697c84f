use async_trait::async_trait;
use sheets_client::{a1, SheetsClient, SheetsError, ValueInputOption, ValueRange};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{ColumnLayout, RowStore};
use crate::error::StoreError;
use crate::types::{OutputFields, Row, OUTPUT_COLUMNS};

impl From<SheetsError> for StoreError {
    fn from(err: SheetsError) -> Self {
        if err.is_permission_denied() {
            StoreError::StoreUnavailable(format!("permission denied: {err}"))
        } else {
            StoreError::StoreUnavailable(err.to_string())
        }
    }
}

/// One worksheet of a Google spreadsheet.
pub struct SheetsStore {
    client: SheetsClient,
    spreadsheet_id: String,
    worksheet: String,
    layout: Mutex<Option<ColumnLayout>>,
}

impl SheetsStore {
    pub fn new(
        client: SheetsClient,
        spreadsheet_id: impl Into<String>,
        worksheet: impl Into<String>,
    ) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
            layout: Mutex::new(None),
        }
    }

    async fn load(&self) -> Result<(ColumnLayout, Vec<Vec<String>>), StoreError> {
        let range = a1::sheet_range(&self.worksheet);
        let values = self.client.get_values(&self.spreadsheet_id, &range).await?;

        let mut lines = values.values.into_iter();
        let header = lines.next().unwrap_or_default();
        let layout = ColumnLayout::from_header(&header)?;
        Ok((layout, lines.collect()))
    }
}

/// Cells for one row write: any newly appended header cells in row 1, then
/// the five output cells of data row `index`.
fn write_ranges(
    worksheet: &str,
    layout: &mut ColumnLayout,
    index: usize,
    fields: &OutputFields,
) -> Result<Vec<ValueRange>, StoreError> {
    let mut data: Vec<ValueRange> = layout
        .ensure_outputs()
        .into_iter()
        .map(|(column, name)| ValueRange::cell(a1::cell(worksheet, column, 1), name))
        .collect();

    let columns = layout
        .output_columns()
        .ok_or_else(|| StoreError::StoreUnavailable("output columns unresolved".to_string()))?;
    let row_number = index + 2;
    data.extend(
        columns
            .into_iter()
            .zip(fields.values())
            .map(|(column, value)| ValueRange::cell(a1::cell(worksheet, column, row_number), value)),
    );
    Ok(data)
}

#[async_trait]
impl RowStore for SheetsStore {
    async fn read_all(&self) -> Result<Vec<Row>, StoreError> {
        let (layout, records) = self.load().await?;
        let rows: Vec<Row> = records
            .iter()
            .enumerate()
            .map(|(index, cells)| layout.row_from_cells(index, cells))
            .collect();
        info!(
            worksheet = %self.worksheet,
            rows = rows.len(),
            "Loaded worksheet"
        );
        *self.layout.lock().await = Some(layout);
        Ok(rows)
    }

    async fn write_fields(&self, index: usize, fields: &OutputFields) -> Result<(), StoreError> {
        let mut guard = self.layout.lock().await;
        let mut layout = match guard.as_ref() {
            Some(layout) => layout.clone(),
            None => self.load().await?.0,
        };

        let data = write_ranges(&self.worksheet, &mut layout, index, fields)?;
        if data.len() > OUTPUT_COLUMNS.len() {
            debug!(
                columns = data.len() - OUTPUT_COLUMNS.len(),
                "Appending output columns to header"
            );
        }

        self.client
            .batch_update(&self.spreadsheet_id, ValueInputOption::Raw, &data)
            .await?;
        *guard = Some(layout);
        Ok(())
    }
}
