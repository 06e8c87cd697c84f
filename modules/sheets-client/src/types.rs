use serde::{Deserialize, Serialize};

/// A rectangular block of cell values, as exchanged with the `values` endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    /// Rows of cells. Trailing empty cells and rows are omitted by the API.
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

impl ValueRange {
    /// A single-row write starting at `range`.
    pub fn row(range: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            range: range.into(),
            major_dimension: Some("ROWS".to_string()),
            values: vec![cells],
        }
    }

    /// A single-cell write.
    pub fn cell(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self::row(range, vec![value.into()])
    }
}

/// How written values are interpreted. `Raw` stores strings verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    Raw,
    UserEntered,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchUpdateRequest<'a> {
    pub value_input_option: ValueInputOption,
    pub data: &'a [ValueRange],
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub total_updated_rows: u32,
    #[serde(default)]
    pub total_updated_columns: u32,
    #[serde(default)]
    pub total_updated_cells: u32,
}

/// Google's error envelope: `{"error": {"code": 403, "message": "...", "status": "PERMISSION_DENIED"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}
