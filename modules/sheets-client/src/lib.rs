pub mod a1;
pub mod error;
pub mod types;

pub use error::{Result, SheetsError};
pub use types::{BatchUpdateResponse, ValueInputOption, ValueRange};

use reqwest::{Response, Url};
use types::{BatchUpdateRequest, ErrorEnvelope};

const BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Minimal client for the spreadsheet `values` endpoints.
///
/// Authenticates with an OAuth2 access token (for example from
/// `gcloud auth print-access-token` or a service-account token exchange
/// performed outside this crate).
pub struct SheetsClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl SheetsClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// `{base}/spreadsheets/{id}/values/{range}` with each segment percent-encoded.
    fn values_url(&self, spreadsheet_id: &str, tail: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SheetsError::InvalidRequest(format!("bad base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidRequest("base url cannot carry a path".into()))?
            .extend(["spreadsheets", spreadsheet_id, "values"])
            .push(tail);
        Ok(url)
    }

    /// Read every value in `range` (e.g. `'Sheet1'` for the whole worksheet).
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<ValueRange> {
        let url = self.values_url(spreadsheet_id, range)?;
        tracing::debug!(spreadsheet_id, range, "Reading sheet values");

        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let values: ValueRange = resp.json().await?;
        tracing::debug!(rows = values.values.len(), "Read sheet values");
        Ok(values)
    }

    /// Write several ranges in one request. Google applies the whole batch or none of it.
    pub async fn batch_update(
        &self,
        spreadsheet_id: &str,
        input: ValueInputOption,
        data: &[ValueRange],
    ) -> Result<BatchUpdateResponse> {
        if data.is_empty() {
            return Ok(BatchUpdateResponse::default());
        }

        // `values:batchUpdate` is a custom method on the collection, not a range.
        let mut url = self.values_url(spreadsheet_id, "")?;
        url.set_path(&format!("{}:batchUpdate", url.path().trim_end_matches('/')));

        let body = BatchUpdateRequest {
            value_input_option: input,
            data,
        };

        tracing::debug!(spreadsheet_id, ranges = data.len(), "Writing sheet values");

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let updated: BatchUpdateResponse = resp.json().await?;
        tracing::debug!(cells = updated.total_updated_cells, "Sheet values written");
        Ok(updated)
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) if !envelope.error.status.is_empty() => {
            format!("{}: {}", envelope.error.status, envelope.error.message)
        }
        Ok(envelope) => envelope.error.message,
        Err(_) => body,
    };
    Err(SheetsError::Api {
        status: status.as_u16(),
        message,
    })
}
