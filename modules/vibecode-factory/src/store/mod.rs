//! Where rows come from and where generated fields go.

mod csv_file;
mod memory;
mod sheets;

pub use csv_file::CsvStore;
pub use memory::MemoryStore;
pub use sheets::SheetsStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{
    OutputFields, Row, INPUT_COLUMNS, KEYWORDS, OUTPUT_COLUMNS, TITLE, TRANSCRIPTION,
    TRANSCRIPT_ALIAS,
};

/// A table of rows with a header line.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Every data row in table order, with output fields as currently stored.
    async fn read_all(&self) -> Result<Vec<Row>, StoreError>;

    /// Write the five output cells of data row `index` in one operation.
    async fn write_fields(&self, index: usize, fields: &OutputFields) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: RowStore + ?Sized> RowStore for Arc<S> {
    async fn read_all(&self) -> Result<Vec<Row>, StoreError> {
        (**self).read_all().await
    }

    async fn write_fields(&self, index: usize, fields: &OutputFields) -> Result<(), StoreError> {
        (**self).write_fields(index, fields).await
    }
}

/// Column positions resolved from a header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    header: Vec<String>,
    title: usize,
    keywords: usize,
    transcription: usize,
    outputs: [Option<usize>; 5],
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ColumnLayout {
    /// Resolve columns by trimmed, case-insensitive name. `transcript` stands in
    /// for `transcription` when the latter is absent.
    pub fn from_header(header: &[String]) -> Result<Self, StoreError> {
        let names: Vec<String> = header.iter().map(|h| normalize(h)).collect();
        let find = |name: &str| names.iter().position(|n| n == name);

        let title = find(TITLE);
        let keywords = find(KEYWORDS);
        let transcription = find(TRANSCRIPTION).or_else(|| find(TRANSCRIPT_ALIAS));

        let (Some(title), Some(keywords), Some(transcription)) = (title, keywords, transcription)
        else {
            let missing = INPUT_COLUMNS
                .iter()
                .zip([title, keywords, transcription])
                .filter(|(_, found)| found.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(StoreError::SchemaMismatch {
                missing,
                found: header.iter().map(|h| h.trim().to_string()).collect(),
            });
        };

        Ok(Self {
            header: header.to_vec(),
            title,
            keywords,
            transcription,
            outputs: OUTPUT_COLUMNS.map(find),
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Build data row `index` from its cells. Missing trailing cells read as empty.
    pub fn row_from_cells(&self, index: usize, cells: &[String]) -> Row {
        let cell = |col: Option<usize>| {
            col.and_then(|c| cells.get(c))
                .cloned()
                .unwrap_or_default()
        };
        let output = OutputFields::from_values(self.outputs.map(cell));
        Row::new(
            index,
            cell(Some(self.title)),
            cell(Some(self.keywords)),
            cell(Some(self.transcription)),
        )
        .with_output(output)
    }

    /// Append any missing output columns to the header.
    ///
    /// Returns the `(column, name)` pairs that were added, so the caller can
    /// persist the new header cells.
    pub fn ensure_outputs(&mut self) -> Vec<(usize, &'static str)> {
        let mut added = Vec::new();
        for (slot, name) in self.outputs.iter_mut().zip(OUTPUT_COLUMNS) {
            if slot.is_none() {
                let column = self.header.len();
                self.header.push(name.to_string());
                *slot = Some(column);
                added.push((column, name));
            }
        }
        added
    }

    /// Output column positions, once [`Self::ensure_outputs`] has run.
    pub fn output_columns(&self) -> Option<[usize; 5]> {
        let [a, b, c, d, e] = self.outputs;
        Some([a?, b?, c?, d?, e?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn matches_names_loosely() {
        let layout =
            ColumnLayout::from_header(&header(&[" Title ", "KEYWORDS", "Transcript", "notes"]))
                .unwrap();
        let row = layout.row_from_cells(4, &header(&["t", "k", "body"]));

        assert_eq!(row.index, 4);
        assert_eq!(row.title, "t");
        assert_eq!(row.keywords, "k");
        assert_eq!(row.transcription, "body");
        assert!(row.output.is_empty());
    }

    #[test]
    fn transcription_wins_over_alias() {
        let layout =
            ColumnLayout::from_header(&header(&["transcript", "title", "keywords", "transcription"]))
                .unwrap();
        let row = layout.row_from_cells(0, &header(&["old", "t", "k", "new"]));
        assert_eq!(row.transcription, "new");
    }

    #[test]
    fn reports_missing_columns() {
        let err = ColumnLayout::from_header(&header(&["title", "body"])).unwrap_err();
        match err {
            StoreError::SchemaMismatch { missing, found } => {
                assert_eq!(missing, vec!["keywords", "transcription"]);
                assert_eq!(found, vec!["title", "body"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reads_existing_outputs() {
        let layout = ColumnLayout::from_header(&header(&[
            "title",
            "keywords",
            "transcription",
            "full_content",
        ]))
        .unwrap();
        let row = layout.row_from_cells(0, &header(&["t", "k", "x", "done"]));
        assert!(row.is_processed());
        assert_eq!(layout.output_columns(), None);
    }

    #[test]
    fn appends_missing_outputs_once() {
        let mut layout = ColumnLayout::from_header(&header(&[
            "title",
            "keywords",
            "transcription",
            "hashtags",
        ]))
        .unwrap();

        let added = layout.ensure_outputs();
        assert_eq!(
            added,
            vec![
                (4, "on_screen_title"),
                (5, "viral_hook"),
                (6, "caption_body"),
                (7, "full_content"),
            ]
        );
        assert_eq!(layout.output_columns(), Some([4, 5, 6, 3, 7]));
        assert_eq!(layout.width(), 8);
        assert!(layout.ensure_outputs().is_empty());
    }
}
