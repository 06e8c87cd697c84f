//! Typed rows and results exchanged between the store, generator and parser.

use serde::{Deserialize, Serialize};

pub const TITLE: &str = "title";
pub const KEYWORDS: &str = "keywords";
pub const TRANSCRIPTION: &str = "transcription";
/// Accepted in place of `transcription` when that column is absent.
pub const TRANSCRIPT_ALIAS: &str = "transcript";

pub const ON_SCREEN_TITLE: &str = "on_screen_title";
pub const VIRAL_HOOK: &str = "viral_hook";
pub const CAPTION_BODY: &str = "caption_body";
pub const HASHTAGS: &str = "hashtags";
pub const FULL_CONTENT: &str = "full_content";

pub const INPUT_COLUMNS: [&str; 3] = [TITLE, KEYWORDS, TRANSCRIPTION];
pub const OUTPUT_COLUMNS: [&str; 5] = [ON_SCREEN_TITLE, VIRAL_HOOK, CAPTION_BODY, HASHTAGS, FULL_CONTENT];

/// The five derived columns of a row. Always written together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFields {
    pub on_screen_title: String,
    pub viral_hook: String,
    pub caption_body: String,
    pub hashtags: String,
    pub full_content: String,
}

impl OutputFields {
    /// Values in [`OUTPUT_COLUMNS`] order.
    pub fn values(&self) -> [&str; 5] {
        [
            &self.on_screen_title,
            &self.viral_hook,
            &self.caption_body,
            &self.hashtags,
            &self.full_content,
        ]
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &str)> {
        OUTPUT_COLUMNS.into_iter().zip(self.values())
    }

    /// Build from cells in [`OUTPUT_COLUMNS`] order.
    pub fn from_values(values: [String; 5]) -> Self {
        let [on_screen_title, viral_hook, caption_body, hashtags, full_content] = values;
        Self {
            on_screen_title,
            viral_hook,
            caption_body,
            hashtags,
            full_content,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| v.is_empty())
    }
}

/// One transcript and its derived content, as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// 0-based position among data rows (the header is not a data row).
    pub index: usize,
    pub title: String,
    pub keywords: String,
    pub transcription: String,
    pub output: OutputFields,
}

impl Row {
    pub fn new(
        index: usize,
        title: impl Into<String>,
        keywords: impl Into<String>,
        transcription: impl Into<String>,
    ) -> Self {
        Self {
            index,
            title: title.into(),
            keywords: keywords.into(),
            transcription: transcription.into(),
            output: OutputFields::default(),
        }
    }

    pub fn with_output(mut self, output: OutputFields) -> Self {
        self.output = output;
        self
    }

    /// A row is done once `full_content` holds anything.
    pub fn is_processed(&self) -> bool {
        !self.output.full_content.trim().is_empty()
    }

    /// Row number as shown in a spreadsheet UI (header is row 1).
    pub fn sheet_row_number(&self) -> usize {
        self.index + 2
    }
}

/// Sanitized inputs for one remote call. Built by [`crate::sanitize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub title: String,
    pub keywords: String,
    pub transcription: String,
}

/// Parsed output of one successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub on_screen_title: String,
    pub viral_hook: String,
    pub caption_body: String,
    pub hashtags: String,
    pub full_content: String,
}

impl GenerationResult {
    pub fn to_fields(&self) -> OutputFields {
        OutputFields {
            on_screen_title: self.on_screen_title.clone(),
            viral_hook: self.viral_hook.clone(),
            caption_body: self.caption_body.clone(),
            hashtags: self.hashtags.clone(),
            full_content: self.full_content.clone(),
        }
    }
}

impl From<GenerationResult> for OutputFields {
    fn from(result: GenerationResult) -> Self {
        Self {
            on_screen_title: result.on_screen_title,
            viral_hook: result.viral_hook,
            caption_body: result.caption_body,
            hashtags: result.hashtags,
            full_content: result.full_content,
        }
    }
}
