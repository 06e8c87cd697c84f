//! Row inputs → [`GenerationRequest`]: trimmed, control characters removed, length-capped.

use serde::{Deserialize, Serialize};

use crate::error::RowError;
use crate::types::{GenerationRequest, Row};

const TRUNCATION_MARK: &str = "...";

/// Character caps applied before a row is sent to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeLimits {
    pub max_title_chars: usize,
    pub max_keywords_chars: usize,
    pub max_transcription_chars: usize,
    /// Shorter transcriptions are rejected without a remote call.
    pub min_transcription_chars: usize,
}

impl Default for SanitizeLimits {
    fn default() -> Self {
        Self {
            max_title_chars: 200,
            max_keywords_chars: 500,
            max_transcription_chars: 8000,
            min_transcription_chars: 50,
        }
    }
}

/// Strip control characters (keeping newlines and tabs), normalize line endings, trim.
pub fn clean(value: &str) -> String {
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Cap `value` at `max_chars` characters, marking the cut with `...`.
pub fn cap(value: String, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value;
    }
    let mut capped: String = value.chars().take(max_chars).collect();
    capped.truncate(capped.trim_end().len());
    capped.push_str(TRUNCATION_MARK);
    capped
}

impl GenerationRequest {
    pub fn from_row(row: &Row, limits: &SanitizeLimits) -> Result<Self, RowError> {
        let transcription = clean(&row.transcription);
        let length = transcription.chars().count();
        if length == 0 {
            return Err(RowError::InvalidInput("transcription is empty".into()));
        }
        if length < limits.min_transcription_chars {
            return Err(RowError::InvalidInput(format!(
                "transcription too short ({length} chars, minimum {})",
                limits.min_transcription_chars
            )));
        }

        Ok(Self {
            title: cap(clean(&row.title), limits.max_title_chars),
            keywords: cap(clean(&row.keywords), limits.max_keywords_chars),
            transcription: cap(transcription, limits.max_transcription_chars),
        })
    }

    /// Characters that will be substituted into the prompt.
    pub fn input_chars(&self) -> usize {
        self.title.chars().count() + self.keywords.chars().count() + self.transcription.chars().count()
    }
}
