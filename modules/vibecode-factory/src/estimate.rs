//! Pre-run cost and duration estimate.

use serde::Serialize;

use crate::types::Row;

/// Pricing used for the estimate. Defaults match the default model's list price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostRates {
    pub chars_per_token: usize,
    pub output_tokens_per_row: u64,
    pub input_usd_per_million: f64,
    pub output_usd_per_million: f64,
    pub minutes_per_row: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            chars_per_token: 4,
            output_tokens_per_row: 200,
            input_usd_per_million: 3.0,
            output_usd_per_million: 15.0,
            minutes_per_row: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostEstimate {
    pub rows: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub minutes: f64,
}

impl CostEstimate {
    pub fn exceeds(&self, threshold_usd: f64) -> bool {
        self.cost_usd > threshold_usd
    }
}

/// Estimate the cost of generating content for `rows`.
///
/// `template_chars` is the fixed prompt text sent with every row.
pub fn estimate<'a>(
    rows: impl IntoIterator<Item = &'a Row>,
    template_chars: usize,
    rates: &CostRates,
) -> CostEstimate {
    let (count, chars) = rows.into_iter().fold((0usize, 0usize), |(count, chars), row| {
        let row_chars = row.title.chars().count()
            + row.keywords.chars().count()
            + row.transcription.chars().count();
        (count + 1, chars + row_chars + template_chars)
    });

    let input_tokens = (chars / rates.chars_per_token.max(1)) as u64;
    let output_tokens = rates.output_tokens_per_row * count as u64;
    let cost_usd = input_tokens as f64 * rates.input_usd_per_million / 1_000_000.0
        + output_tokens as f64 * rates.output_usd_per_million / 1_000_000.0;

    CostEstimate {
        rows: count,
        input_tokens,
        output_tokens,
        cost_usd,
        minutes: count as f64 * rates.minutes_per_row,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_costs_nothing() {
        let est = estimate(Vec::<Row>::new().iter(), 1000, &CostRates::default());
        assert_eq!(est, CostEstimate::default());
        assert!(!est.exceeds(5.0));
    }

    #[test]
    fn counts_tokens_from_characters() {
        let rows = vec![
            Row::new(0, "abcd", "efgh", "x".repeat(392)),
            Row::new(1, "", "", "y".repeat(400)),
        ];
        let est = estimate(&rows, 0, &CostRates::default());

        assert_eq!(est.rows, 2);
        assert_eq!(est.input_tokens, 200);
        assert_eq!(est.output_tokens, 400);
        // 200 * 3 / 1M + 400 * 15 / 1M
        assert!((est.cost_usd - 0.0066).abs() < 1e-9);
        assert!((est.minutes - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn template_is_charged_per_row() {
        let rows = vec![Row::new(0, "", "", ""), Row::new(1, "", "", "")];
        let est = estimate(&rows, 400, &CostRates::default());
        assert_eq!(est.input_tokens, 200);
    }

    #[test]
    fn threshold_is_strict() {
        let est = CostEstimate {
            cost_usd: 5.0,
            ..Default::default()
        };
        assert!(!est.exceeds(5.0));
        assert!(est.exceeds(4.99));
    }
}
