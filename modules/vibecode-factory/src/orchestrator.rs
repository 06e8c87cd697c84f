//! Drives one run: load, filter, estimate, then generate row by row in
//! paced batches.

use std::sync::Arc;

use ai_client::TextGenerator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::approval::{AutoApprove, CostApproval};
use crate::error::{FactoryError, RowError};
use crate::estimate::{estimate, CostEstimate, CostRates};
use crate::generator::GenerationClient;
use crate::pacing::{Pacer, PacingPolicy, TokioPacer};
use crate::parser;
use crate::sanitize::SanitizeLimits;
use crate::store::RowStore;
use crate::template::PromptTemplate;
use crate::types::{GenerationRequest, OutputFields, Row, OUTPUT_COLUMNS};

/// Knobs for a run. Everything has a default.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RunSettings {
    #[builder(default)]
    pub pacing: PacingPolicy,
    #[builder(default)]
    pub limits: SanitizeLimits,
    #[builder(default)]
    pub rates: CostRates,
    /// Runs estimated above this many dollars need approval.
    #[builder(default = 5.0)]
    pub cost_threshold: f64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub index: usize,
    pub title: String,
    pub kind: &'static str,
    pub reason: String,
}

/// Summary of one run. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The cost gate said no; nothing was generated.
    pub declined: bool,
    pub estimate: CostEstimate,
    pub batch_size: usize,
    pub call_delay_ms: u64,
    pub batch_delay_ms: u64,
    pub failures: Vec<RowFailure>,
}

impl RunReport {
    fn start(settings: &RunSettings) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            total: 0,
            processed: 0,
            skipped: 0,
            failed: 0,
            declined: false,
            estimate: CostEstimate::default(),
            batch_size: settings.pacing.batch_size,
            call_delay_ms: settings.pacing.call_delay.as_millis() as u64,
            batch_delay_ms: settings.pacing.batch_delay.as_millis() as u64,
            failures: Vec::new(),
        }
    }
}

/// What `inspect` reports about a store.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub total: usize,
    pub processed: usize,
    pub pending: usize,
    /// Pending rows whose transcription would be rejected before generation.
    pub invalid: usize,
    /// Output columns with at least one filled cell.
    pub populated_outputs: Vec<&'static str>,
    pub estimate: CostEstimate,
}

/// Rows still needing content, in store order. Rows with `full_content` are skipped.
pub fn pending_rows(rows: &[Row]) -> Vec<&Row> {
    rows.iter().filter(|row| !row.is_processed()).collect()
}

pub struct BatchOrchestrator<S, G> {
    store: S,
    client: GenerationClient<G>,
    settings: RunSettings,
    approval: Arc<dyn CostApproval>,
    pacer: Arc<dyn Pacer>,
}

impl<S: RowStore, G: TextGenerator> BatchOrchestrator<S, G> {
    pub fn new(store: S, client: GenerationClient<G>, settings: RunSettings) -> Self {
        Self {
            store,
            client,
            settings,
            approval: Arc::new(AutoApprove),
            pacer: Arc::new(TokioPacer),
        }
    }

    pub fn with_approval(mut self, approval: Arc<dyn CostApproval>) -> Self {
        self.approval = approval;
        self
    }

    /// Where batch and call delays go.
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process every pending row. Only a failure to load the store is an error;
    /// per-row failures are counted in the report.
    pub async fn run(&self) -> Result<RunReport, FactoryError> {
        let mut report = RunReport::start(&self.settings);
        info!(run_id = %report.run_id, "Starting run");

        let rows = self.store.read_all().await?;
        let pending = pending_rows(&rows);
        report.total = rows.len();
        report.skipped = rows.len() - pending.len();
        info!(
            run_id = %report.run_id,
            total = report.total,
            pending = pending.len(),
            skipped = report.skipped,
            "Loaded rows"
        );

        report.estimate = self.estimate(&pending);
        if pending.is_empty() {
            info!("Nothing to process");
            report.finished_at = Utc::now();
            return Ok(report);
        }

        if report.estimate.exceeds(self.settings.cost_threshold) && !self.approved(&report).await {
            warn!(
                cost_usd = report.estimate.cost_usd,
                threshold = self.settings.cost_threshold,
                "Run declined at cost gate"
            );
            report.declined = true;
            report.finished_at = Utc::now();
            return Ok(report);
        }

        let pacing = self.settings.pacing;
        let batches = pacing.batch_count(pending.len());
        for (batch_no, batch) in pacing.batches(&pending).enumerate() {
            info!(batch = batch_no + 1, of = batches, rows = batch.len(), "Processing batch");

            for (position, row) in batch.iter().enumerate() {
                if let Some(delay) = pacing.delay_before(batch_no, position) {
                    self.pacer.pause(delay).await;
                }

                match self.process_row(row).await {
                    Ok(()) => {
                        report.processed += 1;
                        info!(row = row.index, title = %row.title, "Row processed");
                    }
                    Err(err) => {
                        report.failed += 1;
                        error!(
                            row = row.index,
                            title = %row.title,
                            kind = err.kind(),
                            error = %err,
                            "Row failed"
                        );
                        report.failures.push(RowFailure {
                            index: row.index,
                            title: row.title.clone(),
                            kind: err.kind(),
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }

        report.finished_at = Utc::now();
        info!(
            run_id = %report.run_id,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "Run complete"
        );
        Ok(report)
    }

    /// Sanitize, generate, parse and write one row. The row is only written
    /// when every earlier step succeeded.
    pub async fn process_row(&self, row: &Row) -> Result<(), RowError> {
        let request = GenerationRequest::from_row(row, &self.settings.limits)?;
        let raw = self.client.generate(&request).await?;
        let result = parser::parse(&raw)?;
        self.store
            .write_fields(row.index, &OutputFields::from(result))
            .await?;
        Ok(())
    }

    fn estimate(&self, pending: &[&Row]) -> CostEstimate {
        estimate(
            pending.iter().copied(),
            self.client.template().overhead_chars(),
            &self.settings.rates,
        )
    }

    async fn approved(&self, report: &RunReport) -> bool {
        match self.approval.approve(&report.estimate).await {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "Cost approval failed, treating as declined");
                false
            }
        }
    }
}

/// Load `store` and summarize it without generating anything.
pub async fn inspect<S: RowStore + ?Sized>(
    store: &S,
    template: &PromptTemplate,
    settings: &RunSettings,
) -> Result<InspectReport, FactoryError> {
    let rows = store.read_all().await?;
    let pending = pending_rows(&rows);

    let invalid = pending
        .iter()
        .filter(|row| GenerationRequest::from_row(row, &settings.limits).is_err())
        .count();
    let populated_outputs = OUTPUT_COLUMNS
        .iter()
        .enumerate()
        .filter(|(i, _)| rows.iter().any(|row| !row.output.values()[*i].trim().is_empty()))
        .map(|(_, name)| *name)
        .collect();

    Ok(InspectReport {
        total: rows.len(),
        processed: rows.len() - pending.len(),
        pending: pending.len(),
        invalid,
        populated_outputs,
        estimate: estimate(
            pending.iter().copied(),
            template.overhead_chars(),
            &settings.rates,
        ),
    })
}
