//! End-to-end runs over an in-memory store with a scripted generator.

mod common;

use std::sync::Arc;
use std::time::Duration;

use ai_client::AiError;
use vibecode_factory::approval::{AutoDecline, CostApproval};
use vibecode_factory::estimate::CostEstimate;
use vibecode_factory::pacing::{PacingPolicy, RecordingPacer};
use vibecode_factory::parser::BRAND_HASHTAGS;
use vibecode_factory::{
    inspect, FactoryError, MemoryStore, PromptTemplate, Row, RunSettings, StoreError,
};

use common::{
    client, expected_full_content, orchestrator, pending_row, processed_row, reply,
    ScriptedGenerator,
};

fn default_pacing() -> PacingPolicy {
    PacingPolicy {
        batch_size: 3,
        call_delay: Duration::from_secs(1),
        batch_delay: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn three_row_scenario() {
    let store = Arc::new(MemoryStore::from_rows([
        processed_row("A"),
        pending_row("B"),
        pending_row("C"),
    ]));
    let rate_limited = || -> Result<String, AiError> {
        Err(AiError::Api {
            status: 429,
            message: "Rate limit exceeded".into(),
        })
    };
    let generator = ScriptedGenerator::new([
        Ok(reply("B rules")),
        rate_limited(),
        rate_limited(),
        rate_limited(),
    ]);
    let pacer = Arc::new(RecordingPacer::new());

    let report = orchestrator(store.clone(), generator.clone(), pacer.clone(), default_pacing())
        .run()
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 1);
    assert!(!report.declined);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert_eq!(report.failures[0].kind, "transient_service_error");

    let rows = store.rows();
    assert_eq!(rows[0].output.full_content, "already written");
    assert_eq!(rows[1].output.on_screen_title, "B rules");
    assert_eq!(rows[1].output.viral_hook, "This changes everything.");
    assert_eq!(rows[1].output.caption_body, "First line.\n\nSecond line!");
    assert_eq!(rows[1].output.full_content, expected_full_content("B rules"));
    assert!(rows[2].output.is_empty());
    assert_eq!(generator.calls(), 4);
    // Call delay between B and C, then two backoffs for C.
    assert_eq!(
        pacer.pauses(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
        ]
    );
}

#[tokio::test]
async fn fatal_error_fails_the_row_without_retrying() {
    let store = Arc::new(MemoryStore::from_rows([pending_row("A"), pending_row("B")]));
    let generator = ScriptedGenerator::new([
        Err(AiError::Api {
            status: 400,
            message: "context length exceeded".into(),
        }),
        Ok(reply("B")),
    ]);
    let pacer = Arc::new(RecordingPacer::new());

    let report = orchestrator(store.clone(), generator.clone(), pacer.clone(), default_pacing())
        .run()
        .await
        .unwrap();

    assert_eq!((report.processed, report.failed), (1, 1));
    assert_eq!(report.failures[0].kind, "fatal_service_error");
    assert_eq!(generator.calls(), 2);
    assert_eq!(pacer.pauses(), vec![Duration::from_secs(1)]);
    assert!(store.rows()[0].output.is_empty());
}

#[tokio::test]
async fn second_run_processes_nothing() {
    let store = Arc::new(MemoryStore::from_rows([pending_row("A"), pending_row("B")]));
    let generator = ScriptedGenerator::new([Ok(reply("A")), Ok(reply("B"))]);
    let pacer = Arc::new(RecordingPacer::new());
    let orchestrator = orchestrator(store.clone(), generator.clone(), pacer, default_pacing());

    let first = orchestrator.run().await.unwrap();
    assert_eq!(first.processed, 2);
    let after_first = store.rows();

    let second = orchestrator.run().await.unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.failed, 0);
    assert_eq!(second.estimate.rows, 0);
    assert_ne!(first.run_id, second.run_id);

    assert_eq!(generator.calls(), 2);
    assert_eq!(store.write_count(), 2);
    assert_eq!(store.rows(), after_first);
}

#[tokio::test]
async fn missing_section_leaves_row_untouched() {
    let store = Arc::new(MemoryStore::from_rows([pending_row("A"), pending_row("B")]));
    let generator = ScriptedGenerator::new([
        Ok("ON-SCREEN TITLE: A\nHOOK: wait for it\nHASHTAGS: #ai".to_string()),
        Ok(reply("B")),
    ]);
    let pacer = Arc::new(RecordingPacer::new());

    let report = orchestrator(store.clone(), generator, pacer, default_pacing())
        .run()
        .await
        .unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].kind, "unparseable_response");
    assert!(report.failures[0].reason.contains("caption body"));

    let rows = store.rows();
    assert!(rows[0].output.is_empty());
    assert!(rows[1].is_processed());
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn brand_tags_appear_exactly_once() {
    let store = Arc::new(MemoryStore::from_rows([pending_row("A")]));
    let generator = ScriptedGenerator::new([Ok("ON-SCREEN TITLE: A\n\
         HOOK: b\n\
         CAPTION: c.\n\
         HASHTAGS: #vibecoders #VibeCoding #ai #vibecodefun #vibecoding"
        .to_string())]);
    let pacer = Arc::new(RecordingPacer::new());

    orchestrator(store.clone(), generator, pacer, default_pacing())
        .run()
        .await
        .unwrap();

    let hashtags = store.rows()[0].output.hashtags.clone();
    assert_eq!(hashtags, "#ai #vibecoding #vibecodefun #vibecoders");
    for tag in BRAND_HASHTAGS {
        let count = hashtags
            .split(' ')
            .filter(|t| t.eq_ignore_ascii_case(tag))
            .count();
        assert_eq!(count, 1, "{tag}");
    }
}

#[tokio::test]
async fn invalid_input_and_write_failures_are_counted() {
    let short = Row::new(0, "Short", "", "too short");
    let store = Arc::new(
        MemoryStore::from_rows([short, pending_row("B"), pending_row("C")]).fail_writes_for([1]),
    );
    let generator = ScriptedGenerator::new([Ok(reply("B")), Ok(reply("C"))]);
    let pacer = Arc::new(RecordingPacer::new());

    let report = orchestrator(store.clone(), generator.clone(), pacer, default_pacing())
        .run()
        .await
        .unwrap();

    let kinds: Vec<_> = report.failures.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec!["invalid_input", "write_failed"]);
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 2);
    // The short row never reaches the generator.
    assert_eq!(generator.calls(), 2);
    assert!(store.rows()[1].output.is_empty());
    assert!(store.rows()[2].is_processed());
}

#[tokio::test]
async fn batches_are_paced() {
    let rows = ["A", "B", "C", "D", "E"].map(pending_row);
    let store = Arc::new(MemoryStore::from_rows(rows));
    let generator = ScriptedGenerator::new(["A", "B", "C", "D", "E"].map(|t| Ok(reply(t))));
    let pacer = Arc::new(RecordingPacer::new());
    let pacing = PacingPolicy {
        batch_size: 2,
        call_delay: Duration::from_millis(100),
        batch_delay: Duration::from_millis(500),
    };

    let report = orchestrator(store, generator, pacer.clone(), pacing)
        .run()
        .await
        .unwrap();

    assert_eq!(report.processed, 5);
    assert_eq!(report.batch_size, 2);
    assert_eq!(
        pacer.pauses(),
        vec![
            Duration::from_millis(100),
            Duration::from_millis(500),
            Duration::from_millis(100),
            Duration::from_millis(500),
        ]
    );
}

#[tokio::test]
async fn unavailable_store_is_fatal() {
    let store = Arc::new(MemoryStore::unavailable("403 PERMISSION_DENIED"));
    let generator = ScriptedGenerator::new([]);
    let pacer = Arc::new(RecordingPacer::new());

    let err = orchestrator(store, generator.clone(), pacer, default_pacing())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FactoryError::Store(StoreError::StoreUnavailable(_))
    ));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn schema_mismatch_is_fatal() {
    let store = Arc::new(
        MemoryStore::from_rows([pending_row("A")]).with_header(&["title", "notes", "transcript"]),
    );
    let generator = ScriptedGenerator::new([]);
    let pacer = Arc::new(RecordingPacer::new());

    let err = orchestrator(store, generator, pacer, default_pacing())
        .run()
        .await
        .unwrap_err();

    match err {
        FactoryError::Store(StoreError::SchemaMismatch { missing, .. }) => {
            assert_eq!(missing, vec!["keywords"]);
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

struct Failing;

#[async_trait::async_trait]
impl CostApproval for Failing {
    async fn approve(&self, _estimate: &CostEstimate) -> anyhow::Result<bool> {
        anyhow::bail!("not a terminal")
    }
}

async fn gated_run(approval: Arc<dyn CostApproval>) -> (vibecode_factory::RunReport, usize, usize) {
    let store = Arc::new(MemoryStore::from_rows([pending_row("A"), pending_row("B")]));
    let generator = ScriptedGenerator::new([Ok(reply("A")), Ok(reply("B"))]);
    let pacer = Arc::new(RecordingPacer::new());

    let report = vibecode_factory::BatchOrchestrator::new(
        store.clone(),
        client(generator.clone(), pacer.clone()),
        RunSettings::builder()
            .pacing(default_pacing())
            .cost_threshold(0.0)
            .build(),
    )
    .with_pacer(pacer)
    .with_approval(approval)
    .run()
    .await
    .unwrap();

    (report, generator.calls(), store.write_count())
}

#[tokio::test]
async fn declined_cost_gate_processes_nothing() {
    let (report, calls, writes) = gated_run(Arc::new(AutoDecline)).await;

    assert!(report.declined);
    assert_eq!(report.processed, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.estimate.rows, 2);
    assert!(report.estimate.cost_usd > 0.0);
    assert_eq!((calls, writes), (0, 0));
}

#[tokio::test]
async fn failed_approval_counts_as_declined() {
    let (report, calls, _) = gated_run(Arc::new(Failing)).await;
    assert!(report.declined);
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn approved_gate_runs_normally() {
    let (report, calls, writes) =
        gated_run(Arc::new(vibecode_factory::approval::AutoApprove)).await;
    assert!(!report.declined);
    assert_eq!(report.processed, 2);
    assert_eq!((calls, writes), (2, 2));
}

#[tokio::test]
async fn inspect_reports_without_generating() {
    let short = Row::new(0, "Short", "", "tiny");
    let store = MemoryStore::from_rows([processed_row("A"), pending_row("B"), short]);

    let report = inspect(&store, &PromptTemplate::default(), &RunSettings::default())
        .await
        .unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 1);
    assert_eq!(report.pending, 2);
    assert_eq!(report.invalid, 1);
    assert_eq!(report.populated_outputs, vec!["full_content"]);
    assert_eq!(report.estimate.rows, 2);
}
