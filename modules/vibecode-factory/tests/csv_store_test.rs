//! A full run against a CSV file on disk.

mod common;

use std::sync::Arc;

use vibecode_factory::pacing::{PacingPolicy, RecordingPacer};
use vibecode_factory::{BatchOrchestrator, CsvStore, RowStore, RunSettings};

use common::{client, expected_full_content, reply, transcript, ScriptedGenerator};

#[tokio::test]
async fn run_writes_outputs_back_to_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("videos.csv");
    let contents = format!(
        "Title,Keywords,Transcription,full_content\n\
         Done already,ai,\"{}\",old copy\n\
         Fresh one,\"ai, mvp\",\"{}\",\n",
        transcript("done"),
        transcript("fresh"),
    );
    std::fs::write(&path, contents).unwrap();

    let generator = ScriptedGenerator::new([Ok(reply("Fresh title"))]);
    let pacer = Arc::new(RecordingPacer::new());
    let orchestrator = BatchOrchestrator::new(
        CsvStore::new(&path),
        client(generator.clone(), pacer.clone()),
        RunSettings::builder()
            .pacing(PacingPolicy::default())
            .build(),
    )
    .with_pacer(pacer);

    let report = orchestrator.run().await.unwrap();
    assert_eq!((report.processed, report.skipped, report.failed), (1, 1, 0));

    let rows = CsvStore::new(&path).read_all().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].output.full_content, "old copy");
    assert!(rows[0].output.on_screen_title.is_empty());
    assert_eq!(rows[1].keywords, "ai, mvp");
    assert_eq!(rows[1].output.on_screen_title, "Fresh title");
    assert_eq!(rows[1].output.full_content, expected_full_content("Fresh title"));

    let header = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .to_string();
    assert_eq!(
        header,
        "Title,Keywords,Transcription,full_content,on_screen_title,viral_hook,caption_body,hashtags"
    );

    // Nothing left to do on a rerun.
    let again = orchestrator.run().await.unwrap();
    assert_eq!((again.processed, again.skipped), (0, 2));
    assert_eq!(generator.calls(), 1);
}
