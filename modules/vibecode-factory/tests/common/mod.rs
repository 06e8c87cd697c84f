#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ai_client::{AiError, Message, TextGenerator};
use async_trait::async_trait;
use vibecode_factory::pacing::{PacingPolicy, RecordingPacer};
use vibecode_factory::retry::RetryPolicy;
use vibecode_factory::{BatchOrchestrator, GenerationClient, MemoryStore, Row, RunSettings};

/// Replays a fixed list of outcomes, one per call, and records the prompts.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, AiError>>>,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedGenerator {
    pub fn new(script: impl IntoIterator<Item = Result<String, AiError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, messages: &[Message]) -> ai_client::Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Config("script exhausted".into())))
    }
}

/// A well-formed labeled reply.
pub fn reply(title: &str) -> String {
    format!(
        "ON-SCREEN TITLE: {title}\n\
         HOOK: This changes everything.\n\
         CAPTION BODY: First line. Second line!\n\
         HASHTAGS: #ai #buildinpublic #vibecoding"
    )
}

pub fn expected_full_content(title: &str) -> String {
    format!(
        "{title}\n\nThis changes everything.\n\nFirst line.\n\nSecond line!\n\n\
         #ai #buildinpublic #vibecoding #vibecodefun #vibecoders"
    )
}

pub fn transcript(topic: &str) -> String {
    format!("So today I want to talk about {topic}. I shipped it in a weekend with an AI pair programmer and it worked.")
}

pub fn pending_row(title: &str) -> Row {
    Row::new(0, title, "ai, startups", transcript(title))
}

pub fn processed_row(title: &str) -> Row {
    let mut row = pending_row(title);
    row.output.full_content = "already written".into();
    row
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_secs(2),
        max_jitter: Duration::ZERO,
    }
}

pub fn client(
    generator: Arc<ScriptedGenerator>,
    pacer: Arc<RecordingPacer>,
) -> GenerationClient<Arc<ScriptedGenerator>> {
    GenerationClient::new(generator)
        .with_retry(fast_retry())
        .with_pacer(pacer)
}

/// Orchestrator over a shared memory store with every wait recorded.
pub fn orchestrator(
    store: Arc<MemoryStore>,
    generator: Arc<ScriptedGenerator>,
    pacer: Arc<RecordingPacer>,
    pacing: PacingPolicy,
) -> BatchOrchestrator<Arc<MemoryStore>, Arc<ScriptedGenerator>> {
    BatchOrchestrator::new(
        store,
        client(generator, pacer.clone()),
        RunSettings::builder().pacing(pacing).build(),
    )
    .with_pacer(pacer)
}
