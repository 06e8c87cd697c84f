//! One remote generation per row, bounded by a timeout and retried on
//! transient failures.

use std::sync::Arc;
use std::time::Duration;

use ai_client::{AiError, TextGenerator};
use tracing::debug;

use crate::error::GenerationError;
use crate::pacing::{Pacer, TokioPacer};
use crate::retry::{RetryError, RetryPolicy};
use crate::template::PromptTemplate;
use crate::types::GenerationRequest;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GenerationClient<G> {
    generator: G,
    template: PromptTemplate,
    retry: RetryPolicy,
    timeout: Duration,
    pacer: Arc<dyn Pacer>,
}

impl<G: TextGenerator> GenerationClient<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            template: PromptTemplate::default(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            pacer: Arc::new(TokioPacer),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where backoff waits go. Shared with the orchestrator in tests.
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Returns the raw completion text for `request`.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let messages = self.template.render(request);
        let messages = messages.as_slice();
        let generator = &self.generator;
        let timeout = self.timeout;

        let outcome = self
            .retry
            .run(self.pacer.as_ref(), AiError::is_transient, || async move {
                match tokio::time::timeout(timeout, generator.generate(messages)).await {
                    Ok(result) => result,
                    Err(_) => Err(AiError::Timeout(timeout)),
                }
            })
            .await;

        match outcome {
            Ok(text) => {
                debug!(chars = text.len(), "Generation succeeded");
                Ok(text)
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                Err(GenerationError::TransientServiceError {
                    attempts,
                    source: last,
                })
            }
            Err(RetryError::Aborted { error, .. }) => {
                Err(GenerationError::FatalServiceError { source: error })
            }
        }
    }
}
