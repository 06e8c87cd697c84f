mod client;
pub(crate) mod types;

use async_trait::async_trait;

use crate::error::{AiError, Result};
use crate::traits::{Message, TextGenerator};
use client::OpenRouterClient;

const DEFAULT_MAX_TOKENS: u32 = 1000;

// =============================================================================
// OpenRouter Agent
// =============================================================================

#[derive(Clone)]
pub struct OpenRouter {
    api_key: String,
    pub(crate) model: String,
    app_name: Option<String>,
    site_url: Option<String>,
    base_url: Option<String>,
    max_tokens: u32,
    temperature: Option<f32>,
    http: reqwest::Client,
}

impl OpenRouter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            app_name: None,
            site_url: None,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| AiError::Config("OPENROUTER_API_KEY environment variable not set".into()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = Some(url.into());
        self
    }

    /// Point at an OpenAI-compatible endpoint other than openrouter.ai.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> OpenRouterClient {
        let mut client = OpenRouterClient::new(&self.api_key, self.http.clone());
        if let Some(ref url) = self.base_url {
            client = client.with_base_url(url);
        }
        if let Some(ref name) = self.app_name {
            client = client.with_app_name(name);
        }
        if let Some(ref url) = self.site_url {
            client = client.with_site_url(url);
        }
        client
    }

    /// Simple chat completion.
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        self.generate(&[Message::system(system), Message::user(user)])
            .await
    }
}

// =============================================================================
// TextGenerator Implementation
// =============================================================================

#[async_trait]
impl TextGenerator for OpenRouter {
    async fn generate(&self, messages: &[Message]) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(AiError::Config("OpenRouter API key is empty".into()));
        }

        let request = types::ChatRequest::new(&self.model)
            .messages(messages)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature);

        self.client()
            .chat(&request)
            .await?
            .into_text()
            .ok_or(AiError::EmptyResponse)
    }
}
