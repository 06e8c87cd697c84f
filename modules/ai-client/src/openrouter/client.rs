use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use super::types::*;
use crate::error::{AiError, Result};

pub(crate) const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1";

pub(crate) struct OpenRouterClient {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    app_name: Option<String>,
    site_url: Option<String>,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            http,
            base_url: OPENROUTER_API_URL.to_string(),
            app_name: None,
            site_url: None,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    pub fn with_site_url(mut self, url: &str) -> Self {
        self.site_url = Some(url.to_string());
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| AiError::Config("API key contains invalid header characters".into()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref url) = self.site_url {
            if let Ok(val) = HeaderValue::from_str(url) {
                headers.insert("HTTP-Referer", val);
            }
        }

        if let Some(ref name) = self.app_name {
            if let Ok(val) = HeaderValue::from_str(name) {
                headers.insert("X-Title", val);
            }
        }

        Ok(headers)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %request.model, messages = request.messages.len(), "OpenRouter chat request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let chat: ChatResponse = serde_json::from_str(&body)?;

        if let Some(ref usage) = chat.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "OpenRouter usage"
            );
        }
        if let Some(reason) = chat.choices.first().and_then(|c| c.finish_reason.as_deref()) {
            debug!(finish_reason = reason, "OpenRouter completion finished");
        }

        Ok(chat)
    }
}
