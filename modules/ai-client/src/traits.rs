use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// TextGenerator Trait
// =============================================================================

/// A single request/response exchange with a text-generation service.
///
/// Implemented by [`crate::OpenRouter`] and by scripted fakes in tests.
/// Also implemented for `Arc<G>` so a generator can be shared with assertions.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, messages: &[Message]) -> Result<String>;
}

#[async_trait]
impl<G: TextGenerator + ?Sized> TextGenerator for Arc<G> {
    async fn generate(&self, messages: &[Message]) -> Result<String> {
        (**self).generate(messages).await
    }
}
