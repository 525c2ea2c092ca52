//! Injectable text-completion backend
//!
//! The classifier and the draft generator consume this trait rather than a
//! process-wide model handle, so tests substitute a mock and production wires
//! exactly one backend instance through the pipeline.

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use crate::error::{MailError, Result};

/// Black-box text-completion service: prompt in, text out.
///
/// No structured schema is enforced here; callers own all parsing and must
/// tolerate malformed responses.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Production backend over the OpenAI chat-completion API.
///
/// Reads `OPENAI_API_KEY` from the environment, matching how credentials are
/// supplied elsewhere in this tool.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u16,
}

impl OpenAiBackend {
    pub fn new(model: impl Into<String>, max_tokens: u16) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            max_tokens,
        }
    }

    pub fn with_api_key(api_key: &str, model: impl Into<String>, max_tokens: u16) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.into(),
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| MailError::CompletionError(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .max_tokens(self.max_tokens)
            .messages([message.into()])
            .build()
            .map_err(|e| MailError::CompletionError(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| MailError::CompletionError(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        debug!(model = %self.model, chars = text.len(), "completion returned");
        Ok(text)
    }
}
