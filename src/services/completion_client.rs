use std::{sync::Arc, time::Duration};

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::models::domain::{PromptSpec, SamplingConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("model returned no content")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("no completion model configured")]
    NoModels,

    #[error("all {models} model(s) failed across {passes} pass(es)")]
    AllModelsExhausted { models: usize, passes: u32 },

    #[error("completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("completion worker pool closed")]
    WorkerPoolClosed,
}

/// One text completion against one model. Implementations do no retrying.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        sampling: &SamplingConfig,
    ) -> Result<String, BackendError>;
}

/// Backend for any OpenAI-compatible chat completion endpoint.
pub struct OpenAiCompatibleBackend {
    client: Client<OpenAIConfig>,
}

impl OpenAiCompatibleBackend {
    pub fn new(api_key: &SecretString, api_base: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(api_base);

        Self {
            client: Client::with_config(config),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompatibleBackend {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        sampling: &SamplingConfig,
    ) -> Result<String, BackendError> {
        let user_message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(model)
            .messages(vec![ChatCompletionRequestMessage::User(user_message)])
            .temperature(sampling.temperature)
            .top_p(sampling.top_p)
            .max_tokens(sampling.max_output_tokens);
        if sampling.json_response {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let request = builder.build()?;

        let response = self.client.chat().create(request).await?;

        let text: String = response
            .choices
            .iter()
            .filter_map(|choice| choice.message.content.as_deref())
            .collect();

        if text.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        Ok(text)
    }
}

impl From<OpenAIError> for BackendError {
    fn from(err: OpenAIError) -> Self {
        let message = err.to_string();
        if is_quota_signal(&message) {
            BackendError::QuotaExhausted(message)
        } else {
            BackendError::Request(message)
        }
    }
}

/// Whether an upstream error message reports quota or rate exhaustion.
pub fn is_quota_signal(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    ["quota", "resource_exhausted", "resource exhausted", "rate limit", "429"]
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Issues a prompt against an ordered list of models until one answers with text.
pub struct CompletionClient {
    backend: Arc<dyn CompletionBackend>,
    models: Vec<String>,
    passes: u32,
    pass_pause: Duration,
}

impl CompletionClient {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        models: Vec<String>,
        passes: u32,
        pass_pause: Duration,
    ) -> Self {
        Self {
            backend,
            models,
            passes: passes.max(1),
            pass_pause,
        }
    }

    pub async fn complete(&self, prompt: &PromptSpec) -> Result<String, CompletionError> {
        if self.models.is_empty() {
            return Err(CompletionError::NoModels);
        }

        for pass in 1..=self.passes {
            for model in &self.models {
                log::info!("Trying model {} (pass {}/{})", model, pass, self.passes);

                match self
                    .backend
                    .complete(model, &prompt.instruction, &prompt.sampling)
                    .await
                {
                    Ok(text) if !text.trim().is_empty() => {
                        log::debug!("Model {} answered with {} bytes", model, text.len());
                        return Ok(text.trim().to_string());
                    }
                    Ok(_) | Err(BackendError::EmptyResponse) => {
                        log::warn!("Model {} returned empty content", model)
                    }
                    Err(BackendError::QuotaExhausted(_)) => {
                        log::warn!("Model {} quota exhausted", model)
                    }
                    Err(err) => log::warn!("Model {} failed: {}", model, err),
                }
            }

            if pass < self.passes {
                tokio::time::sleep(self.pass_pause).await;
            }
        }

        Err(CompletionError::AllModelsExhausted {
            models: self.models.len(),
            passes: self.passes,
        })
    }
}
