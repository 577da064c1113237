//! Boundary to the hosted text-completion service.
//!
//! Pipelines only see the [`CompletionClient`] trait. The production
//! implementation goes through rig's provider clients; tests plug in a
//! scripted double.

use std::time::Instant;

use async_trait::async_trait;
use rig::{
    client::CompletionClient as _,
    completion::{Prompt, PromptError},
    providers::{groq, openrouter},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{LlmConfig, Provider};

/// Failure kinds reported by a completion call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// Network-level failure reaching the provider
    #[error("transport error: {0}")]
    Transport(String),
    /// The provider answered with an error (auth, quota, bad request, malformed reply)
    #[error("service error: {0}")]
    Service(String),
    #[error("completion client misconfigured: {0}")]
    Configuration(String),
}

/// Generation parameters sent with every prompt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

impl From<&LlmConfig> for CompletionOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send a fully rendered prompt and return the raw response text
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError>;
}

enum Backend {
    Groq(groq::Client),
    OpenRouter(openrouter::Client),
}

/// Completion client backed by a rig provider. Built once at startup and shared.
pub struct RigCompletionClient {
    backend: Backend,
}

impl RigCompletionClient {
    pub fn new(provider: Provider, api_key: &str) -> Result<Self, CompletionError> {
        if api_key.trim().is_empty() {
            return Err(CompletionError::Configuration(format!(
                "empty API key for provider {provider}"
            )));
        }
        let backend = match provider {
            Provider::Groq => Backend::Groq(groq::Client::new(api_key)),
            Provider::OpenRouter => Backend::OpenRouter(openrouter::Client::new(api_key)),
        };
        Ok(Self { backend })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, CompletionError> {
        Self::new(config.provider, &config.api_key)
    }
}

#[async_trait]
impl CompletionClient for RigCompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let started = Instant::now();
        debug!(model = %options.model, prompt_chars = prompt.len(), "sending completion request");

        let response = match &self.backend {
            Backend::Groq(client) => {
                let agent = client
                    .agent(&options.model)
                    .temperature(options.temperature)
                    .max_tokens(options.max_tokens)
                    .build();
                agent.prompt(prompt).await
            }
            Backend::OpenRouter(client) => {
                let agent = client
                    .agent(&options.model)
                    .temperature(options.temperature)
                    .max_tokens(options.max_tokens)
                    .build();
                agent.prompt(prompt).await
            }
        };

        match response {
            Ok(text) => {
                debug!(
                    model = %options.model,
                    response_chars = text.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "completion received"
                );
                Ok(text)
            }
            Err(e) => {
                warn!(model = %options.model, error = %e, "completion request failed");
                Err(classify_prompt_error(e))
            }
        }
    }
}

fn classify_prompt_error(err: PromptError) -> CompletionError {
    match err {
        PromptError::CompletionError(rig::completion::CompletionError::HttpError(e)) => {
            CompletionError::Transport(e.to_string())
        }
        other => CompletionError::Service(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_api_key() {
        let err = RigCompletionClient::new(Provider::Groq, "  ")
            .err()
            .expect("blank key must be rejected");
        assert!(matches!(err, CompletionError::Configuration(msg) if msg.contains("groq")));
    }

    #[test]
    fn options_follow_llm_config() {
        let config = LlmConfig {
            provider: Provider::OpenRouter,
            api_key: "key".to_string(),
            model: "meta-llama/llama-3.1-8b-instruct".to_string(),
            temperature: 0.0,
            max_tokens: 2048,
        };
        let options = CompletionOptions::from(&config);
        assert_eq!(options.model, "meta-llama/llama-3.1-8b-instruct");
        assert_eq!(options.temperature, 0.0);
        assert_eq!(options.max_tokens, 2048);
    }

    #[test]
    fn provider_errors_are_service_failures() {
        let err = classify_prompt_error(PromptError::CompletionError(
            rig::completion::CompletionError::ProviderError("invalid_api_key".to_string()),
        ));
        assert!(matches!(err, CompletionError::Service(msg) if msg.contains("invalid_api_key")));
    }
}
