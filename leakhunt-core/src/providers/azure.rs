//! Azure OpenAI provider using rig-core

use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::azure;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::{Error, Result};

use super::retry::{build_backoff, is_retriable_error, RetryConfig};
use super::traits::{CompletionRequest, CompletionResponse, LlmProvider, TokenUsage};

/// Azure OpenAI provider, one deployment per instance
pub struct AzureProvider {
    client: azure::Client,
    deployment: String,
    max_tokens: u32,
    timeout: Duration,
    retry: RetryConfig,
}

impl AzureProvider {
    /// Build a provider from configuration
    ///
    /// Endpoint, deployment and key must all be present; call
    /// [`LeakhuntConfig::expand_env_vars`](crate::config::LeakhuntConfig::expand_env_vars)
    /// first to pick them up from the environment.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::Provider("AZURE_OPENAI_ENDPOINT not set".to_string()))?;
        let deployment = config
            .deployment
            .clone()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::Provider("AZURE_OPENAI_DEPLOYMENT not set".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Provider("AZURE_OPENAI_API_KEY not set".to_string()))?;

        let client = azure::Client::builder(
            azure::AzureOpenAIAuth::ApiKey(api_key),
            endpoint.trim_end_matches('/'),
        )
        .api_version(config.api_version.as_str())
        .build();

        Ok(Self {
            client,
            deployment,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            retry: RetryConfig::default().with_max_retries(config.max_retries),
        })
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn prompt_once(
        &self,
        preamble: &str,
        prompt: &str,
        temperature: Option<f32>,
    ) -> Result<String> {
        let mut builder = self
            .client
            .agent(&self.deployment)
            .preamble(preamble)
            .max_tokens(u64::from(self.max_tokens));
        if let Some(temperature) = temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        let agent = builder.build();

        match tokio::time::timeout(self.timeout, async { agent.prompt(prompt).await }).await {
            Ok(result) => result
                .map_err(|e| Error::Provider(format!("Azure OpenAI completion failed: {}", e))),
            Err(_) => Err(Error::Provider(format!(
                "Azure OpenAI request timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl LlmProvider for AzureProvider {
    fn name(&self) -> &str {
        "azure"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let prompt = request
            .messages
            .iter()
            .map(|m| format!("{:?}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let preamble = request.system.as_deref().unwrap_or_default();

        let content = (|| async { self.prompt_once(preamble, &prompt, request.temperature).await })
            .retry(build_backoff(&self.retry))
            .sleep(tokio::time::sleep)
            .when(|e| is_retriable_error(&e.to_string()))
            .notify(|e, delay| warn!("Transient provider error, retrying in {:?}: {}", delay, e))
            .await?;

        // rig returns text only, so usage is estimated at four bytes per token
        let usage = TokenUsage {
            input_tokens: (preamble.len() + prompt.len()) as u64 / 4,
            output_tokens: content.len() as u64 / 4,
        };
        debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "azure completion finished"
        );

        Ok(CompletionResponse {
            content: Some(content),
            usage,
        })
    }
}
