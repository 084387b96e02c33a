//! OpenAI-compatible chat-completions generator.
//!
//! Works with OpenAI, DeepSeek, xAI and any other provider exposing
//! `POST {base_url}/v1/chat/completions`.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::artifact::ArtifactSet;
use crate::task::BranchInput;

use super::output::{extract_json, parse_tech_stacks};
use super::prompts;
use super::trait_def::Generator;

/// Where and how to reach a chat-completions API.
#[derive(Debug, Clone)]
pub struct ChatEndpoint {
    pub base_url: String,
    /// Model used for stack identification and generation.
    pub chat_model: String,
    /// Cheaper model used for the validation verdict.
    pub validation_model: String,
    pub api_key: String,
}

/// Upper bound on a single chat-completions round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// A [`Generator`] backed by an OpenAI-compatible HTTP API.
pub struct OpenAiCompatibleGenerator {
    name: String,
    endpoint: ChatEndpoint,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl OpenAiCompatibleGenerator {
    pub fn new(name: impl Into<String>, endpoint: ChatEndpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
            http: reqwest::Client::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout. Applies to every capability,
    /// including validation and stack identification.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &ChatEndpoint {
        &self.endpoint
    }

    /// Send a single-turn prompt and return the reply text.
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.endpoint.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": model,
            "temperature": 0.0,
            "messages": [{"role": "user", "content": prompt}],
        });

        tracing::debug!(backend = %self.name, model, "sending chat completion");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .with_context(|| format!("failed to read {} response body", self.name))?;

        if !status.is_success() {
            bail!("{} API error {}: {}", self.name, status, text);
        }

        let resp_body: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("{} returned a non-JSON body", self.name))?;
        parse_completion(&resp_body)
    }

    async fn generate_with(&self, prompt: String) -> Result<ArtifactSet> {
        let reply = self.complete(&self.endpoint.chat_model, &prompt).await?;
        let value = extract_json(&reply)?;
        ArtifactSet::from_code_blocks(value).context("reply has no valid `code_blocks` array")
    }
}

/// Pull the assistant text out of a chat-completions response body.
pub fn parse_completion(body: &serde_json::Value) -> Result<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_owned)
        .context("response has no choices[0].message.content")
}

#[async_trait]
impl Generator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self, task_description: &str) -> Result<String> {
        self.complete(
            &self.endpoint.validation_model,
            &prompts::validation_prompt(task_description),
        )
        .await
    }

    async fn identify_stacks(&self, task_description: &str, limit: usize) -> Result<Vec<String>> {
        let reply = self
            .complete(
                &self.endpoint.chat_model,
                &prompts::stacks_prompt(task_description, limit),
            )
            .await?;
        parse_tech_stacks(&extract_json(&reply)?)
    }

    async fn generate_code(&self, input: &BranchInput) -> Result<ArtifactSet> {
        self.generate_with(prompts::code_prompt(input)).await
    }

    async fn generate_dependencies(&self, input: &BranchInput) -> Result<ArtifactSet> {
        self.generate_with(prompts::dependencies_prompt(input)).await
    }
}
