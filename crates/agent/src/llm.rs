//! Generative text-completion clients.
//!
//! The pipeline only sees [`LlmClient::complete`]. Transport, HTTP and decoding failures are
//! all reported as `CollaboratorError::Unavailable`; the timeout wrapper adds `Timeout`. There
//! is no retry: the caller degrades to templated answers instead.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use shopchat_core::config::{LlmConfig, LlmProvider};
use shopchat_core::domain::response::Usage;
use shopchat_core::errors::{Collaborator, CollaboratorError};
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletionParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionParams {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self { max_tokens: config.max_tokens, temperature: config.temperature }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CompletionParams,
    ) -> Result<Completion, CollaboratorError>;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CompletionParams,
    ) -> Result<Completion, CollaboratorError> {
        (**self).complete(system_prompt, user_prompt, params).await
    }
}

fn generative_unavailable(error: anyhow::Error) -> CollaboratorError {
    CollaboratorError::unavailable(Collaborator::Generative, format!("{error:#}"))
}

async fn read_error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = body.chars().take(300).collect::<String>();
    format!("HTTP {status}: {detail}")
}

/// Client for any `/chat/completions` endpoint (OpenAI, Ollama, vLLM and similar).
pub struct OpenAiCompatibleClient {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatCompletionMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    usage: Option<ChatCompletionUsage>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionContent,
}

#[derive(Deserialize)]
struct ChatCompletionContent {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
    total_tokens: Option<u32>,
}

impl OpenAiCompatibleClient {
    pub fn new(
        client: Client,
        api_key: Option<SecretString>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, api_key, base_url, model: model.into() }
    }

    async fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CompletionParams,
    ) -> anyhow::Result<Completion> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [
                ChatCompletionMessage { role: "system", content: system_prompt },
                ChatCompletionMessage { role: "user", content: user_prompt },
            ],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        debug!(model = %self.model, url = %url, "sending chat completion request");
        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }
        let response = request.send().await.context("chat completion request failed")?;
        if !response.status().is_success() {
            bail!(read_error_body(response).await);
        }

        let parsed: ChatCompletionResponse =
            response.json().await.context("chat completion response was not valid JSON")?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion response had no content"))?;
        let usage = parsed
            .usage
            .map(|usage| {
                let prompt_tokens = usage.prompt_tokens.unwrap_or(0);
                let completion_tokens = usage.completion_tokens.unwrap_or(0);
                Usage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: usage
                        .total_tokens
                        .unwrap_or(prompt_tokens.saturating_add(completion_tokens)),
                }
            })
            .unwrap_or_default();

        Ok(Completion { text, usage })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CompletionParams,
    ) -> Result<Completion, CollaboratorError> {
        self.request(system_prompt, user_prompt, params).await.map_err(generative_unavailable)
    }
}

/// Client for the Anthropic `/messages` endpoint.
pub struct AnthropicClient {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [ChatCompletionMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<MessagesContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct MessagesContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesUsage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

impl AnthropicClient {
    pub fn new(
        client: Client,
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, api_key, base_url, model: model.into() }
    }

    async fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CompletionParams,
    ) -> anyhow::Result<Completion> {
        let url = format!("{}/messages", self.base_url);
        let body = MessagesRequest {
            model: &self.model,
            system: system_prompt,
            messages: [ChatCompletionMessage { role: "user", content: user_prompt }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        debug!(model = %self.model, url = %url, "sending messages request");
        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .context("messages request failed")?;
        if !response.status().is_success() {
            bail!(read_error_body(response).await);
        }

        let parsed: MessagesResponse =
            response.json().await.context("messages response was not valid JSON")?;
        let text = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            bail!("messages response had no text content");
        }
        let usage = parsed
            .usage
            .map(|usage| {
                let prompt_tokens = usage.input_tokens.unwrap_or(0);
                let completion_tokens = usage.output_tokens.unwrap_or(0);
                Usage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens.saturating_add(completion_tokens),
                }
            })
            .unwrap_or_default();

        Ok(Completion { text, usage })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CompletionParams,
    ) -> Result<Completion, CollaboratorError> {
        self.request(system_prompt, user_prompt, params).await.map_err(generative_unavailable)
    }
}

/// Bounds any client with a deadline; an elapsed deadline becomes `CollaboratorError::Timeout`.
pub struct TimeoutLlmClient<C> {
    inner: C,
    timeout: Duration,
}

impl<C> TimeoutLlmClient<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for TimeoutLlmClient<C> {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CompletionParams,
    ) -> Result<Completion, CollaboratorError> {
        match tokio::time::timeout(
            self.timeout,
            self.inner.complete(system_prompt, user_prompt, params),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout {
                collaborator: Collaborator::Generative,
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

pub fn default_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => OPENAI_BASE_URL,
        LlmProvider::Anthropic => ANTHROPIC_BASE_URL,
        LlmProvider::Ollama => OLLAMA_BASE_URL,
    }
}

/// Builds the configured client wrapped in the configured timeout.
pub fn client_from_config(config: &LlmConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    let http = Client::builder()
        .connect_timeout(Duration::from_secs(config.timeout_secs.clamp(1, 10)))
        .build()
        .context("failed to build HTTP client")?;
    let base_url = config
        .base_url
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default_base_url(config.provider))
        .to_string();
    let timeout = Duration::from_secs(config.timeout_secs);

    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::OpenAi | LlmProvider::Ollama => Arc::new(TimeoutLlmClient::new(
            OpenAiCompatibleClient::new(http, config.api_key.clone(), base_url, &config.model),
            timeout,
        )),
        LlmProvider::Anthropic => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| anyhow!("llm.api_key is required for the anthropic provider"))?;
            Arc::new(TimeoutLlmClient::new(
                AnthropicClient::new(http, api_key, base_url, &config.model),
                timeout,
            ))
        }
    };
    Ok(client)
}
