//! OpenAI-compatible HTTP client.
//!
//! Uses `/v1/chat/completions` and `/v1/embeddings`. Any server speaking the
//! same API (Azure gateways, local proxies) works by pointing `base_url` at it.

use crate::error::{AgentError, AgentResult};
use crate::llm::{ChatMessage, ChatModel, Embedder};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Sampling temperature for SQL generation.
pub const CHAT_TEMPERATURE: f64 = 0.7;

#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
    client: Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            embedding_model: embedding_model.into(),
            client: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> AgentResult<reqwest::Response> {
        let res = self
            .client
            .post(self.endpoint(path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AgentError::llm(format!("{} returned {}: {}", path, status, text)));
        }
        Ok(res)
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn submit(&self, messages: &[ChatMessage]) -> AgentResult<String> {
        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": CHAT_TEMPERATURE,
            "stream": false,
        });
        debug!(model = %self.model, messages = messages.len(), "Submitting chat prompt");

        let payload: ChatCompletionResponse = self.post("chat/completions", body).await?.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AgentError::llm("chat completion returned no content"))
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> AgentResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "model": self.embedding_model,
            "input": texts,
        });

        let mut payload: EmbeddingResponse = self.post("embeddings", body).await?.json().await?;
        payload.data.sort_by_key(|item| item.index);
        if payload.data.len() != texts.len() {
            return Err(AgentError::llm(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                payload.data.len()
            )));
        }
        Ok(payload.data.into_iter().map(|item| item.embedding).collect())
    }
}
