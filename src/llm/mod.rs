//! Language model seams.
//!
//! The agent talks to two capabilities: a chat model that turns a prompt into
//! text, and an embedder that turns text into vectors for retrieval. Both are
//! traits so that tests and alternative backends can stand in for the HTTP
//! client in [`openai`].

pub mod openai;

pub use openai::OpenAiClient;

use crate::error::AgentResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Submit a conversation and return the assistant's reply text.
    async fn submit(&self, messages: &[ChatMessage]) -> AgentResult<String>;
}

/// Text embedding backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> AgentResult<Vec<Vec<f32>>>;
}
