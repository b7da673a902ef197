use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use serde_json::json;
use std::pin::Pin;

use crate::message::ChatMessage;
use crate::streaming::{parse_chat_sse_stream, StreamEvent};

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Streaming model provider abstraction. The workflow layer only ever sees
/// this trait; tests script it, production wires `OpenAIClient`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream>;
}

/// OpenAI-compatible streaming client.
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    /// Point at a compatible gateway instead of api.openai.com.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ModelClient for OpenAIClient {
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream> {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("model provider returned {}: {}", status, detail);
        }

        Ok(parse_chat_sse_stream(response))
    }
}
