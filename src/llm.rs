use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{AppError, Result};

/// One summarization request: the ordered chunks of a page plus sampling
/// settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub chunks: Vec<String>,
    pub temperature: f32,
}

/// External text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build LLM client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".into(),
                content: build_prompt(&request.chunks),
            }],
            temperature: request.temperature,
        };

        debug!(model = %self.model, chunks = request.chunks.len(), "calling completion endpoint");
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::SummaryError(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(AppError::SummaryError(format!(
                "completion endpoint returned {}: {}",
                status,
                detail.trim()
            )));
        }

        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::SummaryError(format!("Invalid response body: {}", e)))?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AppError::SummaryError("Invalid response format from LLM".to_string()))?
            .to_string();

        Ok(reply)
    }
}

/// Stuffs every chunk into a single concise-summary prompt.
pub fn build_prompt(chunks: &[String]) -> String {
    let content_len: usize = chunks.iter().map(|chunk| chunk.len() + 2).sum();
    let mut result = String::with_capacity(content_len + 64);
    result.push_str("Write a concise summary of the following:\n\n\n\"");
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            result.push_str("\n\n");
        }
        result.push_str(chunk);
    }
    result.push_str("\"\n\n\nCONCISE SUMMARY:");
    result
}
