//! OpenAI-compatible chat completion provider.
//!
//! Serves OpenAI itself and Groq, which exposes the same `/chat/completions`
//! surface under a different base URL.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use crate::providers::lines::line_stream;
use crate::types::{OpenAiConfig, ProviderKind};
use futures::StreamExt;
use ragbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    model: String,
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatClient {
    kind: ProviderKind,
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn from_config(kind: ProviderKind, config: &OpenAiConfig) -> AppResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Config(format!(
                "{} provider requires an API key",
                kind.as_str()
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config
            .endpoint
            .as_deref()
            .unwrap_or(kind.default_endpoint())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            kind,
            base_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn to_chat_request(&self, request: &LlmRequest, stream: bool) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        ChatRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            temperature: request.temperature.or(self.temperature),
            max_tokens: request.max_tokens.or(self.max_tokens),
            stream,
        }
    }

    async fn post(&self, body: &ChatRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        let provider = self.kind.as_str();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to {}: {}", provider, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "{} API error ({}): {}",
                provider, status, error_text
            )));
        }

        Ok(response)
    }
}

/// Parse one server-sent-events line. `None` for keep-alives and comments.
fn parse_sse_line(line: &str) -> Option<AppResult<LlmStreamChunk>> {
    let data = line.strip_prefix("data:")?.trim();

    if data == "[DONE]" {
        return Some(Ok(LlmStreamChunk {
            content: String::new(),
            model: String::new(),
            done: true,
            usage: None,
        }));
    }

    let event: StreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(e) => return Some(Err(AppError::Llm(format!("Failed to parse chunk: {}", e)))),
    };

    let choice = event.choices.into_iter().next()?;
    Some(Ok(LlmStreamChunk {
        content: choice.delta.content.unwrap_or_default(),
        model: event.model,
        done: choice.finish_reason.is_some(),
        usage: None,
    }))
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatClient {
    fn provider_name(&self) -> &str {
        self.kind.as_str()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let body = self.to_chat_request(request, false);
        tracing::debug!(provider = self.kind.as_str(), model = %body.model, "Sending chat completion");

        let response: ChatResponse = self.post(&body).await?.json().await.map_err(|e| {
            AppError::Llm(format!("Failed to parse {} response: {}", self.kind.as_str(), e))
        })?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AppError::Llm(format!("{} returned no choices", self.kind.as_str()))
        })?;

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(LlmResponse {
            content: choice.message.content,
            model: response.model,
            usage,
            done: choice.finish_reason.as_deref() != Some("length"),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        let body = self.to_chat_request(request, true);
        tracing::debug!(provider = self.kind.as_str(), model = %body.model, "Starting chat stream");

        let response = self.post(&body).await?;

        let chunks = line_stream(response.bytes_stream()).filter_map(|line| {
            let item = match line {
                Ok(line) => parse_sse_line(&line),
                Err(e) => Some(Err(e)),
            };
            futures::future::ready(item)
        });

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str) -> OpenAiConfig {
        OpenAiConfig {
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: api_key.to_string(),
            endpoint: None,
            temperature: Some(0.0),
            max_tokens: Some(512),
            timeout_secs: None,
        }
    }

    #[test]
    fn test_groq_uses_groq_endpoint() {
        let client = OpenAiCompatClient::from_config(ProviderKind::Groq, &config("gsk")).unwrap();
        assert_eq!(client.provider_name(), "groq");
        assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiCompatClient::from_config(ProviderKind::OpenAi, &config("  "));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_chat_request_includes_system_message() {
        let client = OpenAiCompatClient::from_config(ProviderKind::OpenAi, &config("sk")).unwrap();
        let body = client.to_chat_request(
            &LlmRequest::new("What is in the manual?").with_system("Answer from context"),
            false,
        );

        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].content, "What is in the manual?");
        assert_eq!(body.temperature, Some(0.0));
        assert_eq!(body.max_tokens, Some(512));
    }

    #[test]
    fn test_parse_sse_lines() {
        let chunk = parse_sse_line(
            r#"data: {"model":"gpt-4o-mini","choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(chunk.content, "Hel");
        assert!(!chunk.done);

        let done = parse_sse_line("data: [DONE]").unwrap().unwrap();
        assert!(done.done);

        assert!(parse_sse_line(": keep-alive").is_none());
        assert!(parse_sse_line("data: {not json").unwrap().is_err());
    }
}
