//! Ollama LLM provider implementation.
//!
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use crate::providers::lines::line_stream;
use crate::types::{OllamaConfig, OLLAMA_DEFAULT_ENDPOINT};
use futures::StreamExt;
use ragbot_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

#[derive(Debug, Serialize, PartialEq)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    response: String,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaResponse {
    fn usage(&self) -> LlmUsage {
        LlmUsage::new(
            self.prompt_eval_count.unwrap_or(0),
            self.eval_count.unwrap_or(0),
        )
    }
}

/// Ollama LLM client.
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Client for `model` on the default local endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: OLLAMA_DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &OllamaConfig) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config
                .endpoint
                .clone()
                .unwrap_or_else(|| OLLAMA_DEFAULT_ENDPOINT.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn to_ollama_request(&self, request: &LlmRequest, stream: bool) -> OllamaRequest {
        let temperature = request.temperature.or(self.temperature);
        let num_predict = request.max_tokens.or(self.max_tokens);
        let options = if temperature.is_some() || num_predict.is_some() {
            Some(OllamaOptions {
                temperature,
                num_predict,
            })
        } else {
            None
        };

        OllamaRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            options,
            stream,
        }
    }

    async fn post(&self, body: &OllamaRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let body = self.to_ollama_request(request, false);
        tracing::debug!(model = %body.model, "Sending completion request to Ollama");

        let response: OllamaResponse = self
            .post(&body)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::debug!(
            eval_count = response.eval_count.unwrap_or(0),
            "Received completion from Ollama"
        );

        let usage = response.usage();
        Ok(LlmResponse {
            content: response.response,
            model: response.model,
            usage,
            done: response.done,
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        let body = self.to_ollama_request(request, true);
        tracing::debug!(model = %body.model, "Starting streaming request to Ollama");

        let response = self.post(&body).await?;

        let chunks = line_stream(response.bytes_stream()).map(|line| {
            let line = line?;
            let parsed: OllamaResponse = serde_json::from_str(&line)
                .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))?;
            let usage = parsed.done.then(|| parsed.usage());

            Ok(LlmStreamChunk {
                content: parsed.response,
                model: parsed.model,
                done: parsed.done,
                usage,
            })
        });

        Ok(Box::pin(chunks))
    }
}
