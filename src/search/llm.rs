//! LLM completion providers for scene search.
//!
//! Both providers speak the OpenAI chat-completions wire format: Groq's
//! hosted endpoint, and any locally hosted OpenAI-compatible server
//! (LM Studio and friends) for offline work.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// LLM provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LlmProvider {
    Groq,
    OpenAiCompatible,
}

/// LLM connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Endpoint override; required for local providers, defaults to the
    /// hosted endpoint for Groq.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            endpoint: None,
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize)]
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
}

/// Per-request generation options. Search tiers differ in temperature,
/// token budget, and whether a JSON-object response is requested.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub json_object: bool,
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers
#[async_trait]
pub trait Llm: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> Result<LlmResponse>;
    async fn is_available(&self) -> bool;
    fn provider_type(&self) -> LlmProvider;
}

/// Create an LLM instance based on configuration
pub fn create_llm(config: &LlmConfig) -> Result<Box<dyn Llm>> {
    match config.provider {
        LlmProvider::Groq => Ok(Box::new(GroqProvider::new(config.clone())?)),
        LlmProvider::OpenAiCompatible => {
            Ok(Box::new(OpenAiCompatibleProvider::new(config.clone())?))
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    usage: Option<ChatCompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionUsage {
    total_tokens: u32,
}

impl ChatCompletionRequest {
    fn new(model: &str, messages: Vec<ChatMessage>, options: &ChatOptions) -> Self {
        Self {
            model: model.to_string(),
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            response_format: options.json_object.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

fn extract_content(response: ChatCompletionResponse, provider: &str) -> Result<LlmResponse> {
    let content = response
        .choices
        .first()
        .ok_or_else(|| anyhow!("No response from {}", provider))?
        .message
        .content
        .clone();
    let tokens_used = response.usage.map(|u| u.total_tokens);
    Ok(LlmResponse {
        content,
        tokens_used,
    })
}

/// Groq provider implementation
pub struct GroqProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(anyhow!("Groq API key required"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> &str {
        self.config.endpoint.as_deref().unwrap_or(GROQ_ENDPOINT)
    }
}

#[async_trait]
impl Llm for GroqProvider {
    async fn chat(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> Result<LlmResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("Groq API key not configured"))?;

        let request = ChatCompletionRequest::new(&self.config.model, messages, options);

        debug!("Sending request to Groq API ({})", self.config.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Groq API error {}: {}", status, text));
        }

        extract_content(response.json().await?, "Groq")
    }

    async fn is_available(&self) -> bool {
        let Some(api_key) = &self.config.api_key else {
            return false;
        };
        let models_url = self.endpoint().replace("/chat/completions", "/models");
        match self
            .client
            .get(&models_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LlmProvider {
        LlmProvider::Groq
    }
}

/// OpenAI-compatible local endpoint provider (LM Studio, llama.cpp server)
pub struct OpenAiCompatibleProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.endpoint.is_none() {
            return Err(anyhow!("endpoint required for OpenAI-compatible provider"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Llm for OpenAiCompatibleProvider {
    async fn chat(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> Result<LlmResponse> {
        let endpoint = self
            .config
            .endpoint
            .as_ref()
            .ok_or_else(|| anyhow!("endpoint not configured"))?;

        let request = ChatCompletionRequest::new(&self.config.model, messages, options);

        debug!("Sending request to local endpoint at {}", endpoint);

        let mut builder = self.client.post(endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("LLM endpoint error {}: {}", status, text));
        }

        extract_content(response.json().await?, "local endpoint")
    }

    async fn is_available(&self) -> bool {
        let Some(endpoint) = &self.config.endpoint else {
            return false;
        };
        let models_url = endpoint.replace("/chat/completions", "/models");
        match self.client.get(&models_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LlmProvider {
        LlmProvider::OpenAiCompatible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groq_requires_api_key() {
        let config = LlmConfig::default();
        assert!(GroqProvider::new(config).is_err());
    }

    #[test]
    fn test_local_requires_endpoint() {
        let config = LlmConfig {
            provider: LlmProvider::OpenAiCompatible,
            ..Default::default()
        };
        assert!(OpenAiCompatibleProvider::new(config).is_err());
    }

    #[test]
    fn test_json_object_response_format_serialized() {
        let options = ChatOptions {
            temperature: 0.2,
            max_tokens: 2048,
            json_object: true,
        };
        let request = ChatCompletionRequest::new("m", vec![ChatMessage::user("hi")], &options);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");

        let options = ChatOptions {
            json_object: false,
            ..options
        };
        let request = ChatCompletionRequest::new("m", vec![ChatMessage::user("hi")], &options);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("response_format").is_none());
    }
}
