//! OpenAI-compatible chat-completions provider.
//!
//! Works against LM Studio, llama.cpp server, vLLM, or anything else that
//! speaks `POST /chat/completions` and `GET /models` under a versioned base
//! URL.

use super::LlmClient;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Extraction wants near-deterministic output.
const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 2000;

pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiCompatClient {
    /// `base_url` is the versioned root, e.g. `http://localhost:1234/v1`.
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn extract_json(&self, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "llm request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| RegistryError::external("llm", e))?;
        if !response.status().is_success() {
            return Err(RegistryError::external(
                "llm",
                format!("status {}", response.status()),
            ));
        }
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::external("llm", e))?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn health(&self) -> bool {
        match self
            .client
            .get(format!("{}/models", self.base_url))
            .send()
            .await
        {
            Ok(r) => r.status().is_success(),
            Err(_) => false,
        }
    }

    async fn models(&self) -> Vec<String> {
        let response = match self
            .client
            .get(format!("{}/models", self.base_url))
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            _ => return Vec::new(),
        };
        match response.json::<ModelsResponse>().await {
            Ok(body) => body.data.into_iter().map(|m| m.id).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_response_shape() {
        let body: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"organizations\":[]}"}}],"usage":{}}"#,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content, r#"{"organizations":[]}"#);

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(empty.choices.is_empty());
    }

    #[test]
    fn test_models_response_shape() {
        let body: ModelsResponse = serde_json::from_str(
            r#"{"object":"list","data":[{"id":"qwen2.5-7b-instruct-q4_k_m","object":"model"}]}"#,
        )
        .unwrap();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].id, "qwen2.5-7b-instruct-q4_k_m");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            OpenAiCompatClient::new("http://localhost:1234/v1/", "m", Duration::from_secs(5));
        assert_eq!(client.base_url, "http://localhost:1234/v1");
        assert_eq!(client.model_name(), "m");
    }
}
