use super::{api_error, LlmProvider};
use crate::agents::CapabilityError;
use crate::llm::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Provider implementation for a local Ollama server
#[derive(Debug)]
pub struct OllamaProvider {
    client: Client,
    model: String,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(model: &str, base_url: Option<&str>) -> Self {
        OllamaProvider {
            client: Client::new(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

pub(crate) fn extract_content(response: &Value) -> Option<String> {
    response["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn call_llm_api(&self, messages: Vec<ChatMessage>) -> Result<String, CapabilityError> {
        let request_body = json!({
            "model": self.model,
            "stream": false,
            "messages": messages
        });

        let res = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request_body)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error("Ollama", res).await);
        }

        let json_resp: Value = res.json().await?;
        extract_content(&json_resp).ok_or_else(|| CapabilityError::EmptyResponse("Ollama".into()))
    }
}
