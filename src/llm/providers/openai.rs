use super::{api_error, api_key, LlmProvider};
use crate::agents::CapabilityError;
use crate::llm::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Provider implementation for OpenAI-compatible chat completion APIs
#[derive(Debug)]
pub struct OpenAiProvider {
    client: Client,
    /// Loaded from `OPENAI_API_KEY`
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(model: &str, base_url: Option<&str>) -> Result<Self, CapabilityError> {
        Ok(OpenAiProvider {
            client: Client::new(),
            api_key: api_key("OPENAI_API_KEY")?,
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

pub(crate) fn request_body(model: &str, messages: &[ChatMessage]) -> Value {
    json!({
        "model": model,
        "messages": messages,
        "temperature": 0.7
    })
}

pub(crate) fn extract_content(response: &Value) -> Option<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn call_llm_api(&self, messages: Vec<ChatMessage>) -> Result<String, CapabilityError> {
        let res = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body(&self.model, &messages))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error("OpenAI", res).await);
        }

        let json_resp: Value = res.json().await?;
        debug!("OpenAI response: {}", json_resp);
        extract_content(&json_resp).ok_or_else(|| CapabilityError::EmptyResponse("OpenAI".into()))
    }
}
