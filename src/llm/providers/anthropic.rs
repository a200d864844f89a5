use super::{api_error, api_key, LlmProvider};
use crate::agents::CapabilityError;
use crate::llm::ChatMessage;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Provider implementation for Anthropic's messages API
#[derive(Debug)]
pub struct AnthropicProvider {
    client: Client,
    /// Loaded from `ANTHROPIC_API_KEY`
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(model: &str, base_url: Option<&str>) -> Result<Self, CapabilityError> {
        Ok(AnthropicProvider {
            client: Client::new(),
            api_key: api_key("ANTHROPIC_API_KEY")?,
            model: model.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// The messages API takes system text separately from the conversation.
pub(crate) fn request_body(model: &str, messages: Vec<ChatMessage>) -> Value {
    let (system_messages, conversation): (Vec<_>, Vec<_>) =
        messages.into_iter().partition(|msg| msg.role == "system");
    let system_content = system_messages
        .into_iter()
        .map(|m| m.content)
        .collect::<Vec<_>>()
        .join("\n");

    json!({
        "model": model,
        "system": system_content,
        "max_tokens": MAX_TOKENS,
        "messages": conversation
    })
}

pub(crate) fn extract_content(response: &Value) -> Option<String> {
    response["content"][0]["text"]
        .as_str()
        .map(|content| content.trim().to_string())
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn call_llm_api(&self, messages: Vec<ChatMessage>) -> Result<String, CapabilityError> {
        let res = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request_body(&self.model, messages))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(api_error("Anthropic", res).await);
        }

        let json_resp: Value = res.json().await?;
        let content = extract_content(&json_resp)
            .ok_or_else(|| CapabilityError::EmptyResponse("Anthropic".into()))?;
        debug!("Anthropic response: {}", content);
        Ok(content)
    }
}
