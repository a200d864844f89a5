use crate::agents::CapabilityError;
use crate::llm::ChatMessage;
use async_trait::async_trait;
use std::fmt::Debug;

pub mod anthropic;
pub mod ollama;
pub mod openai;

/// A chat-completion backend
#[async_trait]
pub trait LlmProvider: Debug + Send + Sync {
    fn name(&self) -> &str;
    async fn call_llm_api(&self, messages: Vec<ChatMessage>) -> Result<String, CapabilityError>;
}

/// Build the provider registered under `provider_name`.
///
/// # Arguments
/// * `provider_name` - "openai", "anthropic" or "ollama"
/// * `model` - Model name passed to the provider
/// * `base_url` - Overrides the provider's default endpoint
pub fn create_provider(
    provider_name: &str,
    model: &str,
    base_url: Option<&str>,
) -> Result<Box<dyn LlmProvider>, CapabilityError> {
    let provider: Box<dyn LlmProvider> = match provider_name.to_ascii_lowercase().as_str() {
        "openai" => Box::new(openai::OpenAiProvider::new(model, base_url)?),
        "anthropic" => Box::new(anthropic::AnthropicProvider::new(model, base_url)?),
        "ollama" => Box::new(ollama::OllamaProvider::new(model, base_url)),
        _ => return Err(CapabilityError::UnknownProvider(provider_name.to_string())),
    };
    Ok(provider)
}

/// Read an API key from the environment.
fn api_key(var: &str) -> Result<String, CapabilityError> {
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| {
            CapabilityError::MissingCredentials(format!("{} environment variable not set", var))
        })
}

/// Error for a non-success HTTP response.
async fn api_error(provider: &str, res: reqwest::Response) -> CapabilityError {
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    CapabilityError::Provider(format!("{} API error ({}): {}", provider, status, text))
}
