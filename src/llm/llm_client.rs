use crate::agents::CapabilityError;
use crate::llm::providers::{create_provider, LlmProvider};
use crate::llm::ChatMessage;
use tracing::debug;

/// Generic LLM client that delegates work to a concrete provider.
#[derive(Debug)]
pub struct LlmClient {
    provider: Box<dyn LlmProvider>,
    model: String,
}

impl LlmClient {
    /// Creates a client for a named provider.
    ///
    /// # Arguments
    /// * `provider_name` - "openai", "anthropic" or "ollama"
    /// * `model` - Model name to use with the provider
    /// * `base_url` - Optional endpoint override
    pub fn new(
        provider_name: &str,
        model: &str,
        base_url: Option<&str>,
    ) -> Result<Self, CapabilityError> {
        Ok(LlmClient {
            provider: create_provider(provider_name, model, base_url)?,
            model: model.to_string(),
        })
    }

    /// Wraps an already built provider.
    pub fn from_provider(provider: Box<dyn LlmProvider>, model: &str) -> Self {
        LlmClient {
            provider,
            model: model.to_string(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the conversation and returns the reply text.
    ///
    /// # Errors
    /// Provider failures as returned by the provider, or
    /// [`CapabilityError::EmptyResponse`] for a blank reply.
    pub async fn call_llm_api(&self, messages: Vec<ChatMessage>) -> Result<String, CapabilityError> {
        debug!(
            "Calling {} ({}) with {} messages",
            self.provider.name(),
            self.model,
            messages.len()
        );
        let response = self.provider.call_llm_api(messages).await?;
        if response.trim().is_empty() {
            return Err(CapabilityError::EmptyResponse(self.provider.name().to_string()));
        }
        Ok(response)
    }
}

/// Shrinks `messages` until their combined length is below `char_limit`.
///
/// Older messages after the first (system) message are dropped first, then
/// the last message is cut. Returns whether anything was removed.
pub fn manage_context_size(messages: &mut Vec<ChatMessage>, char_limit: usize) -> bool {
    let mut total: usize = messages.iter().map(ChatMessage::char_count).sum();
    if total < char_limit {
        return false;
    }

    while total >= char_limit && messages.len() > 2 {
        let removed = messages.remove(1);
        total -= removed.char_count();
        debug!(
            "Removed old message to reduce context size. Remaining messages: {}",
            messages.len()
        );
    }

    if total >= char_limit {
        let others: usize = messages
            .iter()
            .rev()
            .skip(1)
            .map(ChatMessage::char_count)
            .sum();
        if let Some(last) = messages.last_mut() {
            let keep = char_limit.saturating_sub(others).saturating_sub(1);
            last.content = last.content.chars().take(keep).collect();
            debug!("Truncated last message to fit context size");
        }
    }
    true
}
