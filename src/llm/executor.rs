use crate::agents::{AgentContext, CapabilityError, CapabilityExecutor, TaskPrompt};
use crate::constants::{DEFAULT_CONTEXT_CHAR_BUDGET, DEFAULT_MAX_TOOL_ROUNDS, TOOL_REQUEST_MARKER};
use crate::llm::{manage_context_size, ChatMessage, LlmClient};
use crate::tools::{parse_tool_request, ToolRegistry, ToolRequest};
use crate::utils::truncate_chars;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// [`CapabilityExecutor`] backed by a chat-completion provider.
///
/// Agents may call the registered tools named in their capabilities by
/// answering with a `TOOL_REQUEST:` line; the tool result is fed back and
/// the provider is called again.
#[derive(Debug, Clone)]
pub struct LlmExecutor {
    client: Arc<LlmClient>,
    tools: ToolRegistry,
    max_tool_rounds: usize,
    context_char_budget: usize,
}

impl LlmExecutor {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self {
            client,
            tools: ToolRegistry::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            context_char_budget: DEFAULT_CONTEXT_CHAR_BUDGET,
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_context_char_budget(mut self, budget: usize) -> Self {
        self.context_char_budget = budget;
        self
    }

    fn system_message(&self, agent: &AgentContext) -> ChatMessage {
        let mut content = format!(
            "You are {}.\nYour goal: {}\n",
            agent.role, agent.goal
        );
        if !agent.backstory.is_empty() {
            content.push_str(&format!("Background: {}\n", agent.backstory));
        }

        let tools = self.tools.describe(&agent.capabilities);
        if !tools.is_empty() {
            content.push_str(&format!(
                "\nYou can use these tools:\n{}\nTo use one, answer with a single line \
                 '{} <tool> <action> <params>' and nothing else. \
                 Otherwise answer the task directly.\n",
                tools, TOOL_REQUEST_MARKER
            ));
        }
        ChatMessage::system(&content)
    }

    fn user_message(prompt: &TaskPrompt) -> ChatMessage {
        let mut content = format!(
            "Task: {}\n\nExpected output: {}\n",
            prompt.description, prompt.expected_output
        );
        let context = prompt.context_text();
        if !context.is_empty() {
            content.push_str("\nContext:\n");
            content.push_str(&context);
        }
        ChatMessage::user(&content)
    }

    async fn run_tool(&self, agent: &AgentContext, request: &ToolRequest) -> String {
        let allowed = self
            .tools
            .allowed(&agent.capabilities)
            .find(|tool| tool.name() == request.tool);
        let Some(tool) = allowed else {
            warn!(
                "Agent '{}' requested unavailable tool '{}'",
                agent.id, request.tool
            );
            return format!(
                "Tool '{}' is not available to you. Answer without it.",
                request.tool
            );
        };

        info!(
            "Agent '{}' calling tool '{}' action '{}'",
            agent.id, request.tool, request.action
        );
        match tool.call(&request.action, &request.params).await {
            Ok(result) => format!(
                "Result of {} {}:\n{}",
                request.tool,
                request.action,
                truncate_chars(&result, self.context_char_budget / 2)
            ),
            Err(e) => format!("{}. Fix the request or answer without the tool.", e),
        }
    }
}

#[async_trait]
impl CapabilityExecutor for LlmExecutor {
    async fn execute_capability(
        &self,
        agent: &AgentContext,
        prompt: &TaskPrompt,
    ) -> Result<String, CapabilityError> {
        let mut messages = vec![self.system_message(agent), Self::user_message(prompt)];
        let mut rounds = 0;

        loop {
            manage_context_size(&mut messages, self.context_char_budget);
            let response = self.client.call_llm_api(messages.clone()).await?;
            debug!("Agent '{}' response: {}", agent.id, response);

            let Some(request) = parse_tool_request(&response) else {
                return Ok(response);
            };
            if rounds >= self.max_tool_rounds {
                return Err(CapabilityError::ToolRoundsExceeded(self.max_tool_rounds));
            }
            rounds += 1;

            let result = self.run_tool(agent, &request).await;
            messages.push(ChatMessage::assistant(&response));
            messages.push(ChatMessage::user(&result));
        }
    }
}
