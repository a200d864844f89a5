use super::AgentContext;
use crate::core::{TaskId, TaskOutput};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Errors raised while an agent performs its opaque work step.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Tool requests did not settle after {0} rounds")]
    ToolRoundsExceeded(usize),

    #[error("No agent assigned to task '{0}'")]
    Unassigned(TaskId),

    #[error("Execution task join error: {0}")]
    Join(String),
}

/// What an agent is asked to do for one task.
#[derive(Debug, Clone)]
pub struct TaskPrompt {
    pub task_id: TaskId,
    pub description: String,
    pub expected_output: String,
    /// Outputs of the tasks this one depends on, or the whole history.
    pub context: Vec<TaskOutput>,
    /// Task-level key/value context.
    pub extra: BTreeMap<String, String>,
}

impl TaskPrompt {
    /// Context outputs rendered as one block of text, empty when there is none.
    pub fn context_text(&self) -> String {
        if self.context.is_empty() && self.extra.is_empty() {
            return String::new();
        }

        let mut combined = String::new();
        for output in &self.context {
            combined.push_str("Output of task '");
            combined.push_str(output.task_id.as_str());
            combined.push_str("':\n");
            combined.push_str(&output.raw);
            combined.push_str("\n\n");
        }
        for (key, value) in &self.extra {
            combined.push_str(key);
            combined.push_str(": ");
            combined.push_str(value);
            combined.push('\n');
        }

        combined
    }
}

/// Contract for the external completion engine behind every agent.
///
/// Implementations receive the agent's interpolated context and the task
/// prompt and return the produced text. Failures propagate without retry.
#[async_trait]
pub trait CapabilityExecutor: Debug + Send + Sync {
    async fn execute_capability(
        &self,
        agent: &AgentContext,
        prompt: &TaskPrompt,
    ) -> Result<String, CapabilityError>;
}
