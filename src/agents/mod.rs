//! Agents: named capability holders invoked through an opaque executor.

mod executor;

pub use executor::*;

use crate::memory::MemoryStore;
use crate::utils::{interpolate_inputs, Inputs};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Identifier of an agent within a swarm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The agent description handed to the executor, with inputs interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    pub id: AgentId,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub capabilities: Vec<String>,
}

impl AgentContext {
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
    }
}

/// A worker in the swarm.
///
/// Agents are shared between runs behind an `Arc`; only the execution
/// counter changes after construction.
#[derive(Debug)]
pub struct Agent {
    pub id: AgentId,
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub capabilities: Vec<String>,
    pub allow_delegation: bool,
    executor: Arc<dyn CapabilityExecutor>,
    memory: Option<Arc<dyn MemoryStore>>,
    execution_count: AtomicU64,
}

impl Agent {
    pub fn new(
        id: impl Into<AgentId>,
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
        executor: Arc<dyn CapabilityExecutor>,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            capabilities: Vec::new(),
            allow_delegation: false,
            executor,
            memory: None,
            execution_count: AtomicU64::new(0),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    /// Attach a memory store shared with other agents or the swarm.
    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn memory(&self) -> Option<&Arc<dyn MemoryStore>> {
        self.memory.as_ref()
    }

    /// Number of executor invocations made through this agent.
    pub fn execution_count(&self) -> u64 {
        self.execution_count.load(Ordering::Relaxed)
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Executor-facing description with `{key}` placeholders filled from `inputs`.
    pub fn context(&self, inputs: &Inputs) -> AgentContext {
        AgentContext {
            id: self.id.clone(),
            role: interpolate_inputs(&self.role, inputs),
            goal: interpolate_inputs(&self.goal, inputs),
            backstory: interpolate_inputs(&self.backstory, inputs),
            capabilities: self.capabilities.clone(),
        }
    }

    /// Run the opaque work step for `prompt`.
    pub async fn execute(
        &self,
        context: &AgentContext,
        prompt: &TaskPrompt,
    ) -> Result<String, CapabilityError> {
        self.execution_count.fetch_add(1, Ordering::Relaxed);
        debug!("Agent '{}' working on task '{}'", self.id, prompt.task_id);
        self.executor.execute_capability(context, prompt).await
    }
}
