//! Declarative swarm definitions loaded from YAML, TOML or JSON files.

mod parser;

pub use parser::load_swarm_definition;

use crate::agents::{Agent, CapabilityExecutor};
use crate::core::{Process, SwarmConfig, Task};
use crate::errors::{Error, Result};
use crate::llm::{LlmClient, LlmExecutor};
use crate::memory::{InMemoryStore, MemoryStore};
use crate::tools::{MemoryTool, ToolRegistry};
use crate::utils::Inputs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Main configuration structure for a swarm
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SwarmDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub process: Process,
    /// Id of the agent that manages hierarchical runs
    #[serde(default)]
    pub manager: Option<String>,
    #[serde(default)]
    pub max_rpm: Option<u32>,
    /// Keep task outputs in a shared in-memory store
    #[serde(default)]
    pub memory: bool,
    /// Entries preloaded into the knowledge store
    #[serde(default)]
    pub knowledge: BTreeMap<String, String>,
    #[serde(default)]
    pub llm: LlmConfig,
    pub agents: Vec<AgentDefinition>,
    pub tasks: Vec<TaskDefinition>,
    /// Inputs used when none are given on the command line
    #[serde(default)]
    pub inputs: Inputs,
    /// Free-form settings passed through to the swarm
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

/// Completion provider settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub max_tool_rounds: Option<usize>,
    #[serde(default)]
    pub context_char_budget: Option<usize>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            max_tool_rounds: None,
            context_char_budget: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Configuration for one agent
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentDefinition {
    pub id: String,
    pub role: String,
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
    /// Capability names; also selects which tools the agent may call
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub allow_delegation: bool,
    /// Attach the swarm's memory store to this agent
    #[serde(default)]
    pub memory: bool,
}

/// Configuration for one task
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TaskDefinition {
    pub id: String,
    pub description: String,
    pub expected_output: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    #[serde(default)]
    pub async_execution: bool,
    /// Humantime string such as `"90s"` or `"2m"`
    #[serde(default, with = "humantime_duration")]
    pub max_execution_time: Option<Duration>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    #[serde(default)]
    pub output_json: bool,
}

/// Stores created for a swarm definition
#[derive(Debug, Clone, Default)]
pub struct SwarmStores {
    pub memory: Option<Arc<dyn MemoryStore>>,
    pub knowledge: Option<Arc<dyn MemoryStore>>,
}

impl SwarmDefinition {
    /// Create the memory and knowledge stores this definition asks for.
    pub fn stores(&self) -> SwarmStores {
        let memory = self
            .memory
            .then(|| Arc::new(InMemoryStore::new()) as Arc<dyn MemoryStore>);
        let knowledge = (!self.knowledge.is_empty()).then(|| {
            Arc::new(InMemoryStore::with_entries(self.knowledge.clone())) as Arc<dyn MemoryStore>
        });
        SwarmStores { memory, knowledge }
    }

    /// Tools over the configured stores: `memories` and `knowledge`.
    pub fn tools(&self, stores: &SwarmStores) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        if let Some(memory) = &stores.memory {
            registry.register(Arc::new(MemoryTool::new("memories", Arc::clone(memory))));
        }
        if let Some(knowledge) = &stores.knowledge {
            registry.register(Arc::new(MemoryTool::new("knowledge", Arc::clone(knowledge))));
        }
        registry
    }

    /// LLM-backed executor for the configured provider.
    ///
    /// # Errors
    /// [`Error::Configuration`] for an unknown provider or missing API key.
    pub fn llm_executor(&self, stores: &SwarmStores) -> Result<LlmExecutor> {
        let client = LlmClient::new(
            &self.llm.provider,
            &self.llm.model,
            self.llm.base_url.as_deref(),
        )
        .map_err(|e| Error::Configuration(e.to_string()))?;

        let mut executor = LlmExecutor::new(Arc::new(client)).with_tools(self.tools(stores));
        if let Some(rounds) = self.llm.max_tool_rounds {
            executor = executor.with_max_tool_rounds(rounds);
        }
        if let Some(budget) = self.llm.context_char_budget {
            executor = executor.with_context_char_budget(budget);
        }
        Ok(executor)
    }

    /// Build the [`SwarmConfig`] with every agent using `executor`.
    ///
    /// Gating conditions cannot be expressed in files, so tasks built here
    /// always run.
    ///
    /// # Errors
    /// [`Error::Configuration`] when `manager` names no agent.
    pub fn into_config(
        self,
        executor: Arc<dyn CapabilityExecutor>,
        stores: SwarmStores,
    ) -> Result<SwarmConfig> {
        let agents: Vec<Arc<Agent>> = self
            .agents
            .into_iter()
            .map(|def| {
                let mut agent = Agent::new(
                    def.id,
                    def.role,
                    def.goal,
                    def.backstory,
                    Arc::clone(&executor),
                )
                .with_capabilities(def.capabilities)
                .with_delegation(def.allow_delegation);
                if def.memory {
                    if let Some(memory) = &stores.memory {
                        agent = agent.with_memory(Arc::clone(memory));
                    }
                }
                Arc::new(agent)
            })
            .collect();

        let tasks: Vec<Task> = self.tasks.into_iter().map(TaskDefinition::into_task).collect();

        let mut config = SwarmConfig::new(agents, tasks)
            .with_name(self.name)
            .with_process(self.process);
        config.max_rpm = self.max_rpm;
        config.config = self.config;
        config.memory = stores.memory;
        config.knowledge = stores.knowledge;

        if let Some(manager_id) = self.manager {
            let manager = config
                .agents
                .iter()
                .find(|a| a.id.as_str() == manager_id)
                .cloned()
                .ok_or_else(|| {
                    Error::Configuration(format!("manager '{}' is not a defined agent", manager_id))
                })?;
            config.manager = Some(manager);
        }

        debug!("Built swarm config: {:?}", config);
        Ok(config)
    }
}

impl TaskDefinition {
    pub fn into_task(self) -> Task {
        let mut task = Task::new(self.id, self.description, self.expected_output)
            .with_required_capabilities(self.required_capabilities)
            .with_async_execution(self.async_execution)
            .with_output_json(self.output_json);
        if let Some(agent) = self.agent {
            task = task.with_agent(agent);
        }
        for dependency in self.dependencies {
            task = task.depends_on(dependency);
        }
        if let Some(limit) = self.max_execution_time {
            task = task.with_max_execution_time(limit);
        }
        for (key, value) in self.context {
            task = task.with_context(key, value);
        }
        task
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => {
                serializer.serialize_some(&humantime::format_duration(*duration).to_string())
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
