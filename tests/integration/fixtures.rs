//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Scripted capability executors
//! - Collecting lifecycle events
//! - Predefined agents and tasks

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use swarmflow::agents::{Agent, AgentContext, CapabilityError, CapabilityExecutor, TaskPrompt};
use swarmflow::core::Task;
use swarmflow::event::{EventKind, EventSink, SwarmEvent};

/// One recorded executor invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub agent: String,
    pub task: String,
    pub description: String,
    pub context: Vec<String>,
}

/// Executor answering `"<agent>:<task>"` and recording every call.
///
/// Tasks listed in `failing` return a provider error instead.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<Call>>,
    failing: HashSet<String>,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(tasks: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failing: tasks.iter().map(|t| t.to_string()).collect(),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_tasks(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.task).collect()
    }
}

#[async_trait]
impl CapabilityExecutor for ScriptedExecutor {
    async fn execute_capability(
        &self,
        agent: &AgentContext,
        prompt: &TaskPrompt,
    ) -> Result<String, CapabilityError> {
        self.calls.lock().unwrap().push(Call {
            agent: agent.id.to_string(),
            task: prompt.task_id.to_string(),
            description: prompt.description.clone(),
            context: prompt
                .context
                .iter()
                .map(|o| o.task_id.to_string())
                .collect(),
        });

        if self.failing.contains(prompt.task_id.as_str()) {
            return Err(CapabilityError::Provider(format!(
                "scripted failure for {}",
                prompt.task_id
            )));
        }
        Ok(format!("{}:{}", agent.id, prompt.task_id))
    }
}

/// Event sink keeping every event in memory.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Mutex<Vec<SwarmEvent>>,
}

impl EventCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SwarmEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }
}

impl EventSink for EventCollector {
    fn emit(&self, event: SwarmEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn agent(id: &str, role: &str, goal: &str, executor: Arc<ScriptedExecutor>) -> Arc<Agent> {
    Arc::new(Agent::new(id, role, goal, "Seasoned professional", executor))
}

pub fn manager(executor: Arc<ScriptedExecutor>) -> Arc<Agent> {
    Arc::new(
        Agent::new(
            "manager",
            "Project manager",
            "Coordinate the team",
            "Runs the team",
            executor,
        )
        .with_delegation(true),
    )
}

pub fn task(id: &str, agent: &str) -> Task {
    Task::new(id, format!("Complete step {}", id), format!("Result of {}", id)).with_agent(agent)
}
