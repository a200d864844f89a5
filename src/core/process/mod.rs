//! Execution strategies: how a run walks through its tasks.

mod hierarchical;
mod sequential;

pub use hierarchical::HierarchicalProcess;
pub use sequential::SequentialProcess;

use super::output::{SwarmOutput, TaskOutput};
use super::rate_limit::RpmController;
use super::task::Task;
use crate::agents::Agent;
use crate::errors::{Error, Result};
use crate::event::{EventKind, EventSink, SwarmEvent};
use crate::memory::MemoryStore;
use crate::utils::Inputs;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// How a swarm executes its tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    /// Tasks run in dependency order on their assigned agents.
    #[default]
    Sequential,
    /// A manager agent plans, delegates every task and synthesizes the answer.
    Hierarchical,
}

impl std::fmt::Display for Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Process::Sequential => write!(f, "sequential"),
            Process::Hierarchical => write!(f, "hierarchical"),
        }
    }
}

impl FromStr for Process {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Process::Sequential),
            "hierarchical" => Ok(Process::Hierarchical),
            other => Err(Error::Configuration(format!("Unknown process '{}'", other))),
        }
    }
}

/// Everything a strategy needs from the run it executes in.
#[derive(Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub inputs: Inputs,
    pub events: Arc<dyn EventSink>,
    pub memory: Option<Arc<dyn MemoryStore>>,
    pub rate_limiter: Option<Arc<RpmController>>,
}

impl RunContext {
    pub fn event(&self, kind: EventKind, message: impl Into<String>) -> SwarmEvent {
        SwarmEvent::new(kind, Some(self.run_id), message)
    }

    pub fn emit(&self, event: SwarmEvent) {
        self.events.emit(event);
    }
}

impl Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("inputs", &self.inputs)
            .field("has_memory", &self.memory.is_some())
            .field("rate_limiter", &self.rate_limiter)
            .finish()
    }
}

/// An algorithm that runs a list of fresh tasks to one [`SwarmOutput`].
///
/// Any task failure aborts the run; no partial output is returned.
#[async_trait]
pub trait ExecutionStrategy: Debug + Send + Sync {
    async fn execute(&self, tasks: Vec<Task>, run: &RunContext) -> Result<SwarmOutput>;
}

/// Outputs a task receives as context: those of its declared dependencies
/// in declaration order, or the whole `history` when it declares none.
pub(crate) fn select_context(task: &Task, history: &[TaskOutput]) -> Vec<TaskOutput> {
    if task.dependencies.is_empty() {
        return history.to_vec();
    }
    task.dependencies
        .iter()
        .filter_map(|dep| history.iter().find(|o| &o.task_id == dep).cloned())
        .collect()
}

/// Run one task on `agent`, emitting its lifecycle events.
///
/// Skips the task when its condition rejects `context`. Completed outputs
/// are saved under the task id to the run's memory store and to the
/// agent's own store, when present.
pub(crate) async fn run_task(
    task: &mut Task,
    agent: &Arc<Agent>,
    context: Vec<TaskOutput>,
    run: &RunContext,
) -> Result<TaskOutput> {
    if !task.should_execute(&context) {
        let output = task.skip()?;
        warn!("Skipping task '{}': condition not met", task.id);
        run.emit(
            run.event(EventKind::TaskSkipped, "Condition not met")
                .with_task(&task.id),
        );
        return Ok(output);
    }

    run.emit(
        run.event(EventKind::TaskStarted, task.description.clone())
            .with_task(&task.id)
            .with_agent(Some(&agent.id)),
    );

    if let Some(limiter) = &run.rate_limiter {
        limiter.acquire().await;
    }

    match task.execute(agent, context, &run.inputs).await {
        Ok(output) => {
            run.emit(
                run.event(EventKind::TaskCompleted, output.summary.clone())
                    .with_task(&task.id)
                    .with_agent(Some(&agent.id)),
            );
            for memory in run.memory.iter().chain(agent.memory()) {
                if let Err(e) = memory.save(task.id.as_str(), &output.raw).await {
                    warn!("Could not save output of task '{}' to memory: {}", task.id, e);
                } else {
                    debug!("Saved output of task '{}' to memory", task.id);
                }
            }
            Ok(output)
        }
        Err(e) => {
            run.emit(
                run.event(EventKind::TaskFailed, e.to_string())
                    .with_task(&task.id)
                    .with_agent(Some(&agent.id)),
            );
            Err(e)
        }
    }
}
