//! The swarm: validated agents and task templates plus the strategy that runs them.

use super::delegation::{DelegationPolicy, KeywordDelegation};
use super::output::SwarmOutput;
use super::process::{
    ExecutionStrategy, HierarchicalProcess, Process, RunContext, SequentialProcess,
};
use super::rate_limit::RpmController;
use super::resolver::{execution_order, validate_dependencies};
use super::task::Task;
use crate::agents::{Agent, AgentId};
use crate::constants::{COORDINATION_TASK_ID, FINAL_SYNTHESIS_TASK_ID};
use crate::errors::{Error, Result};
use crate::event::{EventKind, EventSink, SwarmEvent, TracingSink};
use crate::memory::{MemoryKind, MemoryStore};
use crate::utils::Inputs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Coarse state of a swarm. Reflects the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwarmStatus {
    Ready,
    Running,
    Completed,
    Failed,
}

/// Everything needed to build a [`Swarm`].
#[derive(Clone, Default)]
pub struct SwarmConfig {
    pub name: String,
    pub agents: Vec<Arc<Agent>>,
    /// Task templates, instantiated afresh on every run.
    pub tasks: Vec<Task>,
    pub process: Process,
    /// Manager for hierarchical runs. May also appear in `agents`.
    pub manager: Option<Arc<Agent>>,
    /// Receives every completed task output under its task id.
    pub memory: Option<Arc<dyn MemoryStore>>,
    /// Reference material. The swarm itself only clears it; agents read it
    /// through a [`crate::tools::MemoryTool`] registered on their executor,
    /// as [`crate::config::SwarmDefinition::tools`] does.
    pub knowledge: Option<Arc<dyn MemoryStore>>,
    /// Maximum executor invocations per minute across all runs.
    pub max_rpm: Option<u32>,
    /// Free-form settings carried along for executors and callers.
    pub config: BTreeMap<String, Value>,
    pub events: Option<Arc<dyn EventSink>>,
    pub delegation: Option<Arc<dyn DelegationPolicy>>,
}

impl SwarmConfig {
    pub fn new(agents: Vec<Arc<Agent>>, tasks: Vec<Task>) -> Self {
        Self {
            name: "swarm".to_string(),
            agents,
            tasks,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    pub fn with_manager(mut self, manager: Arc<Agent>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn MemoryStore>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn with_max_rpm(mut self, max_rpm: u32) -> Self {
        self.max_rpm = Some(max_rpm);
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_delegation(mut self, policy: Arc<dyn DelegationPolicy>) -> Self {
        self.delegation = Some(policy);
        self
    }
}

impl std::fmt::Debug for SwarmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwarmConfig")
            .field("name", &self.name)
            .field("agents", &self.agents.iter().map(|a| &a.id).collect::<Vec<_>>())
            .field("tasks", &self.tasks)
            .field("process", &self.process)
            .field("manager", &self.manager.as_ref().map(|m| &m.id))
            .field("max_rpm", &self.max_rpm)
            .finish()
    }
}

struct SwarmInner {
    name: String,
    agents: Vec<Arc<Agent>>,
    tasks: Vec<Task>,
    process: Process,
    strategy: Arc<dyn ExecutionStrategy>,
    memory: Option<Arc<dyn MemoryStore>>,
    knowledge: Option<Arc<dyn MemoryStore>>,
    rate_limiter: Option<Arc<RpmController>>,
    config: BTreeMap<String, Value>,
    events: Arc<dyn EventSink>,
    status: RwLock<SwarmStatus>,
}

/// A validated, reusable group of agents and tasks.
///
/// Cloning is cheap and clones share status, stores and rate limit.
#[derive(Clone)]
pub struct Swarm {
    inner: Arc<SwarmInner>,
}

impl Swarm {
    /// Validate `config` and build the swarm.
    ///
    /// # Errors
    /// - [`Error::Configuration`] for empty agent or task lists, duplicate
    ///   agent ids, tasks assigned to unknown agents, an async task that does
    ///   not run last, a zero `max_rpm`, or a hierarchical swarm without a
    ///   delegating manager and at least one other agent or with a task
    ///   using a reserved manager task id.
    /// - [`Error::UnknownDependency`] / [`Error::CyclicDependency`] for
    ///   broken task graphs.
    pub fn new(config: SwarmConfig) -> Result<Self> {
        if config.agents.is_empty() {
            return Err(Error::Configuration(
                "a swarm needs at least one agent".to_string(),
            ));
        }
        if config.tasks.is_empty() {
            return Err(Error::Configuration(
                "a swarm needs at least one task".to_string(),
            ));
        }

        let mut agent_ids: HashSet<&AgentId> = HashSet::new();
        for agent in &config.agents {
            if !agent_ids.insert(&agent.id) {
                return Err(Error::Configuration(format!(
                    "duplicate agent id '{}'",
                    agent.id
                )));
            }
        }
        // a sequential swarm ignores its manager, so tasks cannot target it
        if config.process == Process::Hierarchical {
            if let Some(manager) = &config.manager {
                agent_ids.insert(&manager.id);
            }
            if let Some(task) = config
                .tasks
                .iter()
                .find(|t| [COORDINATION_TASK_ID, FINAL_SYNTHESIS_TASK_ID].contains(&t.id.as_str()))
            {
                return Err(Error::Configuration(format!(
                    "task id '{}' is reserved for the manager in hierarchical runs",
                    task.id
                )));
            }
        }

        validate_dependencies(&config.tasks)?;
        let order = execution_order(&config.tasks)?;

        for task in &config.tasks {
            if let Some(agent) = &task.agent {
                if !agent_ids.contains(agent) {
                    return Err(Error::Configuration(format!(
                        "task '{}' is assigned to unknown agent '{}'",
                        task.id, agent
                    )));
                }
            }
        }

        // sequential runs finish with the last task in dependency order,
        // hierarchical runs delegate in declaration order
        let last = match config.process {
            Process::Sequential => order.last().copied(),
            Process::Hierarchical => Some(config.tasks.len() - 1),
        };
        if let Some(task) = config
            .tasks
            .iter()
            .enumerate()
            .find(|(index, t)| t.async_execution && Some(*index) != last)
            .map(|(_, t)| t)
        {
            return Err(Error::Configuration(format!(
                "task '{}' is async but only the last task may run asynchronously",
                task.id
            )));
        }

        let rate_limiter = match config.max_rpm {
            Some(max_rpm) => Some(Arc::new(RpmController::new(max_rpm)?)),
            None => None,
        };

        let strategy: Arc<dyn ExecutionStrategy> = match config.process {
            Process::Sequential => {
                if config.manager.is_some() {
                    warn!(
                        "Swarm '{}': manager is ignored in sequential mode",
                        config.name
                    );
                }
                Arc::new(SequentialProcess::new(config.agents.clone()))
            }
            Process::Hierarchical => {
                let manager = config.manager.clone().ok_or_else(|| {
                    Error::Configuration("hierarchical process requires a manager".to_string())
                })?;
                if !manager.allow_delegation {
                    return Err(Error::Configuration(format!(
                        "manager '{}' must allow delegation",
                        manager.id
                    )));
                }
                let workers: Vec<Arc<Agent>> = config
                    .agents
                    .iter()
                    .filter(|a| a.id != manager.id)
                    .cloned()
                    .collect();
                if workers.is_empty() {
                    return Err(Error::Configuration(
                        "hierarchical process requires at least one agent besides the manager"
                            .to_string(),
                    ));
                }
                let policy = config
                    .delegation
                    .clone()
                    .unwrap_or_else(|| Arc::new(KeywordDelegation));
                Arc::new(HierarchicalProcess::new(manager, workers, policy))
            }
        };

        info!(
            "Swarm '{}' ready: {} agents, {} tasks, {} process",
            config.name,
            config.agents.len(),
            config.tasks.len(),
            config.process
        );

        Ok(Self {
            inner: Arc::new(SwarmInner {
                name: config.name,
                agents: config.agents,
                tasks: config.tasks,
                process: config.process,
                strategy,
                memory: config.memory,
                knowledge: config.knowledge,
                rate_limiter,
                config: config.config,
                events: config.events.unwrap_or_else(|| Arc::new(TracingSink)),
                status: RwLock::new(SwarmStatus::Ready),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.inner.agents
    }

    /// Task templates in declaration order.
    pub fn tasks(&self) -> &[Task] {
        &self.inner.tasks
    }

    pub fn process(&self) -> Process {
        self.inner.process
    }

    pub fn memory(&self) -> Option<&Arc<dyn MemoryStore>> {
        self.inner.memory.as_ref()
    }

    pub fn knowledge(&self) -> Option<&Arc<dyn MemoryStore>> {
        self.inner.knowledge.as_ref()
    }

    pub fn config(&self) -> &BTreeMap<String, Value> {
        &self.inner.config
    }

    pub fn status(&self) -> SwarmStatus {
        match self.inner.status.read() {
            Ok(status) => *status,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_status(&self, status: SwarmStatus) {
        match self.inner.status.write() {
            Ok(mut guard) => *guard = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }

    fn emit(&self, event: SwarmEvent) {
        self.inner.events.emit(event);
    }

    /// Execute every task once with `inputs`.
    ///
    /// # Errors
    /// Any failure aborts the run and is returned as [`Error::RunFailed`]
    /// carrying the run id and the original error.
    pub async fn run(&self, inputs: Inputs) -> Result<SwarmOutput> {
        let run_id = Uuid::new_v4();
        self.set_status(SwarmStatus::Running);
        info!("Swarm '{}' starting run {}", self.inner.name, run_id);

        let run = RunContext {
            run_id,
            inputs,
            events: Arc::clone(&self.inner.events),
            memory: self.inner.memory.clone(),
            rate_limiter: self.inner.rate_limiter.clone(),
        };
        run.emit(run.event(
            EventKind::RunStarted,
            format!("Swarm '{}' started", self.inner.name),
        ));
        run.emit(run.event(
            EventKind::ProcessStarted,
            format!("{} process started", self.inner.process),
        ));

        let tasks: Vec<Task> = self
            .inner
            .tasks
            .iter()
            .map(|t| t.instantiate(&run.inputs))
            .collect();

        match self.inner.strategy.execute(tasks, &run).await {
            Ok(output) => {
                run.emit(run.event(
                    EventKind::ProcessCompleted,
                    format!("{} tasks finished", output.tasks_output().len()),
                ));
                run.emit(run.event(EventKind::RunCompleted, output.raw().to_string()));
                self.set_status(SwarmStatus::Completed);
                info!(
                    "Swarm '{}' completed run {} (success: {})",
                    self.inner.name,
                    run_id,
                    output.success()
                );
                Ok(output)
            }
            Err(e) => {
                error!("Swarm '{}' run {} failed: {}", self.inner.name, run_id, e);
                run.emit(run.event(EventKind::ProcessFailed, e.to_string()));
                run.emit(run.event(EventKind::RunFailed, e.to_string()));
                self.set_status(SwarmStatus::Failed);
                Err(Error::RunFailed {
                    run_id,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Spawn [`Swarm::run`] on the tokio runtime.
    pub fn run_async(&self, inputs: Inputs) -> JoinHandle<Result<SwarmOutput>> {
        let swarm = self.clone();
        tokio::spawn(async move { swarm.run(inputs).await })
    }

    /// Run once per input map, one after another. Stops at the first failure.
    pub async fn run_for_each(&self, inputs: Vec<Inputs>) -> Result<Vec<SwarmOutput>> {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            results.push(self.run(input).await?);
        }
        Ok(results)
    }

    /// Run once per input map, all concurrently. Results keep input order.
    ///
    /// Every run is awaited before the first error, if any, is returned.
    pub async fn run_for_each_async(&self, inputs: Vec<Inputs>) -> Result<Vec<SwarmOutput>> {
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| self.run_async(input))
            .collect();

        let mut joined = Vec::with_capacity(handles.len());
        for handle in handles {
            joined.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::TaskJoin(e.to_string())),
            });
        }
        joined.into_iter().collect()
    }

    /// Clear the selected store(s).
    ///
    /// # Errors
    /// [`Error::Configuration`] when the selected store is not configured.
    pub async fn reset_memory(&self, kind: MemoryKind) -> Result<()> {
        let stores: Vec<&Arc<dyn MemoryStore>> = match kind {
            MemoryKind::Memory => self.inner.memory.iter().collect(),
            MemoryKind::Knowledge => self.inner.knowledge.iter().collect(),
            MemoryKind::All => self
                .inner
                .memory
                .iter()
                .chain(self.inner.knowledge.iter())
                .collect(),
        };
        if stores.is_empty() {
            return Err(Error::Configuration(format!(
                "no {} store configured",
                kind
            )));
        }

        for store in stores {
            store.reset().await?;
        }
        info!("Swarm '{}': {} store reset", self.inner.name, kind);
        self.emit(SwarmEvent::new(
            EventKind::MemoryReset,
            None,
            format!("{} reset", kind),
        ));
        Ok(())
    }
}

impl std::fmt::Debug for Swarm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Swarm")
            .field("name", &self.inner.name)
            .field("process", &self.inner.process)
            .field("agents", &self.inner.agents.len())
            .field("tasks", &self.inner.tasks.len())
            .field("status", &self.status())
            .finish()
    }
}
