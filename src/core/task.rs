//! Task data model.
//!
//! A [`Task`] is the atomic, single-use unit of work handed to an agent. It
//! tracks its declared dependencies, status and output, and refuses to run a
//! second time once it has left the `Pending` state.

use super::output::TaskOutput;
use crate::agents::{Agent, AgentId, CapabilityError, TaskPrompt};
use crate::errors::{Error, Result};
use crate::utils::{interpolate_inputs, Inputs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifier of a task within a swarm.
///
/// Dependencies reference tasks by this id, so it is usually a short
/// human-chosen name such as `"research"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a random identifier for tasks created without an explicit id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Task status in its lifecycle.
///
/// Transitions only move forward: `Pending` → `Running` → one of the three
/// terminal states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed {
        error: String,
    },
    Skipped,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed { error } => write!(f, "failed: {}", error),
            TaskStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Gating predicate evaluated against the context outputs a task would receive.
/// Returning `false` skips the task.
pub type Condition = Arc<dyn Fn(&[TaskOutput]) -> bool + Send + Sync>;

/// A single unit of work.
#[derive(Clone)]
pub struct Task {
    /// Unique identifier, referenced by other tasks' dependencies.
    pub id: TaskId,
    /// What the agent should do.
    pub description: String,
    /// Description of the result the agent should produce.
    pub expected_output: String,
    /// Agent assigned to this task. Optional in hierarchical mode.
    pub agent: Option<AgentId>,
    /// Ids of the tasks whose outputs this task consumes, in declaration order.
    pub dependencies: Vec<TaskId>,
    /// Capabilities a delegate should hold to take this task.
    pub required_capabilities: Vec<String>,
    /// Run the executor call on a separate tokio task. Only the final task may set this.
    pub async_execution: bool,
    /// Expected upper bound on execution time. Exceeding it only logs a warning.
    pub max_execution_time: Option<Duration>,
    /// Extra key/value context passed to the executor alongside the prompt.
    pub context: BTreeMap<String, String>,
    /// Parse the raw output as JSON into [`TaskOutput::structured`].
    pub output_json: bool,
    condition: Option<Condition>,
    status: TaskStatus,
    output: Option<TaskOutput>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task.
    pub fn new(
        id: impl Into<TaskId>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            agent: None,
            dependencies: Vec::new(),
            required_capabilities: Vec::new(),
            async_execution: false,
            max_execution_time: None,
            context: BTreeMap::new(),
            output_json: false,
            condition: None,
            status: TaskStatus::Pending,
            output: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_agent(mut self, agent: impl Into<AgentId>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Declare a dependency. Repeated ids are ignored.
    pub fn depends_on(mut self, task: impl Into<TaskId>) -> Self {
        let task = task.into();
        if !self.dependencies.contains(&task) {
            self.dependencies.push(task);
        }
        self
    }

    pub fn with_required_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&[TaskOutput]) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn with_async_execution(mut self, async_execution: bool) -> Self {
        self.async_execution = async_execution;
        self
    }

    pub fn with_max_execution_time(mut self, limit: Duration) -> Self {
        self.max_execution_time = Some(limit);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_output_json(mut self, output_json: bool) -> Self {
        self.output_json = output_json;
        self
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    /// Output of the task. Present only once the task completed or was skipped.
    pub fn output(&self) -> Option<&TaskOutput> {
        self.output.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// Check if the task is in a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Completed | TaskStatus::Failed { .. } | TaskStatus::Skipped
        )
    }

    /// Whether the gating predicate, if any, lets the task run with this context.
    pub fn should_execute(&self, context: &[TaskOutput]) -> bool {
        match &self.condition {
            Some(condition) => condition(context),
            None => true,
        }
    }

    /// Bind the task to an agent.
    pub fn assign(&mut self, agent: AgentId) {
        self.agent = Some(agent);
    }

    /// Fresh, pending copy of this task with `{key}` placeholders filled from `inputs`.
    ///
    /// Swarms keep their tasks as templates and run these copies, so the
    /// template itself is never consumed.
    pub fn instantiate(&self, inputs: &Inputs) -> Task {
        let mut task = self.clone();
        task.description = interpolate_inputs(&self.description, inputs);
        task.expected_output = interpolate_inputs(&self.expected_output, inputs);
        task.context = self
            .context
            .iter()
            .map(|(k, v)| (k.clone(), interpolate_inputs(v, inputs)))
            .collect();
        task.status = TaskStatus::Pending;
        task.output = None;
        task.started_at = None;
        task.completed_at = None;
        task
    }

    /// Build the prompt the executor receives for this task.
    pub fn prompt(&self, context: Vec<TaskOutput>) -> TaskPrompt {
        TaskPrompt {
            task_id: self.id.clone(),
            description: self.description.clone(),
            expected_output: self.expected_output.clone(),
            context,
            extra: self.context.clone(),
        }
    }

    /// Transition `Pending` → `Running`.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyExecuted`] if the task left `Pending` before.
    pub fn start(&mut self) -> Result<()> {
        if self.status != TaskStatus::Pending {
            return Err(Error::AlreadyExecuted(self.id.clone()));
        }
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    fn complete(&mut self, output: TaskOutput) {
        self.status = TaskStatus::Completed;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
    }

    fn fail(&mut self, error: &str) {
        self.status = TaskStatus::Failed {
            error: error.to_string(),
        };
        self.completed_at = Some(Utc::now());
    }

    /// Mark a pending task as skipped and record its skip output.
    ///
    /// # Errors
    /// Returns [`Error::AlreadyExecuted`] if the task left `Pending` before.
    pub fn skip(&mut self) -> Result<TaskOutput> {
        self.start()?;
        let output = TaskOutput::skipped(self);
        self.status = TaskStatus::Skipped;
        self.output = Some(output.clone());
        self.completed_at = Some(Utc::now());
        Ok(output)
    }

    /// Execute the task through `agent` with the given context outputs.
    ///
    /// The agent's interpolated context is built from `inputs`. Async tasks
    /// are spawned on the runtime and joined before returning.
    ///
    /// # Errors
    /// - [`Error::AlreadyExecuted`] when called on a task that already ran.
    /// - [`Error::CapabilityExecution`] when the executor fails; the task is
    ///   then marked `Failed`.
    pub async fn execute(
        &mut self,
        agent: &Arc<Agent>,
        context: Vec<TaskOutput>,
        inputs: &Inputs,
    ) -> Result<TaskOutput> {
        self.start()?;
        self.assign(agent.id.clone());
        debug!("Executing task '{}' with agent '{}'", self.id, agent.id);

        let prompt = self.prompt(context);
        let agent_context = agent.context(inputs);
        let started = Instant::now();

        let result = if self.async_execution {
            let agent = Arc::clone(agent);
            let handle =
                tokio::spawn(async move { agent.execute(&agent_context, &prompt).await });
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(CapabilityError::Join(e.to_string())),
            }
        } else {
            agent.execute(&agent_context, &prompt).await
        };
        let elapsed = started.elapsed();

        if let Some(limit) = self.max_execution_time {
            if elapsed > limit {
                warn!(
                    "Task '{}' took {:?}, longer than its {:?} hint",
                    self.id, elapsed, limit
                );
            }
        }

        match result {
            Ok(raw) => {
                let output = TaskOutput::from_execution(self, &agent.id, raw, elapsed);
                self.complete(output.clone());
                Ok(output)
            }
            Err(source) => {
                self.fail(&source.to_string());
                Err(Error::CapabilityExecution {
                    task: self.id.clone(),
                    agent: Some(agent.id.clone()),
                    source,
                })
            }
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("agent", &self.agent)
            .field("dependencies", &self.dependencies)
            .field("status", &self.status)
            .field("has_condition", &self.condition.is_some())
            .field("async_execution", &self.async_execution)
            .finish()
    }
}
