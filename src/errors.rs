use crate::agents::{AgentId, CapabilityError};
use crate::core::TaskId;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("Cyclic dependency between tasks: {}", join_ids(.tasks))]
    CyclicDependency { tasks: Vec<TaskId> },

    #[error("Task '{0}' has already been executed")]
    AlreadyExecuted(TaskId),

    #[error("Task '{task}' failed{}: {source}", agent_suffix(.agent))]
    CapabilityExecution {
        task: TaskId,
        agent: Option<AgentId>,
        #[source]
        source: CapabilityError,
    },

    #[error("Run {run_id} failed: {source}")]
    RunFailed {
        run_id: Uuid,
        #[source]
        source: Box<Error>,
    },

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Innermost error of a `RunFailed` chain, or `self` for any other variant.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::RunFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn agent_suffix(agent: &Option<AgentId>) -> String {
    match agent {
        Some(id) => format!(" on agent '{}'", id),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
