use crate::agents::AgentId;
use crate::core::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Lifecycle event types, in the order a run emits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    RunStarted,
    ProcessStarted,
    TaskStarted,
    TaskCompleted,
    TaskFailed,
    TaskSkipped,
    ProcessCompleted,
    ProcessFailed,
    RunCompleted,
    RunFailed,
    MemoryReset,
}

impl EventKind {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EventKind::TaskFailed | EventKind::ProcessFailed | EventKind::RunFailed
        )
    }
}

/// A lifecycle notification emitted by a swarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmEvent {
    pub kind: EventKind,
    pub message: String,
    /// Run the event belongs to; `None` for events outside a run
    pub run_id: Option<Uuid>,
    pub task_id: Option<TaskId>,
    /// Agent executing the task; the delegate in hierarchical runs
    pub agent_id: Option<AgentId>,
    pub timestamp: DateTime<Utc>,
}

impl SwarmEvent {
    pub fn new(kind: EventKind, run_id: Option<Uuid>, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            run_id,
            task_id: None,
            agent_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_task(mut self, task: &TaskId) -> Self {
        self.task_id = Some(task.clone());
        self
    }

    pub fn with_agent(mut self, agent: Option<&AgentId>) -> Self {
        self.agent_id = agent.cloned();
        self
    }
}

/// Receiver of lifecycle events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SwarmEvent);
}

impl EventSink for UnboundedSender<SwarmEvent> {
    fn emit(&self, event: SwarmEvent) {
        if let Err(e) = self.send(event) {
            debug!("Event receiver dropped: {:?}", e.0.kind);
        }
    }
}

/// Forwards events to `tracing`. Used when no sink is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: SwarmEvent) {
        let run = event
            .run_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        match event.kind {
            EventKind::TaskFailed | EventKind::ProcessFailed | EventKind::RunFailed => {
                error!("[{}] {:?}: {}", run, event.kind, event.message)
            }
            EventKind::TaskSkipped => warn!("[{}] {:?}: {}", run, event.kind, event.message),
            EventKind::RunStarted | EventKind::RunCompleted | EventKind::MemoryReset => {
                info!("[{}] {:?}: {}", run, event.kind, event.message)
            }
            _ => debug!("[{}] {:?}: {}", run, event.kind, event.message),
        }
    }
}

/// Adapts a closure into an [`EventSink`]
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(SwarmEvent) + Send + Sync,
{
    fn emit(&self, event: SwarmEvent) {
        (self.0)(event)
    }
}
