//! Per-task and per-run result records.

use super::task::{Task, TaskId};
use crate::agents::AgentId;
use crate::constants::SUMMARY_WORD_COUNT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Result of one task execution (or skip).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskOutput {
    pub task_id: TaskId,
    /// Agent that produced the output; `None` for skipped tasks.
    pub agent_id: Option<AgentId>,
    pub description: String,
    /// Raw text returned by the executor.
    pub raw: String,
    /// First words of the task description.
    pub summary: String,
    pub success: bool,
    pub skipped: bool,
    pub duration: Duration,
    /// Parsed JSON for tasks declared with `output_json`.
    pub structured: Option<Value>,
}

impl TaskOutput {
    pub(crate) fn from_execution(
        task: &Task,
        agent: &AgentId,
        raw: String,
        duration: Duration,
    ) -> Self {
        let mut output = Self {
            task_id: task.id.clone(),
            agent_id: Some(agent.clone()),
            description: task.description.clone(),
            summary: summarize(&task.description),
            raw,
            success: true,
            skipped: false,
            duration,
            structured: None,
        };

        if task.output_json {
            match parse_structured(&output.raw) {
                Some(value) => output.structured = Some(value),
                None => {
                    warn!("Task '{}' did not return valid JSON output", task.id);
                    output.success = false;
                }
            }
        }

        output
    }

    pub(crate) fn skipped(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            agent_id: None,
            description: task.description.clone(),
            summary: summarize(&task.description),
            raw: String::new(),
            success: true,
            skipped: true,
            duration: Duration::ZERO,
            structured: None,
        }
    }
}

impl std::fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// First [`SUMMARY_WORD_COUNT`] words of `description` followed by `...`.
pub fn summarize(description: &str) -> String {
    let words: Vec<&str> = description
        .split_whitespace()
        .take(SUMMARY_WORD_COUNT)
        .collect();
    format!("{}...", words.join(" "))
}

/// Parse `raw` as JSON, also accepting a fenced ```json block.
pub fn parse_structured(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let start = trimmed.find("```")?;
    let after_fence = &trimmed[start + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    serde_json::from_str(body[..end].trim()).ok()
}

/// Aggregated, immutable record of one full run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmOutput {
    run_id: Uuid,
    tasks_output: Vec<TaskOutput>,
    raw: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    success: bool,
    metrics: BTreeMap<String, u64>,
}

impl SwarmOutput {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Outputs in execution order.
    pub fn tasks_output(&self) -> &[TaskOutput] {
        &self.tasks_output
    }

    /// Final text: the raw output of the last recorded task.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// `true` when every task output succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn metrics(&self) -> &BTreeMap<String, u64> {
        &self.metrics
    }

    pub fn output_for(&self, task: &TaskId) -> Option<&TaskOutput> {
        self.tasks_output.iter().find(|o| &o.task_id == task)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for SwarmOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Collects task outputs for one run and produces the [`SwarmOutput`].
#[derive(Debug)]
pub struct OutputAggregator {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    outputs: Vec<TaskOutput>,
}

impl OutputAggregator {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            outputs: Vec::new(),
        }
    }

    pub fn record(&mut self, output: TaskOutput) {
        self.outputs.push(output);
    }

    /// Outputs recorded so far, in order.
    pub fn history(&self) -> &[TaskOutput] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn finish(self) -> SwarmOutput {
        let finished_at = Utc::now();
        let success = self.outputs.iter().all(|o| o.success);
        let raw = self
            .outputs
            .last()
            .map(|o| o.raw.clone())
            .unwrap_or_default();

        let skipped = self.outputs.iter().filter(|o| o.skipped).count() as u64;
        let total = self.outputs.len() as u64;
        let duration_ms = (finished_at - self.started_at).num_milliseconds().max(0) as u64;

        let mut metrics = BTreeMap::new();
        metrics.insert("tasks_total".to_string(), total);
        metrics.insert("tasks_completed".to_string(), total - skipped);
        metrics.insert("tasks_skipped".to_string(), skipped);
        metrics.insert("executor_calls".to_string(), total - skipped);
        metrics.insert("duration_ms".to_string(), duration_ms);

        SwarmOutput {
            run_id: self.run_id,
            tasks_output: self.outputs,
            raw,
            started_at: self.started_at,
            finished_at,
            success,
            metrics,
        }
    }
}
