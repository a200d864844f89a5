//! Choosing a worker for a task in hierarchical runs.

use super::task::Task;
use crate::agents::Agent;
use crate::utils::keywords;
use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Picks the worker that should take a task.
pub trait DelegationPolicy: Debug + Send + Sync {
    /// Index into `workers` of the selected worker, or `None` when `workers` is empty.
    fn select(&self, task: &Task, workers: &[Arc<Agent>]) -> Option<usize>;
}

/// Default policy.
///
/// Tries, in order: the first worker holding one of the task's required
/// capabilities, the first worker whose role or goal shares a keyword with
/// the task description, then a stable hash of the task id.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordDelegation;

impl KeywordDelegation {
    fn by_capability(task: &Task, workers: &[Arc<Agent>]) -> Option<usize> {
        if task.required_capabilities.is_empty() {
            return None;
        }
        workers.iter().position(|worker| {
            task.required_capabilities
                .iter()
                .any(|cap| worker.has_capability(cap))
        })
    }

    fn by_keyword(task: &Task, workers: &[Arc<Agent>]) -> Option<usize> {
        let wanted = keywords(&task.description);
        if wanted.is_empty() {
            return None;
        }
        workers.iter().position(|worker| {
            let offered = keywords(&format!("{} {}", worker.role, worker.goal));
            !wanted.is_disjoint(&offered)
        })
    }

    fn by_hash(task: &Task, workers: &[Arc<Agent>]) -> usize {
        let mut hasher = DefaultHasher::new();
        task.id.hash(&mut hasher);
        (hasher.finish() % workers.len() as u64) as usize
    }
}

impl DelegationPolicy for KeywordDelegation {
    fn select(&self, task: &Task, workers: &[Arc<Agent>]) -> Option<usize> {
        if workers.is_empty() {
            return None;
        }
        Some(
            Self::by_capability(task, workers)
                .or_else(|| Self::by_keyword(task, workers))
                .unwrap_or_else(|| Self::by_hash(task, workers)),
        )
    }
}
