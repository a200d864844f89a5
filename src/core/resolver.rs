//! Dependency validation and ordering.
//!
//! Tasks reference each other by [`TaskId`]. Validation rejects duplicate ids
//! and references to unknown tasks; ordering produces a deterministic
//! linearization that keeps declaration order among tasks that become ready
//! at the same time.

use super::task::{Task, TaskId};
use crate::errors::{Error, Result};
use std::collections::{HashSet, VecDeque};

/// Check that task ids are unique and every dependency names a known task.
///
/// # Errors
/// - [`Error::Configuration`] on a duplicate task id.
/// - [`Error::UnknownDependency`] on the first dependency that names no task.
pub fn validate_dependencies(tasks: &[Task]) -> Result<()> {
    let mut ids: HashSet<&TaskId> = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !ids.insert(&task.id) {
            return Err(Error::Configuration(format!(
                "duplicate task id '{}'",
                task.id
            )));
        }
    }

    for task in tasks {
        if let Some(dependency) = task.dependencies.iter().find(|dep| !ids.contains(dep)) {
            return Err(Error::UnknownDependency {
                task: task.id.clone(),
                dependency: dependency.clone(),
            });
        }
    }

    Ok(())
}

/// Indices of `tasks` in execution order (Kahn's algorithm).
///
/// The queue is seeded with dependency-free tasks in declaration order. Each
/// time a task is processed, every not-yet-queued task whose dependencies are
/// all processed is enqueued, again scanning in declaration order.
///
/// # Errors
/// Returns [`Error::CyclicDependency`] listing the tasks that could not be
/// ordered, which happens for cycles and for dependencies on unknown ids.
pub fn execution_order(tasks: &[Task]) -> Result<Vec<usize>> {
    let mut processed: HashSet<&TaskId> = HashSet::with_capacity(tasks.len());
    let mut queued = vec![false; tasks.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    let mut order = Vec::with_capacity(tasks.len());

    for (index, task) in tasks.iter().enumerate() {
        if task.dependencies.is_empty() {
            queued[index] = true;
            queue.push_back(index);
        }
    }

    while let Some(index) = queue.pop_front() {
        processed.insert(&tasks[index].id);
        order.push(index);

        for (candidate, task) in tasks.iter().enumerate() {
            if queued[candidate] {
                continue;
            }
            if task.dependencies.iter().all(|dep| processed.contains(dep)) {
                queued[candidate] = true;
                queue.push_back(candidate);
            }
        }
    }

    if order.len() < tasks.len() {
        let unresolved = tasks
            .iter()
            .enumerate()
            .filter(|(index, _)| !queued[*index])
            .map(|(_, task)| task.id.clone())
            .collect();
        return Err(Error::CyclicDependency { tasks: unresolved });
    }

    Ok(order)
}

/// Return `tasks` reordered so every task follows all of its dependencies.
///
/// # Errors
/// See [`execution_order`].
pub fn order_tasks(tasks: Vec<Task>) -> Result<Vec<Task>> {
    let order = execution_order(&tasks)?;
    let mut slots: Vec<Option<Task>> = tasks.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect())
}
