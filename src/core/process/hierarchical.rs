use super::{run_task, select_context, ExecutionStrategy, RunContext};
use crate::agents::{Agent, CapabilityError};
use crate::constants::{
    COORDINATION_PROMPT, COORDINATION_TASK_ID, FINAL_SYNTHESIS_PROMPT, FINAL_SYNTHESIS_TASK_ID,
    SYNTHESIS_OUTPUT_CHAR_LIMIT,
};
use crate::core::delegation::DelegationPolicy;
use crate::core::output::{OutputAggregator, SwarmOutput, TaskOutput};
use crate::core::task::Task;
use crate::errors::{Error, Result};
use crate::utils::truncate_chars;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Manager-led execution.
///
/// The manager first describes a plan, then every task is delegated to a
/// worker in declaration order, and finally the manager combines the
/// delegated outputs into one answer.
#[derive(Debug, Clone)]
pub struct HierarchicalProcess {
    manager: Arc<Agent>,
    workers: Vec<Arc<Agent>>,
    policy: Arc<dyn DelegationPolicy>,
}

impl HierarchicalProcess {
    /// `workers` must not contain the manager.
    pub fn new(
        manager: Arc<Agent>,
        workers: Vec<Arc<Agent>>,
        policy: Arc<dyn DelegationPolicy>,
    ) -> Self {
        Self {
            manager,
            workers,
            policy,
        }
    }

    fn coordination_task(&self, tasks: &[Task]) -> Task {
        let mut description = String::from(COORDINATION_PROMPT);
        description.push_str("\n\nTasks:\n");
        for task in tasks {
            description.push_str(&format!("- [{}] {}\n", task.id, task.description));
        }
        description.push_str("\nTeam members:\n");
        for worker in &self.workers {
            description.push_str(&format!(
                "- {} ({}): {}\n",
                worker.id, worker.role, worker.goal
            ));
        }
        Task::new(
            COORDINATION_TASK_ID,
            description,
            "A short plan naming the team member for each task",
        )
    }

    fn synthesis_task(delegated: &[TaskOutput]) -> Task {
        let mut description = String::from(FINAL_SYNTHESIS_PROMPT);
        description.push_str("\n\n");
        for output in delegated.iter().filter(|o| !o.skipped) {
            description.push_str(&format!(
                "Result of task '{}':\n{}\n\n",
                output.task_id,
                truncate_chars(&output.raw, SYNTHESIS_OUTPUT_CHAR_LIMIT)
            ));
        }
        Task::new(
            FINAL_SYNTHESIS_TASK_ID,
            description,
            "One final answer built only from the supplied results",
        )
    }

    /// The pre-assigned worker when it is a team member, otherwise the policy's pick.
    fn delegate_for(&self, task: &Task) -> Result<&Arc<Agent>> {
        if let Some(assigned) = &task.agent {
            if let Some(worker) = self.workers.iter().find(|w| &w.id == assigned) {
                return Ok(worker);
            }
        }
        self.policy
            .select(task, &self.workers)
            .and_then(|index| self.workers.get(index))
            .ok_or_else(|| Error::CapabilityExecution {
                task: task.id.clone(),
                agent: None,
                source: CapabilityError::Unassigned(task.id.clone()),
            })
    }
}

#[async_trait]
impl ExecutionStrategy for HierarchicalProcess {
    async fn execute(&self, tasks: Vec<Task>, run: &RunContext) -> Result<SwarmOutput> {
        info!(
            "Run {}: manager '{}' coordinating {} tasks across {} workers",
            run.run_id,
            self.manager.id,
            tasks.len(),
            self.workers.len()
        );
        let mut aggregator = OutputAggregator::new(run.run_id);

        let mut coordination = self.coordination_task(&tasks);
        let plan = run_task(&mut coordination, &self.manager, Vec::new(), run).await?;
        debug!("Coordination plan: {}", plan.raw);
        aggregator.record(plan);

        let mut delegated: Vec<TaskOutput> = Vec::with_capacity(tasks.len());
        for mut task in tasks {
            let worker = Arc::clone(self.delegate_for(&task)?);
            task.assign(worker.id.clone());
            debug!("Delegating task '{}' to '{}'", task.id, worker.id);

            let context = select_context(&task, &delegated);
            let output = run_task(&mut task, &worker, context, run).await?;
            delegated.push(output.clone());
            aggregator.record(output);
        }

        let mut synthesis = Self::synthesis_task(&delegated);
        let answer = run_task(&mut synthesis, &self.manager, Vec::new(), run).await?;
        aggregator.record(answer);

        Ok(aggregator.finish())
    }
}
