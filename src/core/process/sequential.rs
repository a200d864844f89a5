use super::{run_task, select_context, ExecutionStrategy, RunContext};
use crate::agents::{Agent, CapabilityError};
use crate::core::output::{OutputAggregator, SwarmOutput};
use crate::core::resolver::order_tasks;
use crate::core::task::Task;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs tasks one after another in dependency order, each on its assigned agent.
#[derive(Debug, Clone)]
pub struct SequentialProcess {
    agents: Vec<Arc<Agent>>,
}

impl SequentialProcess {
    pub fn new(agents: Vec<Arc<Agent>>) -> Self {
        Self { agents }
    }

    fn agent_for(&self, task: &Task) -> Result<&Arc<Agent>> {
        task.agent
            .as_ref()
            .and_then(|id| self.agents.iter().find(|a| &a.id == id))
            .ok_or_else(|| Error::CapabilityExecution {
                task: task.id.clone(),
                agent: task.agent.clone(),
                source: CapabilityError::Unassigned(task.id.clone()),
            })
    }
}

#[async_trait]
impl ExecutionStrategy for SequentialProcess {
    async fn execute(&self, tasks: Vec<Task>, run: &RunContext) -> Result<SwarmOutput> {
        let ordered = order_tasks(tasks)?;
        info!(
            "Run {}: executing {} tasks sequentially",
            run.run_id,
            ordered.len()
        );

        let mut aggregator = OutputAggregator::new(run.run_id);
        for mut task in ordered {
            let agent = self.agent_for(&task)?;
            let context = select_context(&task, aggregator.history());
            debug!(
                "Task '{}' receives {} context outputs",
                task.id,
                context.len()
            );
            let output = run_task(&mut task, agent, context, run).await?;
            aggregator.record(output);
        }

        Ok(aggregator.finish())
    }
}
