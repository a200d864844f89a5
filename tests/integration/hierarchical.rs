//! Hierarchical process integration tests.

use std::sync::Arc;

use swarmflow::agents::Agent;
use swarmflow::constants::{COORDINATION_TASK_ID, FINAL_SYNTHESIS_TASK_ID};
use swarmflow::core::{DelegationPolicy, Process, Swarm, SwarmConfig, Task};
use swarmflow::event::EventKind;
use swarmflow::utils::Inputs;
use swarmflow::Error;

use crate::fixtures::{agent, manager, EventCollector, ScriptedExecutor};

fn team(executor: &Arc<ScriptedExecutor>) -> Vec<Arc<Agent>> {
    vec![
        agent(
            "analyst",
            "Market analyst",
            "Study market trends",
            executor.clone(),
        ),
        agent(
            "writer",
            "Technical writer",
            "Produce clear documentation",
            executor.clone(),
        ),
    ]
}

/// Given a manager and two workers with two tasks
/// When the swarm runs hierarchically
/// Then the result holds the coordination, both delegated outputs and the synthesis, in order
#[tokio::test]
async fn test_manager_wraps_delegated_outputs() {
    let executor = ScriptedExecutor::new();
    let events = EventCollector::new();
    let config = SwarmConfig::new(
        team(&executor),
        vec![
            Task::new("trends", "Summarize market trends for 2024", "Trends"),
            Task::new("docs", "Write documentation for the findings", "Docs")
                .depends_on("trends"),
        ],
    )
    .with_process(Process::Hierarchical)
    .with_manager(manager(executor.clone()))
    .with_events(events.clone());
    let swarm = Swarm::new(config).unwrap();

    let result = swarm.run(Inputs::new()).await.unwrap();

    let ids: Vec<&str> = result
        .tasks_output()
        .iter()
        .map(|o| o.task_id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![COORDINATION_TASK_ID, "trends", "docs", FINAL_SYNTHESIS_TASK_ID]
    );
    assert_eq!(result.tasks_output()[1].raw, "analyst:trends");
    assert_eq!(result.tasks_output()[2].raw, "writer:docs");
    assert_eq!(result.raw(), format!("manager:{}", FINAL_SYNTHESIS_TASK_ID));
    assert!(result.success());

    let calls = executor.calls();
    let docs = calls.iter().find(|c| c.task == "docs").unwrap();
    assert_eq!(docs.context, vec!["trends"]);
    let synthesis = calls.last().unwrap();
    assert_eq!(synthesis.agent, "manager");
    assert!(synthesis.description.contains("analyst:trends"));
    assert!(synthesis.description.contains("writer:docs"));

    let delegated_agents: Vec<String> = events
        .events()
        .into_iter()
        .filter(|e| e.kind == EventKind::TaskCompleted)
        .filter_map(|e| e.agent_id.map(|a| a.to_string()))
        .collect();
    assert_eq!(delegated_agents, vec!["manager", "analyst", "writer", "manager"]);
}

/// The coordination step lists every task and every worker but not the manager.
#[tokio::test]
async fn test_coordination_describes_tasks_and_team() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        team(&executor),
        vec![Task::new("trends", "Summarize market trends", "Trends")],
    )
    .with_process(Process::Hierarchical)
    .with_manager(manager(executor.clone()));
    let swarm = Swarm::new(config).unwrap();
    swarm.run(Inputs::new()).await.unwrap();

    let coordination = &executor.calls()[0];
    assert_eq!(coordination.task, COORDINATION_TASK_ID);
    assert!(coordination.description.contains("[trends]"));
    assert!(coordination.description.contains("analyst (Market analyst)"));
    assert!(coordination.description.contains("writer (Technical writer)"));
    assert!(!coordination.description.contains("manager (Project manager)"));
}

/// Required capabilities take priority over keyword matches.
#[tokio::test]
async fn test_capabilities_drive_delegation() {
    let executor = ScriptedExecutor::new();
    let mut workers = team(&executor);
    workers.push(Arc::new(
        Agent::new("searcher", "Librarian", "Catalog", "", executor.clone())
            .with_capabilities(["web_search"]),
    ));
    let config = SwarmConfig::new(
        workers,
        vec![Task::new("trends", "Summarize market trends", "Trends")
            .with_required_capabilities(["web_search"])],
    )
    .with_process(Process::Hierarchical)
    .with_manager(manager(executor.clone()));
    let swarm = Swarm::new(config).unwrap();

    let result = swarm.run(Inputs::new()).await.unwrap();
    assert_eq!(result.tasks_output()[1].raw, "searcher:trends");
}

/// A manager that may not delegate fails validation before anything runs.
#[tokio::test]
async fn test_non_delegating_manager_rejected() {
    let executor = ScriptedExecutor::new();
    let lazy_manager = agent("manager", "Manager", "Watch", executor.clone());
    let config = SwarmConfig::new(
        team(&executor),
        vec![Task::new("trends", "Summarize market trends", "Trends")],
    )
    .with_process(Process::Hierarchical)
    .with_manager(lazy_manager);

    assert!(matches!(Swarm::new(config), Err(Error::Configuration(_))));
    assert!(executor.calls().is_empty());
}

/// A failing delegated task aborts the run before the synthesis step.
#[tokio::test]
async fn test_delegated_failure_aborts_run() {
    let executor = ScriptedExecutor::failing_on(&["trends"]);
    let events = EventCollector::new();
    let config = SwarmConfig::new(
        team(&executor),
        vec![
            Task::new("trends", "Summarize market trends", "Trends"),
            Task::new("docs", "Write documentation", "Docs"),
        ],
    )
    .with_process(Process::Hierarchical)
    .with_manager(manager(executor.clone()))
    .with_events(events.clone());
    let swarm = Swarm::new(config).unwrap();

    let err = swarm.run(Inputs::new()).await.unwrap_err();

    assert!(matches!(err, Error::RunFailed { .. }));
    assert_eq!(executor.called_tasks(), vec![COORDINATION_TASK_ID, "trends"]);
    let failed = events
        .events()
        .into_iter()
        .find(|e| e.kind == EventKind::TaskFailed)
        .unwrap();
    assert_eq!(failed.agent_id.map(|a| a.to_string()), Some("analyst".to_string()));
    assert_eq!(events.kinds().last(), Some(&EventKind::RunFailed));
}

/// Always picks the last worker.
#[derive(Debug)]
struct LastWorker;

impl DelegationPolicy for LastWorker {
    fn select(&self, _task: &Task, workers: &[Arc<Agent>]) -> Option<usize> {
        workers.len().checked_sub(1)
    }
}

/// A custom policy replaces the keyword matching.
#[tokio::test]
async fn test_custom_delegation_policy() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        team(&executor),
        vec![Task::new("trends", "Summarize market trends", "Trends")],
    )
    .with_process(Process::Hierarchical)
    .with_manager(manager(executor.clone()))
    .with_delegation(Arc::new(LastWorker));
    let swarm = Swarm::new(config).unwrap();

    let result = swarm.run(Inputs::new()).await.unwrap();
    assert_eq!(result.tasks_output()[1].raw, "writer:trends");
}
