//! Sequential process integration tests.

use serde_json::json;

use swarmflow::core::{Swarm, SwarmConfig, Task, TaskId};
use swarmflow::event::EventKind;
use swarmflow::utils::Inputs;
use swarmflow::Error;

use crate::fixtures::{agent, task, EventCollector, ScriptedExecutor};

/// Given three independent tasks
/// When the swarm runs sequentially
/// Then every task completes in declaration order and the final text is the last output
#[tokio::test]
async fn test_three_independent_tasks_in_declaration_order() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![task("t1", "writer"), task("t2", "writer"), task("t3", "writer")],
    );
    let swarm = Swarm::new(config).unwrap();

    let result = swarm.run(Inputs::new()).await.unwrap();

    let ids: Vec<&str> = result
        .tasks_output()
        .iter()
        .map(|o| o.task_id.as_str())
        .collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);
    assert_eq!(result.raw(), "writer:t3");
    assert!(result.success());
    assert_eq!(result.metrics().get("executor_calls"), Some(&3));
}

/// Given task2 depending on task1
/// When task1 fails
/// Then the run fails and task2 never executes
#[tokio::test]
async fn test_failure_aborts_dependents() {
    let executor = ScriptedExecutor::failing_on(&["t1"]);
    let events = EventCollector::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![task("t1", "writer"), task("t2", "writer").depends_on("t1")],
    )
    .with_events(events.clone());
    let swarm = Swarm::new(config).unwrap();

    let err = swarm.run(Inputs::new()).await.unwrap_err();

    assert!(matches!(err, Error::RunFailed { .. }));
    assert!(matches!(
        err.root_cause(),
        Error::CapabilityExecution { task, .. } if task.as_str() == "t1"
    ));
    assert_eq!(executor.called_tasks(), vec!["t1"]);
    assert_eq!(
        events.kinds(),
        vec![
            EventKind::RunStarted,
            EventKind::ProcessStarted,
            EventKind::TaskStarted,
            EventKind::TaskFailed,
            EventKind::ProcessFailed,
            EventKind::RunFailed,
        ]
    );
}

/// Tasks with declared dependencies see only those outputs; others see the full history.
#[tokio::test]
async fn test_context_follows_declared_dependencies() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![
            task("research", "writer"),
            task("outline", "writer"),
            task("draft", "writer").depends_on("research"),
            task("review", "writer"),
        ],
    );
    let swarm = Swarm::new(config).unwrap();
    swarm.run(Inputs::new()).await.unwrap();

    let calls = executor.calls();
    let context_of = |id: &str| {
        calls
            .iter()
            .find(|c| c.task == id)
            .map(|c| c.context.clone())
            .unwrap()
    };
    assert!(context_of("research").is_empty());
    assert_eq!(context_of("outline"), vec!["research"]);
    assert_eq!(context_of("draft"), vec!["research"]);
    // review has no dependencies and becomes ready before draft
    assert_eq!(context_of("review"), vec!["research", "outline"]);
}

/// A task whose condition rejects its context is skipped without reaching the executor.
#[tokio::test]
async fn test_condition_false_skips_task() {
    let executor = ScriptedExecutor::new();
    let events = EventCollector::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![
            task("t1", "writer"),
            task("t2", "writer")
                .depends_on("t1")
                .with_condition(|ctx| ctx.iter().any(|o| o.raw.contains("approved"))),
            task("t3", "writer"),
        ],
    )
    .with_events(events.clone());
    let swarm = Swarm::new(config).unwrap();

    let result = swarm.run(Inputs::new()).await.unwrap();

    assert_eq!(executor.called_tasks(), vec!["t1", "t3"]);
    let skipped = result.output_for(&TaskId::from("t2")).unwrap();
    assert!(skipped.skipped);
    assert!(skipped.raw.is_empty());
    assert!(result.success());
    assert_eq!(result.metrics().get("tasks_skipped"), Some(&1));
    assert!(events.kinds().contains(&EventKind::TaskSkipped));
}

/// Inputs are interpolated into each run's fresh copy of the tasks.
#[tokio::test]
async fn test_inputs_interpolated_into_descriptions() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![Task::new("post", "Write about {topic} in {year}", "A post").with_agent("writer")],
    );
    let swarm = Swarm::new(config).unwrap();

    let mut inputs = Inputs::new();
    inputs.insert("topic".to_string(), json!("ownership"));
    inputs.insert("year".to_string(), json!(2024));
    swarm.run(inputs).await.unwrap();

    assert_eq!(executor.calls()[0].description, "Write about ownership in 2024");
    assert_eq!(swarm.tasks()[0].description, "Write about {topic} in {year}");
}

/// A task declared as JSON output that returns prose is recorded as unsuccessful.
#[tokio::test]
async fn test_invalid_json_output_marks_run_unsuccessful() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![task("t1", "writer").with_output_json(true), task("t2", "writer")],
    );
    let swarm = Swarm::new(config).unwrap();

    let result = swarm.run(Inputs::new()).await.unwrap();
    assert_eq!(result.tasks_output().len(), 2);
    assert!(!result.tasks_output()[0].success);
    assert!(!result.success());
}

/// An async final task is still awaited before the result is returned.
#[tokio::test]
async fn test_async_last_task_is_joined() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![
            task("t1", "writer"),
            task("t2", "writer").with_async_execution(true),
        ],
    );
    let swarm = Swarm::new(config).unwrap();

    let result = swarm.run(Inputs::new()).await.unwrap();
    assert_eq!(result.raw(), "writer:t2");
}

/// Cyclic graphs are rejected before anything runs.
#[tokio::test]
async fn test_cycle_rejected_before_execution() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![
            task("a", "writer").depends_on("c"),
            task("b", "writer").depends_on("a"),
            task("c", "writer").depends_on("b"),
        ],
    );

    let err = Swarm::new(config).unwrap_err();
    assert!(matches!(err, Error::CyclicDependency { ref tasks } if tasks.len() == 3));
    assert!(executor.calls().is_empty());
}

/// Each task runs on the agent it is assigned to.
#[tokio::test]
async fn test_tasks_routed_to_assigned_agents() {
    let research_exec = ScriptedExecutor::new();
    let writing_exec = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![
            agent("researcher", "Researcher", "Find", research_exec.clone()),
            agent("writer", "Writer", "Write", writing_exec.clone()),
        ],
        vec![task("find", "researcher"), task("write", "writer").depends_on("find")],
    );
    let swarm = Swarm::new(config).unwrap();

    let result = swarm.run(Inputs::new()).await.unwrap();
    assert_eq!(research_exec.called_tasks(), vec!["find"]);
    assert_eq!(writing_exec.called_tasks(), vec!["write"]);
    assert_eq!(result.raw(), "writer:write");
    assert_eq!(swarm.agents()[0].execution_count(), 1);
    assert_eq!(swarm.agents()[1].execution_count(), 1);
}
