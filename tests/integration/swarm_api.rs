//! Swarm reuse, fan-out, event stream and memory tests.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use swarmflow::core::{Swarm, SwarmConfig, SwarmStatus, Task};
use swarmflow::event::EventKind;
use swarmflow::memory::{InMemoryStore, MemoryKind, MemoryStore};
use swarmflow::utils::Inputs;
use swarmflow::Error;

use crate::fixtures::{agent, task, EventCollector, ScriptedExecutor};

fn topic(name: &str) -> Inputs {
    let mut inputs = Inputs::new();
    inputs.insert("topic".to_string(), json!(name));
    inputs
}

fn topic_swarm(executor: &Arc<ScriptedExecutor>) -> Swarm {
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![Task::new("post", "Write about {topic}", "A post").with_agent("writer")],
    );
    Swarm::new(config).unwrap()
}

/// Given one swarm and three input maps
/// When run_for_each is called
/// Then three independent results come back in input order
#[tokio::test]
async fn test_run_for_each_reuses_swarm() {
    let executor = ScriptedExecutor::new();
    let swarm = topic_swarm(&executor);

    let results = swarm
        .run_for_each(vec![topic("rust"), topic("tokio"), topic("serde")])
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    let descriptions: Vec<String> = executor.calls().into_iter().map(|c| c.description).collect();
    assert_eq!(
        descriptions,
        vec!["Write about rust", "Write about tokio", "Write about serde"]
    );
    let mut run_ids: Vec<_> = results.iter().map(|r| r.run_id()).collect();
    run_ids.dedup();
    assert_eq!(run_ids.len(), 3);
    assert_eq!(swarm.status(), SwarmStatus::Completed);
}

/// Concurrent fan-out keeps the order of the inputs in its results.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_for_each_async_keeps_input_order() {
    let executor = ScriptedExecutor::new();
    let swarm = topic_swarm(&executor);

    let results = swarm
        .run_for_each_async(vec![topic("a"), topic("b"), topic("c"), topic("d")])
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(executor.calls().len(), 4);
    for result in &results {
        assert_eq!(result.raw(), "writer:post");
    }
}

/// One failing run in a concurrent fan-out fails the whole call.
#[tokio::test]
async fn test_run_for_each_async_reports_failure() {
    let executor = ScriptedExecutor::failing_on(&["post"]);
    let swarm = topic_swarm(&executor);

    let err = swarm
        .run_for_each_async(vec![topic("a"), topic("b")])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RunFailed { .. }));
    assert_eq!(executor.calls().len(), 2);
    assert_eq!(swarm.status(), SwarmStatus::Failed);
}

/// Sequential fan-out stops at the first failure.
#[tokio::test]
async fn test_run_for_each_stops_at_first_failure() {
    let executor = ScriptedExecutor::failing_on(&["post"]);
    let swarm = topic_swarm(&executor);

    let result = swarm.run_for_each(vec![topic("a"), topic("b")]).await;

    assert!(result.is_err());
    assert_eq!(executor.calls().len(), 1);
}

#[tokio::test]
async fn test_run_async_returns_join_handle() {
    let executor = ScriptedExecutor::new();
    let swarm = topic_swarm(&executor);

    let handle = swarm.run_async(topic("async"));
    let output = handle.await.unwrap().unwrap();

    assert_eq!(output.raw(), "writer:post");
    assert_eq!(executor.calls()[0].description, "Write about async");
}

/// A successful run emits its lifecycle events in order, all tagged with the run id.
#[tokio::test]
async fn test_successful_run_event_order() {
    let executor = ScriptedExecutor::new();
    let events = EventCollector::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![task("t1", "writer"), task("t2", "writer")],
    )
    .with_events(events.clone());
    let swarm = Swarm::new(config).unwrap();

    let output = swarm.run(Inputs::new()).await.unwrap();

    assert_eq!(
        events.kinds(),
        vec![
            EventKind::RunStarted,
            EventKind::ProcessStarted,
            EventKind::TaskStarted,
            EventKind::TaskCompleted,
            EventKind::TaskStarted,
            EventKind::TaskCompleted,
            EventKind::ProcessCompleted,
            EventKind::RunCompleted,
        ]
    );
    assert!(events
        .events()
        .iter()
        .all(|e| e.run_id == Some(output.run_id())));
}

/// Completed outputs are saved under their task id in the swarm memory.
#[tokio::test]
async fn test_outputs_saved_to_memory() {
    let executor = ScriptedExecutor::new();
    let memory: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![task("t1", "writer"), task("t2", "writer")],
    )
    .with_memory(memory.clone());
    let swarm = Swarm::new(config).unwrap();

    swarm.run(Inputs::new()).await.unwrap();

    assert_eq!(memory.len().await.unwrap(), 2);
    assert_eq!(
        memory.load("t2").await.unwrap(),
        Some("writer:t2".to_string())
    );
}

/// Resetting clears the store and emits a run-independent event.
#[tokio::test]
async fn test_reset_memory_clears_and_emits() {
    let executor = ScriptedExecutor::new();
    let events = EventCollector::new();
    let memory: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());
    let knowledge: Arc<dyn MemoryStore> =
        Arc::new(InMemoryStore::with_entries([("style", "Short sentences")]));
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![task("t1", "writer")],
    )
    .with_memory(memory.clone())
    .with_knowledge(knowledge.clone())
    .with_events(events.clone());
    let swarm = Swarm::new(config).unwrap();
    swarm.run(Inputs::new()).await.unwrap();

    swarm.reset_memory(MemoryKind::Memory).await.unwrap();

    assert_eq!(memory.len().await.unwrap(), 0);
    assert_eq!(knowledge.len().await.unwrap(), 1);
    let reset = events.events().pop().unwrap();
    assert_eq!(reset.kind, EventKind::MemoryReset);
    assert_eq!(reset.run_id, None);

    swarm.reset_memory(MemoryKind::All).await.unwrap();
    assert_eq!(knowledge.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_reset_memory_without_store_fails() {
    let executor = ScriptedExecutor::new();
    let swarm = topic_swarm(&executor);

    let err = swarm.reset_memory(MemoryKind::Knowledge).await.unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

/// Status tracks the most recent run.
#[tokio::test]
async fn test_status_marks_failed_run() {
    let executor = ScriptedExecutor::failing_on(&["post"]);
    let swarm = topic_swarm(&executor);
    assert_eq!(swarm.status(), SwarmStatus::Ready);

    assert!(swarm.run(topic("a")).await.is_err());
    assert_eq!(swarm.status(), SwarmStatus::Failed);
}

/// With one request per minute the second task waits for the next window.
#[tokio::test(start_paused = true)]
async fn test_rate_limit_spaces_executor_calls() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![task("t1", "writer"), task("t2", "writer")],
    )
    .with_max_rpm(1);
    let swarm = Swarm::new(config).unwrap();

    let started = tokio::time::Instant::now();
    swarm.run(Inputs::new()).await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(executor.calls().len(), 2);
}

#[tokio::test]
async fn test_zero_rpm_rejected() {
    let executor = ScriptedExecutor::new();
    let config = SwarmConfig::new(
        vec![agent("writer", "Writer", "Write", executor.clone())],
        vec![task("t1", "writer")],
    )
    .with_max_rpm(0);

    assert!(matches!(Swarm::new(config), Err(Error::Configuration(_))));
}
