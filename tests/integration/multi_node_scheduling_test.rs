// tests/integration/multi_node_scheduling_test.rs
//
// Exercises multi-node placement end-to-end through the coordinator:
// a multi-node session must land every kernel on a distinct agent, or
// stay PENDING entirely (no partial placement).

use clustord::core::coordinator::{self, CoordinatorTiming, InMemoryLockService, SchedulingCoordinator};
use clustord::core::events::InMemoryEventBus;
use clustord::core::handler::{FifoPolicy, LifecycleHandler, SchedulePendingHandler};
use clustord::core::model::{ClusterMode, SessionStatus};
use clustord::core::repository::{InMemoryStore, SessionRepository};
use std::sync::Arc;
use std::time::Duration;

use crate::test_helpers::{agent_with_capacity, insert_pending_session, scaling_group};

fn timing() -> CoordinatorTiming {
    CoordinatorTiming {
        tick_interval: Duration::from_secs(3600),
        debounce: Duration::from_millis(1),
        lock_acquire_timeout: Duration::from_millis(200),
    }
}

fn coordinator_with(
    store: Arc<InMemoryStore>,
) -> SchedulingCoordinator<InMemoryStore, InMemoryEventBus> {
    let handlers: Vec<Box<dyn LifecycleHandler>> =
        vec![Box::new(SchedulePendingHandler::new(store.clone(), Box::new(FifoPolicy)))];
    SchedulingCoordinator::new(
        scaling_group(),
        handlers,
        Arc::new(InMemoryLockService::new()),
        store,
        Arc::new(InMemoryEventBus::new(16)),
        coordinator::channel().0,
        timing(),
    )
}

#[tokio::test]
async fn multi_node_session_stays_pending_with_only_one_agent() {
    let store = Arc::new(InMemoryStore::new());
    store.insert_agent(agent_with_capacity(8));
    let session_id = insert_pending_session(&store, ClusterMode::MultiNode, &[2, 2, 2]);

    let coordinator = coordinator_with(store.clone());
    coordinator.run_round().await;

    let fetched = store.get_by_id(session_id).await.unwrap();
    assert_eq!(fetched.session.status, SessionStatus::Pending);
}

#[tokio::test]
async fn multi_node_session_schedules_across_distinct_agents() {
    let store = Arc::new(InMemoryStore::new());
    store.insert_agent(agent_with_capacity(8));
    store.insert_agent(agent_with_capacity(8));
    store.insert_agent(agent_with_capacity(8));
    let session_id = insert_pending_session(&store, ClusterMode::MultiNode, &[2, 2, 2]);

    let coordinator = coordinator_with(store.clone());
    coordinator.run_round().await;

    let fetched = store.get_by_id(session_id).await.unwrap();
    assert_eq!(fetched.session.status, SessionStatus::Scheduled);
    let agent_ids: std::collections::HashSet<_> =
        fetched.kernels.iter().filter_map(|k| k.agent_id).collect();
    assert_eq!(agent_ids.len(), 3, "every kernel must land on a distinct agent");
}

#[tokio::test]
async fn a_resource_exhausted_session_leaves_agent_capacity_untouched() {
    let store = Arc::new(InMemoryStore::new());
    store.insert_agent(agent_with_capacity(2));
    let oversized = insert_pending_session(&store, ClusterMode::SingleNode, &[4]);

    let coordinator = coordinator_with(store.clone());
    coordinator.run_round().await;

    let fetched = store.get_by_id(oversized).await.unwrap();
    assert_eq!(fetched.session.status, SessionStatus::Pending);
}
