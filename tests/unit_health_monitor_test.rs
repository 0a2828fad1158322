// tests/unit_health_monitor_test.rs
//
// Black-box coverage of `HealthMonitor`/`PullingHealthKeeper` (spec.md
// §4.5): per-status dispatch, the `need_check` threshold gate, and the
// retry/backoff path feeding back into the session repository.

use async_trait::async_trait;
use clustord::core::agent_rpc::{
    AgentRpcClient, CommitSessionResult, CreateSessionResult, ImageRef, PurgeImageResult,
    SessionCreationSpec,
};
use clustord::core::errors::CoreResult;
use clustord::core::health::pulling_keeper::PullingHealthKeeper;
use clustord::core::health::HealthMonitor;
use clustord::core::ids::{AccessKey, AgentId, KernelId, SessionId};
use clustord::core::model::{
    Agent, AgentStatus, ClusterMode, Kernel, KernelRole, KernelStatus, Session, SessionStatus,
    SessionType,
};
use clustord::core::ids::ScalingGroupName;
use clustord::core::repository::session_repo::SessionRepository;
use clustord::core::repository::InMemoryStore;
use clustord::core::slots::ResourceSlot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct FakeRpc {
    pulling: AtomicBool,
}

#[async_trait]
impl AgentRpcClient for FakeRpc {
    async fn check_pulling(&self, _agent_id: AgentId, _image: &str) -> CoreResult<bool> {
        Ok(self.pulling.load(Ordering::SeqCst))
    }

    async fn check_creating(&self, _agent_id: AgentId, _kernel_id: KernelId) -> CoreResult<bool> {
        Ok(false)
    }

    async fn purge_images(
        &self,
        _agent_id: AgentId,
        _images: &[ImageRef],
        _force: bool,
        _noprune: bool,
    ) -> CoreResult<Vec<PurgeImageResult>> {
        Ok(Vec::new())
    }

    async fn create_session(
        &self,
        _agent_id: AgentId,
        spec: &SessionCreationSpec,
    ) -> CoreResult<CreateSessionResult> {
        Ok(CreateSessionResult { session_id: spec.session_id, kernels: Vec::new() })
    }

    async fn commit_session(
        &self,
        _agent_id: AgentId,
        session_id: SessionId,
    ) -> CoreResult<CommitSessionResult> {
        let _ = session_id;
        Ok(CommitSessionResult { bgtask_id: "bg-1".to_string() })
    }
}

fn pulling_session(store: &InMemoryStore, agent_id: AgentId) -> SessionId {
    let session_id = SessionId::new();
    store.insert_session(Session {
        id: session_id,
        creation_id: "c".into(),
        name: "s".into(),
        access_key: AccessKey("ak".into()),
        owner: uuid::Uuid::new_v4(),
        project: "default".into(),
        domain: "default".into(),
        scaling_group: ScalingGroupName::from("default"),
        session_type: SessionType::Interactive,
        cluster_mode: ClusterMode::SingleNode,
        cluster_size: 1,
        status: SessionStatus::Pulling,
        status_changed_at: chrono::Utc::now() - chrono::Duration::seconds(120),
        status_info: None,
        requested_slots: ResourceSlot::new(),
        occupying_slots: ResourceSlot::new(),
        callback_url: None,
        batch_timeout: None,
        starts_at: None,
        retry_count: 0,
    });
    store.insert_kernel(Kernel {
        id: KernelId::new(),
        session_id,
        agent_id: Some(agent_id),
        image_ref: "python:3.11".into(),
        architecture: "x86_64".into(),
        status: KernelStatus::Pulling,
        status_changed_at: chrono::Utc::now(),
        requested_slots: ResourceSlot::new(),
        occupied_slots: ResourceSlot::new(),
        role: KernelRole::Main,
    });
    session_id
}

fn agent() -> Agent {
    Agent {
        id: AgentId::new(),
        status: AgentStatus::Alive,
        scaling_group: ScalingGroupName::from("default"),
        region: "local".into(),
        architecture: "x86_64".into(),
        public_host: "agent.local".into(),
        addr: "127.0.0.1:6001".into(),
        available_slots: ResourceSlot::new(),
        occupied_slots: ResourceSlot::new(),
        compute_plugins: Vec::new(),
        version: "1.0".into(),
        first_contact: chrono::Utc::now(),
        lost_at: None,
        schedulable: true,
    }
}

#[tokio::test]
async fn a_still_pulling_session_is_left_alone() {
    let store = Arc::new(InMemoryStore::new());
    let a = agent();
    store.insert_agent(a.clone());
    let session_id = pulling_session(&store, a.id);

    let rpc = Arc::new(FakeRpc { pulling: AtomicBool::new(true) });
    let keeper = PullingHealthKeeper::new(
        rpc,
        store.clone(),
        Duration::from_secs(1),
        vec![Duration::from_secs(5)],
        3,
        Duration::from_secs(5),
    );
    let mut monitor = HealthMonitor::new(store.clone(), Duration::from_secs(60));
    monitor.register(Arc::new(keeper));

    monitor.run_tick().await;

    let fetched = store.get_by_id(session_id).await.unwrap();
    assert_eq!(fetched.session.status, SessionStatus::Pulling, "still pulling, no retry needed");
    assert_eq!(fetched.session.retry_count, 0);
}

#[tokio::test]
async fn a_stalled_pull_is_demoted_to_pending_and_deferred() {
    let store = Arc::new(InMemoryStore::new());
    let a = agent();
    store.insert_agent(a.clone());
    let session_id = pulling_session(&store, a.id);

    let rpc = Arc::new(FakeRpc { pulling: AtomicBool::new(false) });
    let keeper = PullingHealthKeeper::new(
        rpc,
        store.clone(),
        Duration::from_secs(1),
        vec![Duration::from_secs(5)],
        3,
        Duration::from_secs(5),
    );
    let mut monitor = HealthMonitor::new(store.clone(), Duration::from_secs(60));
    monitor.register(Arc::new(keeper));

    monitor.run_tick().await;

    let fetched = store.get_by_id(session_id).await.unwrap();
    assert_eq!(fetched.session.status, SessionStatus::Pending);
    assert_eq!(fetched.session.retry_count, 1);
    assert!(fetched.session.starts_at.is_some(), "backoff should defer re-admission");
}

#[tokio::test]
async fn exhausting_retries_moves_the_session_to_error() {
    let store = Arc::new(InMemoryStore::new());
    let a = agent();
    store.insert_agent(a.clone());
    let session_id = pulling_session(&store, a.id);

    let rpc = Arc::new(FakeRpc { pulling: AtomicBool::new(false) });
    let keeper = PullingHealthKeeper::new(
        rpc,
        store.clone(),
        Duration::from_secs(0),
        vec![Duration::from_secs(1)],
        1,
        Duration::from_secs(5),
    );
    let mut monitor = HealthMonitor::new(store.clone(), Duration::from_secs(60));
    monitor.register(Arc::new(keeper));

    // First tick: retry_count goes from 0 to 1, within max_retries (1),
    // so it is demoted to PENDING rather than ERROR.
    monitor.run_tick().await;
    assert_eq!(
        store.get_by_id(session_id).await.unwrap().session.status,
        SessionStatus::Pending
    );

    // Re-admit immediately by clearing the backoff deferral, then tick
    // again: retry_count goes from 1 to 2, past max_retries.
    store.set_kernel_statuses_for_session(session_id, KernelStatus::Pulling);
    store.force_update_lifecycle(session_id, SessionStatus::Pulling).await.unwrap();
    monitor.run_tick().await;

    assert_eq!(
        store.get_by_id(session_id).await.unwrap().session.status,
        SessionStatus::Error
    );
}
