// tests/integration/test_helpers.rs
//
// Fixture builders shared by the integration tests: a clean
// `InMemoryStore` populated with a pending session (single- or
// multi-node) and one or more schedulable agents.

use clustord::core::ids::{AccessKey, AgentId, KernelId, ScalingGroupName, SessionId};
use clustord::core::model::{
    Agent, AgentStatus, ClusterMode, Kernel, KernelRole, KernelStatus, Session, SessionStatus,
    SessionType,
};
use clustord::core::repository::InMemoryStore;
use clustord::core::slots::ResourceSlot;
use rust_decimal::Decimal;

pub const SCALING_GROUP: &str = "default";

pub fn scaling_group() -> ScalingGroupName {
    ScalingGroupName::from(SCALING_GROUP)
}

pub fn agent_with_capacity(cpu: u32) -> Agent {
    let mut available = ResourceSlot::new();
    available.set("cpu", Decimal::from(cpu));
    Agent {
        id: AgentId::new(),
        status: AgentStatus::Alive,
        scaling_group: scaling_group(),
        region: "local".to_string(),
        architecture: "x86_64".to_string(),
        public_host: "agent.local".to_string(),
        addr: "127.0.0.1:6001".to_string(),
        available_slots: available,
        occupied_slots: ResourceSlot::new(),
        compute_plugins: Vec::new(),
        version: "1.0".to_string(),
        first_contact: chrono::Utc::now(),
        lost_at: None,
        schedulable: true,
    }
}

/// Inserts a PENDING session with `kernel_cpu_requests.len()` kernels,
/// one CPU request per entry, and returns its id.
pub fn insert_pending_session(
    store: &InMemoryStore,
    cluster_mode: ClusterMode,
    kernel_cpu_requests: &[u32],
) -> SessionId {
    let session_id = SessionId::new();
    store.insert_session(Session {
        id: session_id,
        creation_id: "creation".to_string(),
        name: "fixture-session".to_string(),
        access_key: AccessKey("AKIA-fixture".to_string()),
        owner: uuid::Uuid::new_v4(),
        project: "default".to_string(),
        domain: "default".to_string(),
        scaling_group: scaling_group(),
        session_type: SessionType::Interactive,
        cluster_mode,
        cluster_size: kernel_cpu_requests.len().max(1) as u32,
        status: SessionStatus::Pending,
        status_changed_at: chrono::Utc::now(),
        status_info: None,
        requested_slots: ResourceSlot::new(),
        occupying_slots: ResourceSlot::new(),
        callback_url: None,
        batch_timeout: None,
        starts_at: None,
        retry_count: 0,
    });
    for cpu in kernel_cpu_requests {
        let mut requested = ResourceSlot::new();
        requested.set("cpu", Decimal::from(*cpu));
        store.insert_kernel(Kernel {
            id: KernelId::new(),
            session_id,
            agent_id: None,
            image_ref: "python:3.11".to_string(),
            architecture: "x86_64".to_string(),
            status: KernelStatus::Pending,
            status_changed_at: chrono::Utc::now(),
            requested_slots: requested,
            occupied_slots: ResourceSlot::new(),
            role: KernelRole::Main,
        });
    }
    session_id
}
