// src/core/agent_rpc.rs

//! The agent RPC contract the core consumes (spec.md §6.1). All calls
//! are asynchronous request/response; the core never relies on
//! server-pushed notifications from an agent (spec.md §6.1).

use crate::core::errors::CoreResult;
use crate::core::ids::{AgentId, KernelId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,
    pub registry: String,
    pub architecture: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeImageResult {
    pub image: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreationSpec {
    pub session_id: crate::core::ids::SessionId,
    pub image_ref: String,
    pub requested_slots: crate::core::slots::ResourceSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedKernel {
    pub kernel_id: KernelId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResult {
    pub session_id: crate::core::ids::SessionId,
    pub kernels: Vec<CreatedKernel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSessionResult {
    pub bgtask_id: String,
}

/// The core's view of an agent's control-plane RPC surface.
/// Implementations own connection pooling, retries, and the wire
/// protocol; the core only calls these methods and applies the bounded
/// timeouts in spec.md §5 (`check_*`: `rpc.check_timeout_sec`;
/// control: `rpc.control_timeout_sec`).
#[async_trait]
pub trait AgentRpcClient: Send + Sync {
    /// True if a pull for `image` is in progress on `agent_id`.
    async fn check_pulling(&self, agent_id: AgentId, image: &str) -> CoreResult<bool>;

    /// True if container creation for `kernel_id` is in progress on
    /// `agent_id`.
    async fn check_creating(&self, agent_id: AgentId, kernel_id: KernelId) -> CoreResult<bool>;

    async fn purge_images(
        &self,
        agent_id: AgentId,
        images: &[ImageRef],
        force: bool,
        noprune: bool,
    ) -> CoreResult<Vec<PurgeImageResult>>;

    async fn create_session(
        &self,
        agent_id: AgentId,
        spec: &SessionCreationSpec,
    ) -> CoreResult<CreateSessionResult>;

    async fn commit_session(
        &self,
        agent_id: AgentId,
        session_id: crate::core::ids::SessionId,
    ) -> CoreResult<CommitSessionResult>;
}
