// src/core/health/types.rs

//! Value types the health monitor operates on (spec.md §4.5). Distinct
//! from `handler::traits::HandlerSessionData` because the health
//! monitor's view is agent-centric rather than kernel-status-centric,
//! and deliberately allows `status_changed_at` to be absent so
//! `PullingHealthKeeper::need_check`'s null-timestamp edge case (spec.md
//! §8) is representable.

use crate::core::handler::traits::HandlerSessionData;
use crate::core::ids::{AccessKey, AgentId, KernelId, SessionId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct KernelHealthData {
    pub kernel_id: KernelId,
    pub agent_id: Option<AgentId>,
    pub image_ref: String,
}

#[derive(Debug, Clone)]
pub struct SessionHealthData {
    pub session_id: SessionId,
    pub access_key: AccessKey,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub kernels: Vec<KernelHealthData>,
}

impl SessionHealthData {
    /// The session's main kernel, used by the pulling keeper to pick a
    /// representative agent per image (spec.md §4.5).
    pub fn main_kernel(&self) -> Option<&KernelHealthData> {
        self.kernels.iter().find(|k| k.agent_id.is_some()).or(self.kernels.first())
    }
}

impl From<&HandlerSessionData> for SessionHealthData {
    fn from(data: &HandlerSessionData) -> Self {
        Self {
            session_id: data.session_id,
            access_key: data.access_key.clone(),
            status_changed_at: Some(data.status_changed_at),
            retry_count: data.retry_count,
            kernels: data
                .kernels
                .iter()
                .map(|k| KernelHealthData {
                    kernel_id: k.kernel_id,
                    agent_id: k.agent_id,
                    image_ref: k.image_ref.clone(),
                })
                .collect(),
        }
    }
}
