// src/core/model/kernel.rs

//! The `Kernel` entity: one container belonging to a session.

use crate::core::ids::{AgentId, KernelId, SessionId};
use crate::core::slots::resource_slot::ResourceSlot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Mirrors `SessionStatus` at container granularity (spec.md §3.2). Kept
/// as a distinct type rather than reusing `SessionStatus` because a
/// kernel's status space is driven by the agent's container runtime, not
/// by the scheduler directly, and the two are allowed to diverge in
/// future revisions of either.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KernelStatus {
    Pending,
    Scheduled,
    Preparing,
    Pulling,
    Prepared,
    Creating,
    Running,
    Terminating,
    Terminated,
    Cancelled,
    Error,
}

impl KernelStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            KernelStatus::Terminated | KernelStatus::Cancelled | KernelStatus::Error
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KernelRole {
    Main,
    Sub,
}

/// A single container instance belonging to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kernel {
    pub id: KernelId,
    pub session_id: SessionId,
    pub agent_id: Option<AgentId>,
    pub image_ref: String,
    pub architecture: String,
    pub status: KernelStatus,
    pub status_changed_at: DateTime<Utc>,
    pub requested_slots: ResourceSlot,
    pub occupied_slots: ResourceSlot,
    pub role: KernelRole,
}

impl Kernel {
    pub fn is_main(&self) -> bool {
        self.role == KernelRole::Main
    }
}
