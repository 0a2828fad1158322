// src/core/model/session.rs

//! The `Session` entity and its status state space (spec.md §3.1, §3.2).

use crate::core::ids::{AccessKey, ScalingGroupName, SessionId};
use crate::core::slots::resource_slot::ResourceSlot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A session's position in its lifecycle. Terminal statuses (`Terminated`,
/// `Cancelled`, `Error`) are sinks: no handler targets them as a source
/// status (spec.md §3.2 invariant 1).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
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

impl SessionStatus {
    /// Whether this status is a sink: no further lifecycle transition
    /// ever moves a session out of it.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Terminated | SessionStatus::Cancelled | SessionStatus::Error
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionType {
    Interactive,
    Batch,
    Inference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterMode {
    SingleNode,
    MultiNode,
}

/// The user-visible unit of work: a collection of one or more kernels
/// sharing an identity and lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub creation_id: String,
    pub name: String,
    pub access_key: AccessKey,
    pub owner: uuid::Uuid,
    pub project: String,
    pub domain: String,
    pub scaling_group: ScalingGroupName,
    pub session_type: SessionType,
    pub cluster_mode: ClusterMode,
    pub cluster_size: u32,
    pub status: SessionStatus,
    pub status_changed_at: DateTime<Utc>,
    /// The last reason recorded against this session's status, surfaced
    /// to callers as `status_info` (spec.md §7).
    pub status_info: Option<String>,
    pub requested_slots: ResourceSlot,
    pub occupying_slots: ResourceSlot,
    pub callback_url: Option<String>,
    pub batch_timeout: Option<chrono::Duration>,
    pub starts_at: Option<DateTime<Utc>>,
    /// Bounds `health-retry` attempts (spec.md §4.5, Open Question 1).
    pub retry_count: u32,
}

impl Session {
    /// Sets the session's status and records the status-change timestamp
    /// and reason, preserving `status_info` monotonicity (spec.md §8.5):
    /// callers must only call this with a `changed_at` that is not
    /// earlier than the current one.
    pub fn transition_to(&mut self, status: SessionStatus, changed_at: DateTime<Utc>, reason: Option<String>) {
        self.status = status;
        self.status_changed_at = changed_at;
        if let Some(reason) = reason {
            self.status_info = Some(reason);
        }
    }
}
