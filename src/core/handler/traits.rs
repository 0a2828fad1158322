// src/core/handler/traits.rs

//! The lifecycle handler contract (spec.md §4.3, component C4).
//!
//! A handler is a pure, side-effect-*declaring* unit: it never mutates
//! the store or cache itself, never holds a lock, and never raises —
//! `execute` always returns a `SessionExecutionResult` describing what
//! the coordinator should do next. This resolves spec.md §9's "deep
//! inheritance for handlers" and "exceptions as control flow" flags: a
//! handler is a small trait object, not a class hierarchy, and failure
//! is a value in `failures`, not a thrown exception.

use crate::core::coordinator::locks::LockId;
use crate::core::events::LifecycleEventKind;
use crate::core::ids::{AccessKey, AgentId, KernelId, ScalingGroupName, SessionId};
use crate::core::model::{ClusterMode, KernelStatus, SessionStatus, SessionType};
use crate::core::slots::ResourceSlot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The compact, value-typed view of a kernel a handler operates on.
#[derive(Debug, Clone)]
pub struct HandlerKernelData {
    pub kernel_id: KernelId,
    pub agent_id: Option<AgentId>,
    pub status: KernelStatus,
    pub status_changed_at: DateTime<Utc>,
    pub image_ref: String,
    pub requested_slots: ResourceSlot,
}

/// The compact, value-typed view of a session a handler operates on.
/// Built by the repository at query time (spec.md §9); it carries no
/// live reference back to the store.
#[derive(Debug, Clone)]
pub struct HandlerSessionData {
    pub session_id: SessionId,
    pub creation_id: String,
    pub access_key: AccessKey,
    pub status: SessionStatus,
    pub scaling_group: ScalingGroupName,
    pub session_type: SessionType,
    pub cluster_mode: ClusterMode,
    pub status_changed_at: DateTime<Utc>,
    pub status_info: Option<String>,
    pub retry_count: u32,
    pub kernels: Vec<HandlerKernelData>,
}

impl HandlerSessionData {
    pub fn main_kernel(&self) -> Option<&HandlerKernelData> {
        self.kernels.iter().find(|k| k.agent_id.is_some()).or(self.kernels.first())
    }

    /// True if `statuses` is empty (the handler declares no kernel
    /// precondition, e.g. "Schedule pending") or every kernel is in one
    /// of `statuses`. A session with no kernels at all only satisfies a
    /// non-empty precondition list vacuously if treated as CANCELLED by
    /// the caller (spec.md §4.3 edge case); this method alone does not
    /// special-case that — callers needing it check `kernels.is_empty()`.
    pub fn all_kernels_in(&self, statuses: &[KernelStatus]) -> bool {
        if statuses.is_empty() {
            return true;
        }
        !self.kernels.is_empty() && self.kernels.iter().all(|k| statuses.contains(&k.status))
    }
}

/// Opaque per-session payload produced by a handler for post-processing
/// after the status-update transaction commits (e.g. the event to
/// broadcast). Carried separately from `successes`/`failures` so the
/// coordinator can broadcast events without re-deriving their content.
#[derive(Debug, Clone)]
pub struct ScheduledSessionData {
    pub session_id: SessionId,
    pub creation_id: String,
    pub access_key: AccessKey,
    pub reason: String,
}

/// The result of running a handler over a batch (spec.md §4.3).
#[derive(Debug, Clone, Default)]
pub struct SessionExecutionResult {
    pub successes: Vec<SessionId>,
    pub failures: Vec<SessionId>,
    pub stales: Vec<SessionId>,
    pub scheduled_data: Vec<ScheduledSessionData>,
}

impl SessionExecutionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn needs_post_processing(&self) -> bool {
        !self.scheduled_data.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Combines two results, concatenating each of their four lists.
    pub fn merge(mut self, mut other: Self) -> Self {
        self.successes.append(&mut other.successes);
        self.failures.append(&mut other.failures);
        self.stales.append(&mut other.stales);
        self.scheduled_data.append(&mut other.scheduled_data);
        self
    }
}

/// A lifecycle handler: one per (target status -> next status)
/// transition (spec.md §4.3).
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// A stable identifier, used in logs and metrics labels.
    fn name(&self) -> &'static str;

    /// Sessions in these statuses are candidates for this handler.
    fn target_statuses(&self) -> &'static [SessionStatus];

    /// A session is only a candidate if *all* of its kernels are in one
    /// of these statuses.
    fn target_kernel_statuses(&self) -> &'static [KernelStatus];

    /// The new session status on success.
    fn success_status(&self) -> SessionStatus;

    /// The new session status on failure, or `None` to leave the
    /// session's status unchanged.
    fn failure_status(&self) -> Option<SessionStatus>;

    /// The new session status when the batch is "stale", or `None` to
    /// leave the session's status unchanged.
    fn stale_status(&self) -> Option<SessionStatus>;

    /// The named lock the coordinator must hold while running this
    /// handler (spec.md §4.4).
    fn lock_id(&self) -> LockId;

    /// The event kind this handler's successful transition publishes
    /// (spec.md §6.2), or `None` if this transition is not one of the
    /// ones the event bus documents (e.g. PENDING->SCHEDULED, or the
    /// RUNNING->TERMINATING step of an abnormal shutdown, which is
    /// followed by a real TERMINATED transition that emits instead).
    /// Deliberately not inferred from `success_status()`: several
    /// handlers share a success status family without sharing whether
    /// they're the transition spec.md §8's scenarios actually name.
    fn emitted_event_kind(&self) -> Option<LifecycleEventKind> {
        None
    }

    /// Runs this handler over a batch. Must be idempotent: re-running on
    /// the same batch, absent external changes, yields an equivalent
    /// result (spec.md §4.3, §8). An empty batch always yields an empty
    /// result with `needs_post_processing() == false`.
    async fn execute(
        &self,
        batch: &[HandlerSessionData],
        scaling_group: &ScalingGroupName,
    ) -> SessionExecutionResult;
}
