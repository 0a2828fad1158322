// src/core/repository/session_repo.rs

//! The session repository contract (spec.md §4.2, component C2).
//!
//! Presents coarse, intention-revealing operations rather than raw row
//! access; every write is transactional and every read is
//! snapshot-consistent against the backing store (spec.md §4.2).

use crate::core::errors::CoreResult;
use crate::core::ids::SessionId;
use crate::core::model::{Kernel, Session};
use async_trait::async_trait;

/// A session joined with its kernels, the unit `get_by_id` returns.
#[derive(Debug, Clone)]
pub struct SessionWithKernels {
    pub session: Session,
    pub kernels: Vec<Kernel>,
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Reads one session and its kernels. Read-only.
    async fn get_by_id(&self, session_id: SessionId) -> CoreResult<SessionWithKernels>;

    /// Transactionally sets every session in `ids` to `status`, recording
    /// `reason` as `status_info`, and invalidates any cache entries the
    /// store layer knows depend on these sessions. Uses each session's
    /// current status as an implicit guard: a session that has since
    /// moved on is left untouched rather than erroring the whole batch
    /// (spec.md §5, idempotency).
    async fn update_sessions_to(
        &self,
        status: crate::core::model::SessionStatus,
        ids: &[SessionId],
        reason: Option<&str>,
    ) -> CoreResult<()>;

    /// Invalidates cache entries keyed off kernel data for these
    /// sessions. Kept distinct from `update_sessions_to` because cache
    /// layout does not always mirror row layout (spec.md §4.2).
    async fn invalidate_kernel_related_cache(&self, session_ids: &[SessionId]) -> CoreResult<()>;

    /// Administrative override: forces a session directly to `status`,
    /// bypassing the handler pipeline's success/failure partition. Used
    /// by operator tooling, and by the scheduling handler itself for the
    /// one case that can't be expressed by its fixed success/failure
    /// statuses: a session with no kernels at all is force-moved
    /// straight to CANCELLED.
    async fn force_update_lifecycle(
        &self,
        session_id: SessionId,
        status: crate::core::model::SessionStatus,
    ) -> CoreResult<()>;

    /// Clears `status_info` and resets `retry_count` to zero. The other
    /// administrative override path.
    async fn clear_errors(&self, session_id: SessionId) -> CoreResult<()>;

    /// Increments and returns `retry_count`, the counter bounding
    /// `health-retry` attempts (spec.md §4.5). Added for the health
    /// monitor's `retry_unhealthy` path, which needs to both bump and
    /// read this counter atomically.
    async fn increment_retry_count(&self, session_id: SessionId) -> CoreResult<u32>;

    /// Sets `starts_at` so the session is not re-admitted to
    /// `get_pending_sessions` until `until`, implementing the health
    /// monitor's retry backoff (spec.md §4.5, Open Question 1 in
    /// DESIGN.md).
    async fn defer_until(
        &self,
        session_id: SessionId,
        until: chrono::DateTime<chrono::Utc>,
    ) -> CoreResult<()>;
}
