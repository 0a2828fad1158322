// src/core/health/keeper.rs

//! The per-status health keeper contract (spec.md §4.5).

use super::result::HealthCheckResult;
use super::types::SessionHealthData;
use crate::core::ids::SessionId;
use crate::core::model::SessionStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait HealthKeeper: Send + Sync {
    /// The session statuses this keeper attends to (spec.md §4.5:
    /// `PullingHealthKeeper` applies to both PREPARING and PULLING).
    fn target_statuses(&self) -> &'static [SessionStatus];

    /// Whether `session` has been in its current status long enough to
    /// warrant a check. Always `true` if `status_changed_at` is absent
    /// (spec.md §8 boundary behaviour).
    fn need_check(&self, session: &SessionHealthData, now: DateTime<Utc>) -> bool;

    /// Classifies a pre-filtered batch as healthy/unhealthy.
    async fn check_batch(&self, sessions: &[SessionHealthData]) -> HealthCheckResult;

    /// Re-marks unhealthy sessions for retry.
    async fn retry_unhealthy(&self, ids: &[SessionId]);

    /// The template method (spec.md §4.5): filter by `need_check`,
    /// delegate to `check_batch`, and call `retry_unhealthy` if
    /// anything came back unhealthy.
    async fn handle_batch(
        &self,
        sessions: Vec<SessionHealthData>,
        now: DateTime<Utc>,
    ) -> HealthCheckResult {
        let due: Vec<SessionHealthData> =
            sessions.into_iter().filter(|s| self.need_check(s, now)).collect();
        let result = self.check_batch(&due).await;
        if !result.unhealthy.is_empty() {
            self.retry_unhealthy(&result.unhealthy).await;
        }
        result
    }
}
