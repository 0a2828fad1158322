// src/core/handler/check_pulling.rs

//! "Check pulling progress" (spec.md §4.3): marks sessions whose images
//! have finished pulling as PREPARED. Purely a read of already-fetched
//! kernel statuses — unlike the health monitor's pulling keeper, this
//! handler does not itself RPC agents; it only reacts to kernel status
//! rows the agent heartbeat pipeline has already updated.

use crate::core::coordinator::locks::LockId;
use crate::core::handler::traits::{HandlerSessionData, LifecycleHandler, SessionExecutionResult};
use crate::core::ids::ScalingGroupName;
use crate::core::model::{KernelStatus, SessionStatus};
use async_trait::async_trait;

const TARGET_STATUSES: &[SessionStatus] = &[SessionStatus::Preparing, SessionStatus::Pulling];
const TARGET_KERNEL_STATUSES: &[KernelStatus] =
    &[KernelStatus::Prepared, KernelStatus::Running];

#[derive(Default)]
pub struct CheckPullingProgressHandler;

#[async_trait]
impl LifecycleHandler for CheckPullingProgressHandler {
    fn name(&self) -> &'static str {
        "check_pulling_progress"
    }

    fn target_statuses(&self) -> &'static [SessionStatus] {
        TARGET_STATUSES
    }

    fn target_kernel_statuses(&self) -> &'static [KernelStatus] {
        TARGET_KERNEL_STATUSES
    }

    fn success_status(&self) -> SessionStatus {
        SessionStatus::Prepared
    }

    fn failure_status(&self) -> Option<SessionStatus> {
        None
    }

    fn stale_status(&self) -> Option<SessionStatus> {
        None
    }

    fn lock_id(&self) -> LockId {
        LockId::CheckPullingProgress
    }

    async fn execute(
        &self,
        batch: &[HandlerSessionData],
        _scaling_group: &ScalingGroupName,
    ) -> SessionExecutionResult {
        // The batch was already gated on target_kernel_statuses by the
        // repository, so every session here is ready.
        let mut result = SessionExecutionResult::empty();
        for session in batch {
            result.successes.push(session.session_id);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_batch_yields_empty_result() {
        let handler = CheckPullingProgressHandler;
        let result = handler
            .execute(&[], &ScalingGroupName::from("default"))
            .await;
        assert!(result.successes.is_empty());
        assert!(!result.needs_post_processing());
    }
}
