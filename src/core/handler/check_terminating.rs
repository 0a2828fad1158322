// src/core/handler/check_terminating.rs

//! "Check terminating progress" (spec.md §4.3): marks sessions whose
//! kernels have all shut down as TERMINATED, releasing their resource
//! allocations and invalidating kernel-related cache entries, then
//! firing `on_transition_to_terminated`.

use crate::core::coordinator::locks::LockId;
use crate::core::handler::traits::{
    HandlerSessionData, LifecycleHandler, ScheduledSessionData, SessionExecutionResult,
};
use crate::core::hooks::HookRegistry;
use crate::core::ids::ScalingGroupName;
use crate::core::model::{KernelStatus, SessionStatus};
use crate::core::repository::scheduler_repo::SchedulerRepository;
use crate::core::repository::session_repo::SessionRepository;
use async_trait::async_trait;
use std::sync::Arc;

const TARGET_STATUSES: &[SessionStatus] = &[SessionStatus::Terminating];
const TARGET_KERNEL_STATUSES: &[KernelStatus] = &[KernelStatus::Terminated];

pub struct CheckTerminatingProgressHandler<R: SchedulerRepository + SessionRepository> {
    repo: Arc<R>,
    hooks: Arc<HookRegistry>,
}

impl<R: SchedulerRepository + SessionRepository> CheckTerminatingProgressHandler<R> {
    pub fn new(repo: Arc<R>, hooks: Arc<HookRegistry>) -> Self {
        Self { repo, hooks }
    }
}

#[async_trait]
impl<R: SchedulerRepository + SessionRepository> LifecycleHandler
    for CheckTerminatingProgressHandler<R>
{
    fn name(&self) -> &'static str {
        "check_terminating_progress"
    }

    fn target_statuses(&self) -> &'static [SessionStatus] {
        TARGET_STATUSES
    }

    fn target_kernel_statuses(&self) -> &'static [KernelStatus] {
        TARGET_KERNEL_STATUSES
    }

    fn success_status(&self) -> SessionStatus {
        SessionStatus::Terminated
    }

    fn failure_status(&self) -> Option<SessionStatus> {
        None
    }

    fn stale_status(&self) -> Option<SessionStatus> {
        None
    }

    fn lock_id(&self) -> LockId {
        LockId::CheckTerminatingProgress
    }

    fn emitted_event_kind(&self) -> Option<crate::core::events::LifecycleEventKind> {
        Some(crate::core::events::LifecycleEventKind::SessionTerminated)
    }

    async fn execute(
        &self,
        batch: &[HandlerSessionData],
        _scaling_group: &ScalingGroupName,
    ) -> SessionExecutionResult {
        if batch.is_empty() {
            return SessionExecutionResult::empty();
        }

        let ids: Vec<_> = batch.iter().map(|s| s.session_id).collect();
        if self.repo.release_terminated_kernels(&ids).await.is_err() {
            return SessionExecutionResult::empty();
        }
        let _ = self.repo.invalidate_kernel_related_cache(&ids).await;

        let mut result = SessionExecutionResult::empty();
        for session in batch {
            // A failed cleanup hook is logged by the coordinator but
            // does not block the TERMINATED transition: slots have
            // already been released and must not be double-released
            // next round.
            let _ = self
                .hooks
                .run_on_transition_to_terminated(session.session_id)
                .await;
            result.successes.push(session.session_id);
            result.scheduled_data.push(ScheduledSessionData {
                session_id: session.session_id,
                creation_id: session.creation_id.clone(),
                access_key: session.access_key.clone(),
                reason: "terminated".to_string(),
            });
        }
        result
    }
}
