// src/core/handler/check_creating.rs

//! "Check creating progress" (spec.md §4.3): marks sessions whose
//! kernels are now serving as RUNNING, firing `on_transition_to_running`
//! per session first. A session whose hook fails stays in CREATING
//! this round (retried on the next trigger, once whatever the hook
//! needed becomes available).

use crate::core::coordinator::locks::LockId;
use crate::core::handler::traits::{
    HandlerSessionData, LifecycleHandler, ScheduledSessionData, SessionExecutionResult,
};
use crate::core::hooks::HookRegistry;
use crate::core::ids::ScalingGroupName;
use crate::core::model::{KernelStatus, SessionStatus};
use async_trait::async_trait;
use std::sync::Arc;

const TARGET_STATUSES: &[SessionStatus] = &[SessionStatus::Creating];
const TARGET_KERNEL_STATUSES: &[KernelStatus] = &[KernelStatus::Running];

pub struct CheckCreatingProgressHandler {
    hooks: Arc<HookRegistry>,
}

impl CheckCreatingProgressHandler {
    pub fn new(hooks: Arc<HookRegistry>) -> Self {
        Self { hooks }
    }
}

#[async_trait]
impl LifecycleHandler for CheckCreatingProgressHandler {
    fn name(&self) -> &'static str {
        "check_creating_progress"
    }

    fn target_statuses(&self) -> &'static [SessionStatus] {
        TARGET_STATUSES
    }

    fn target_kernel_statuses(&self) -> &'static [KernelStatus] {
        TARGET_KERNEL_STATUSES
    }

    fn success_status(&self) -> SessionStatus {
        SessionStatus::Running
    }

    fn failure_status(&self) -> Option<SessionStatus> {
        None
    }

    fn stale_status(&self) -> Option<SessionStatus> {
        None
    }

    fn lock_id(&self) -> LockId {
        LockId::CheckCreatingProgress
    }

    fn emitted_event_kind(&self) -> Option<crate::core::events::LifecycleEventKind> {
        Some(crate::core::events::LifecycleEventKind::SessionStarted)
    }

    async fn execute(
        &self,
        batch: &[HandlerSessionData],
        _scaling_group: &ScalingGroupName,
    ) -> SessionExecutionResult {
        let mut result = SessionExecutionResult::empty();
        for session in batch {
            match self.hooks.run_on_transition_to_running(session.session_id).await {
                Ok(()) => {
                    result.successes.push(session.session_id);
                    result.scheduled_data.push(ScheduledSessionData {
                        session_id: session.session_id,
                        creation_id: session.creation_id.clone(),
                        access_key: session.access_key.clone(),
                        reason: "running".to_string(),
                    });
                }
                Err(_) => {
                    // Stays CREATING; neither success nor failure status
                    // applies, so this session is simply omitted.
                }
            }
        }
        result
    }
}
