// src/core/handler/check_abnormal_running.rs

//! "Check abnormal running" (spec.md §4.3): a RUNNING session whose
//! kernels have all gone TERMINATED without the session itself having
//! been marked TERMINATING is moved there with reason
//! `ABNORMAL_TERMINATION` — preserving any existing `status_info`
//! reason if one is already recorded (Open Question 2, see DESIGN.md).

use crate::core::coordinator::locks::LockId;
use crate::core::handler::traits::{
    HandlerSessionData, LifecycleHandler, ScheduledSessionData, SessionExecutionResult,
};
use crate::core::ids::ScalingGroupName;
use crate::core::model::{KernelStatus, SessionStatus};
use async_trait::async_trait;

const TARGET_STATUSES: &[SessionStatus] = &[SessionStatus::Running];
const TARGET_KERNEL_STATUSES: &[KernelStatus] = &[KernelStatus::Terminated];

pub const ABNORMAL_TERMINATION_REASON: &str = "ABNORMAL_TERMINATION";

#[derive(Default)]
pub struct CheckAbnormalRunningHandler;

#[async_trait]
impl LifecycleHandler for CheckAbnormalRunningHandler {
    fn name(&self) -> &'static str {
        "check_abnormal_running"
    }

    fn target_statuses(&self) -> &'static [SessionStatus] {
        TARGET_STATUSES
    }

    fn target_kernel_statuses(&self) -> &'static [KernelStatus] {
        TARGET_KERNEL_STATUSES
    }

    fn success_status(&self) -> SessionStatus {
        SessionStatus::Terminating
    }

    fn failure_status(&self) -> Option<SessionStatus> {
        None
    }

    fn stale_status(&self) -> Option<SessionStatus> {
        None
    }

    fn lock_id(&self) -> LockId {
        LockId::CheckAbnormalRunning
    }

    async fn execute(
        &self,
        batch: &[HandlerSessionData],
        _scaling_group: &ScalingGroupName,
    ) -> SessionExecutionResult {
        let mut result = SessionExecutionResult::empty();
        for session in batch {
            result.successes.push(session.session_id);
            let reason = session
                .status_info
                .clone()
                .unwrap_or_else(|| ABNORMAL_TERMINATION_REASON.to_string());
            result.scheduled_data.push(ScheduledSessionData {
                session_id: session.session_id,
                creation_id: session.creation_id.clone(),
                access_key: session.access_key.clone(),
                reason,
            });
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{AccessKey, SessionId};
    use crate::core::model::{ClusterMode, SessionType};

    fn session(status_info: Option<&str>) -> HandlerSessionData {
        HandlerSessionData {
            session_id: SessionId::new(),
            creation_id: "c".into(),
            access_key: AccessKey("ak".into()),
            status: SessionStatus::Running,
            scaling_group: ScalingGroupName::from("default"),
            session_type: SessionType::Interactive,
            cluster_mode: ClusterMode::SingleNode,
            status_changed_at: chrono::Utc::now(),
            status_info: status_info.map(|s| s.to_string()),
            retry_count: 0,
            kernels: Vec::new(),
        }
    }

    #[tokio::test]
    async fn defaults_to_abnormal_termination_reason() {
        let handler = CheckAbnormalRunningHandler;
        let result = handler
            .execute(&[session(None)], &ScalingGroupName::from("default"))
            .await;
        assert_eq!(
            result.scheduled_data[0].reason,
            ABNORMAL_TERMINATION_REASON
        );
    }

    #[tokio::test]
    async fn preserves_existing_reason() {
        let handler = CheckAbnormalRunningHandler;
        let result = handler
            .execute(
                &[session(Some("oom-killed"))],
                &ScalingGroupName::from("default"),
            )
            .await;
        assert_eq!(result.scheduled_data[0].reason, "oom-killed");
    }
}
