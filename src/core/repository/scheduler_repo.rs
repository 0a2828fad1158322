// src/core/repository/scheduler_repo.rs

//! The scheduler repository contract (spec.md §4.2, component C3).

use crate::core::errors::CoreResult;
use crate::core::handler::traits::HandlerSessionData;
use crate::core::ids::{AgentId, FieldUpdate, KernelId, ScalingGroupName, SessionId};
use crate::core::model::{Agent, KernelStatus, SessionStatus};
use crate::core::slots::ResourceSlot;
use async_trait::async_trait;

/// One kernel's agent assignment within a `SchedulingDecision`.
#[derive(Debug, Clone)]
pub struct KernelAssignment {
    pub kernel_id: KernelId,
    pub agent_id: AgentId,
    pub allocated_slots: ResourceSlot,
}

/// The result of running a scaling group's scheduling policy over its
/// pending sessions: which sessions move to SCHEDULED, and where each
/// of their kernels lands. Applied atomically (spec.md §4.2): session
/// status, kernel agent assignments, agent `used` decrements, and
/// `resource_allocations` rows all commit together or not at all.
#[derive(Debug, Clone, Default)]
pub struct SchedulingDecision {
    pub scheduled_sessions: Vec<SessionId>,
    pub assignments: Vec<KernelAssignment>,
}

impl SchedulingDecision {
    pub fn is_empty(&self) -> bool {
        self.scheduled_sessions.is_empty()
    }
}

#[async_trait]
pub trait SchedulerRepository: Send + Sync {
    /// The primary admission gate for handlers (spec.md §4.3): sessions
    /// currently in `target_statuses` where every kernel is in
    /// `target_kernel_statuses`, scoped to `scaling_group`.
    async fn get_sessions_for_transition(
        &self,
        target_statuses: &[SessionStatus],
        target_kernel_statuses: &[KernelStatus],
        scaling_group: &ScalingGroupName,
    ) -> CoreResult<Vec<HandlerSessionData>>;

    /// PENDING sessions in `scaling_group`, ordered per the group's
    /// scheduling policy (FIFO by `status_changed_at` with `session_id`
    /// as a total-order tie-break, spec.md §4.3).
    async fn get_pending_sessions(
        &self,
        scaling_group: &ScalingGroupName,
    ) -> CoreResult<Vec<HandlerSessionData>>;

    /// Sessions currently in `status`, regardless of scaling group.
    /// Used by the health monitor (spec.md §4.5) to gather its batches;
    /// absent from spec.md's C3 surface list but required to implement
    /// `HealthMonitor::run_tick` without scanning every scaling group's
    /// handler batches.
    async fn get_sessions_by_status(
        &self,
        status: SessionStatus,
    ) -> CoreResult<Vec<HandlerSessionData>>;

    /// Atomically applies a scheduling decision: see
    /// [`SchedulingDecision`] for exactly what commits together.
    async fn apply_scheduling_decision(&self, decision: &SchedulingDecision) -> CoreResult<()>;

    /// Agents in `scaling_group` that are currently schedulable, with
    /// their present capacity. Not named in spec.md's C3 surface list
    /// explicitly, but required to implement the scheduling policy's
    /// placement step (spec.md §4.3's "reserves slots, assigns
    /// agents"); added the same way `get_sessions_by_status` was added
    /// for the health monitor (see DESIGN.md).
    async fn get_schedulable_agents(
        &self,
        scaling_group: &ScalingGroupName,
    ) -> CoreResult<Vec<Agent>>;

    /// Releases every resource allocation belonging to the given
    /// sessions' kernels, crediting the freed amount back to each
    /// kernel's agent (spec.md §8 invariant 4: deleted allocation rows,
    /// decremented agent `used`). Added alongside
    /// `get_schedulable_agents` to give the terminating handler a
    /// transactional counterpart to `apply_scheduling_decision`.
    async fn release_terminated_kernels(&self, session_ids: &[SessionId]) -> CoreResult<()>;

    /// Administrative override: sets, clears, or leaves untouched a
    /// kernel's `agent_id`, independent of the scheduling and
    /// termination paths. Never called by the coordinator itself.
    async fn reassign_kernel_agent(
        &self,
        kernel_id: KernelId,
        agent: FieldUpdate<AgentId>,
    ) -> CoreResult<()>;
}
