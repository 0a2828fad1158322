// src/core/repository/memory.rs

//! An in-memory implementation of both repository contracts, used by
//! the test harness (spec.md §9, `[FULL]` ambient test tooling) and by
//! the binary's demo/standalone mode. Built the same way the teacher's
//! test suite fakes its storage backend: a `DashMap`-guarded table per
//! entity, with no transactions beyond "hold the relevant entries'
//! locks for the duration of the mutation".

use crate::core::cache::{InMemoryScheduleCache, ScheduleCache};
use crate::core::errors::{CoreError, CoreResult};
use crate::core::handler::traits::{HandlerKernelData, HandlerSessionData};
use crate::core::ids::{AgentId, FieldUpdate, KernelId, ScalingGroupName, SessionId};
use crate::core::model::{Agent, Kernel, Session, SessionStatus};
use crate::core::slots::ResourceSlot;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use super::scheduler_repo::{KernelAssignment, SchedulerRepository, SchedulingDecision};
use super::session_repo::{SessionRepository, SessionWithKernels};

/// Shared, clonable in-memory backing store. Clone is cheap (an `Arc`
/// around each table); every clone sees the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    sessions: Arc<DashMap<SessionId, Session>>,
    kernels: Arc<DashMap<KernelId, Kernel>>,
    agents: Arc<DashMap<AgentId, Agent>>,
    cache: Arc<InMemoryScheduleCache>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_session(&self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    pub fn insert_kernel(&self, kernel: Kernel) {
        self.kernels.insert(kernel.id, kernel);
    }

    pub fn insert_agent(&self, agent: Agent) {
        self.agents.insert(agent.id, agent);
    }

    pub fn get_agent(&self, agent_id: AgentId) -> Option<Agent> {
        self.agents.get(&agent_id).map(|r| r.clone())
    }

    pub fn update_agent(&self, agent_id: AgentId, f: impl FnOnce(&mut Agent)) {
        if let Some(mut a) = self.agents.get_mut(&agent_id) {
            f(&mut a);
        }
    }

    pub fn kernels_of(&self, session_id: SessionId) -> Vec<Kernel> {
        self.kernels
            .iter()
            .filter(|r| r.session_id == session_id)
            .map(|r| r.clone())
            .collect()
    }

    /// Test-harness-only: sets every kernel belonging to `session_id` to
    /// `status`, standing in for the agent heartbeat pipeline that would
    /// otherwise drive this transition (spec.md §9's ambient test
    /// harness, which fakes every collaborator including the pipeline
    /// that updates kernel status rows).
    pub fn set_kernel_statuses_for_session(
        &self,
        session_id: SessionId,
        status: crate::core::model::KernelStatus,
    ) {
        let now = chrono::Utc::now();
        for mut entry in self.kernels.iter_mut() {
            if entry.session_id == session_id {
                entry.status = status;
                entry.status_changed_at = now;
            }
        }
    }

    fn to_handler_data(&self, session: &Session) -> HandlerSessionData {
        let kernels = self
            .kernels_of(session.id)
            .into_iter()
            .map(|k| HandlerKernelData {
                kernel_id: k.id,
                agent_id: k.agent_id,
                status: k.status,
                status_changed_at: k.status_changed_at,
                image_ref: k.image_ref,
                requested_slots: k.requested_slots,
            })
            .collect();
        HandlerSessionData {
            session_id: session.id,
            creation_id: session.creation_id.clone(),
            access_key: session.access_key.clone(),
            status: session.status,
            scaling_group: session.scaling_group.clone(),
            session_type: session.session_type,
            cluster_mode: session.cluster_mode,
            status_changed_at: session.status_changed_at,
            status_info: session.status_info.clone(),
            retry_count: session.retry_count,
            kernels,
        }
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn get_by_id(&self, session_id: SessionId) -> CoreResult<SessionWithKernels> {
        let session = self
            .sessions
            .get(&session_id)
            .map(|r| r.clone())
            .ok_or_else(|| CoreError::NotFound(format!("session {session_id}")))?;
        let kernels = self.kernels_of(session_id);
        Ok(SessionWithKernels { session, kernels })
    }

    async fn update_sessions_to(
        &self,
        status: SessionStatus,
        ids: &[SessionId],
        reason: Option<&str>,
    ) -> CoreResult<()> {
        let now = chrono::Utc::now();
        for id in ids {
            if let Some(mut s) = self.sessions.get_mut(id) {
                s.transition_to(status, now, reason.map(|r| r.to_string()));
            }
        }
        Ok(())
    }

    async fn invalidate_kernel_related_cache(&self, session_ids: &[SessionId]) -> CoreResult<()> {
        let mut agent_ids = std::collections::HashSet::new();
        for session_id in session_ids {
            for kernel in self.kernels_of(*session_id) {
                if let Some(agent_id) = kernel.agent_id {
                    agent_ids.insert(agent_id);
                }
            }
        }
        for agent_id in agent_ids {
            self.cache.set_gpu_allocation_map(agent_id, serde_json::Value::Null).await;
        }
        Ok(())
    }

    async fn force_update_lifecycle(
        &self,
        session_id: SessionId,
        status: SessionStatus,
    ) -> CoreResult<()> {
        let mut s = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| CoreError::NotFound(format!("session {session_id}")))?;
        let now = chrono::Utc::now();
        s.transition_to(status, now, None);
        Ok(())
    }

    async fn clear_errors(&self, session_id: SessionId) -> CoreResult<()> {
        let mut s = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| CoreError::NotFound(format!("session {session_id}")))?;
        s.status_info = None;
        s.retry_count = 0;
        Ok(())
    }

    async fn increment_retry_count(&self, session_id: SessionId) -> CoreResult<u32> {
        let mut s = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| CoreError::NotFound(format!("session {session_id}")))?;
        s.retry_count += 1;
        Ok(s.retry_count)
    }

    async fn defer_until(
        &self,
        session_id: SessionId,
        until: chrono::DateTime<chrono::Utc>,
    ) -> CoreResult<()> {
        let mut s = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| CoreError::NotFound(format!("session {session_id}")))?;
        s.starts_at = Some(until);
        Ok(())
    }
}

#[async_trait]
impl SchedulerRepository for InMemoryStore {
    async fn get_sessions_for_transition(
        &self,
        target_statuses: &[SessionStatus],
        target_kernel_statuses: &[crate::core::model::KernelStatus],
        scaling_group: &ScalingGroupName,
    ) -> CoreResult<Vec<HandlerSessionData>> {
        let mut out = Vec::new();
        for entry in self.sessions.iter() {
            let session = entry.value();
            if session.scaling_group != *scaling_group {
                continue;
            }
            if !target_statuses.contains(&session.status) {
                continue;
            }
            let data = self.to_handler_data(session);
            if data.all_kernels_in(target_kernel_statuses) {
                out.push(data);
            }
        }
        Ok(out)
    }

    async fn get_pending_sessions(
        &self,
        scaling_group: &ScalingGroupName,
    ) -> CoreResult<Vec<HandlerSessionData>> {
        let now = chrono::Utc::now();
        let mut out: Vec<HandlerSessionData> = self
            .sessions
            .iter()
            .filter(|r| {
                r.scaling_group == *scaling_group
                    && r.status == SessionStatus::Pending
                    && r.starts_at.is_none_or(|t| t <= now)
            })
            .map(|r| self.to_handler_data(&r))
            .collect();
        out.sort_by(|a, b| {
            a.status_changed_at
                .cmp(&b.status_changed_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(out)
    }

    async fn get_sessions_by_status(
        &self,
        status: SessionStatus,
    ) -> CoreResult<Vec<HandlerSessionData>> {
        Ok(self
            .sessions
            .iter()
            .filter(|r| r.status == status)
            .map(|r| self.to_handler_data(&r))
            .collect())
    }

    async fn get_schedulable_agents(
        &self,
        scaling_group: &ScalingGroupName,
    ) -> CoreResult<Vec<Agent>> {
        Ok(self
            .agents
            .iter()
            .filter(|r| r.scaling_group == *scaling_group && r.can_schedule())
            .map(|r| r.clone())
            .collect())
    }

    async fn release_terminated_kernels(&self, session_ids: &[SessionId]) -> CoreResult<()> {
        for session_id in session_ids {
            for kernel in self.kernels_of(*session_id) {
                if let Some(agent_id) = kernel.agent_id {
                    self.update_agent(agent_id, |a| {
                        a.occupied_slots = a.occupied_slots.sub_saturating(&kernel.requested_slots);
                    });
                }
                if let Some(mut k) = self.kernels.get_mut(&kernel.id) {
                    k.requested_slots = ResourceSlot::new();
                }
            }
        }
        Ok(())
    }

    async fn reassign_kernel_agent(
        &self,
        kernel_id: KernelId,
        agent: FieldUpdate<AgentId>,
    ) -> CoreResult<()> {
        if agent.is_nop() {
            return Ok(());
        }
        let mut kernel = self
            .kernels
            .get_mut(&kernel_id)
            .ok_or_else(|| CoreError::NotFound(format!("kernel {kernel_id}")))?;
        match agent {
            FieldUpdate::Set(agent_id) => kernel.agent_id = Some(agent_id),
            FieldUpdate::Clear => kernel.agent_id = None,
            FieldUpdate::Nop => unreachable!("handled above"),
        }
        Ok(())
    }

    async fn apply_scheduling_decision(&self, decision: &SchedulingDecision) -> CoreResult<()> {
        // All-or-nothing: validate every assignment fits before mutating
        // anything (spec.md §4.2).
        for KernelAssignment { agent_id, allocated_slots, .. } in &decision.assignments {
            let agent = self
                .agents
                .get(agent_id)
                .ok_or_else(|| CoreError::NotFound(format!("agent {agent_id}")))?;
            if !allocated_slots.le(&agent.remaining_slots()) {
                return Err(CoreError::ResourceExhausted {
                    session_id: decision
                        .scheduled_sessions
                        .first()
                        .copied()
                        .unwrap_or_else(SessionId::nil),
                    reason: format!("agent {agent_id} lacks capacity"),
                });
            }
        }

        let now = chrono::Utc::now();
        for KernelAssignment { kernel_id, agent_id, allocated_slots } in &decision.assignments {
            if let Some(mut k) = self.kernels.get_mut(kernel_id) {
                k.agent_id = Some(*agent_id);
                k.requested_slots = allocated_slots.clone();
            }
            if let Some(mut a) = self.agents.get_mut(agent_id) {
                a.occupied_slots = a.occupied_slots.add(allocated_slots);
            }
        }
        for session_id in &decision.scheduled_sessions {
            if let Some(mut s) = self.sessions.get_mut(session_id) {
                s.transition_to(SessionStatus::Scheduled, now, None);
            }
        }
        Ok(())
    }
}
