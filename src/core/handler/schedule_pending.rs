// src/core/handler/schedule_pending.rs

//! The "Schedule pending" handler (spec.md §4.3, §4.1): runs a scaling
//! group's placement policy over its PENDING sessions, reserving
//! slots and assigning agents.
//!
//! Unlike the other four handlers, this one does not merely relabel
//! status: it owns the scheduler repository directly so it can fetch
//! `get_pending_sessions`/`get_schedulable_agents` and commit a
//! [`SchedulingDecision`] atomically (spec.md §4.2), rather than
//! working only off the generic `batch` the coordinator would gather
//! via `get_sessions_for_transition`. The coordinator still drives it
//! through the same `LifecycleHandler` contract (empty `batch` is
//! simply ignored); `target_statuses`/`target_kernel_statuses` exist so
//! the coordinator's generic empty-batch short-circuit (spec.md §4.4
//! step c) still applies when there is nothing pending.

use crate::core::coordinator::locks::LockId;
use crate::core::errors::CoreError;
use crate::core::handler::traits::{
    HandlerSessionData, LifecycleHandler, ScheduledSessionData, SessionExecutionResult,
};
use crate::core::ids::ScalingGroupName;
use crate::core::model::{Agent, ClusterMode, KernelStatus, SessionStatus};
use crate::core::repository::scheduler_repo::{
    KernelAssignment, SchedulerRepository, SchedulingDecision,
};
use crate::core::repository::session_repo::SessionRepository;
use crate::core::slots::ResourceSlot;
use async_trait::async_trait;
use std::sync::Arc;

const TARGET_STATUSES: &[SessionStatus] = &[SessionStatus::Pending];
const TARGET_KERNEL_STATUSES: &[KernelStatus] = &[];

/// A scaling group's session-ordering and agent-placement strategy
/// (spec.md §4.3's FIFO tie-break rule, generalised to the `fifo` /
/// `lifo` / `drf` policy kinds from §3's `ScalingGroup.policy`).
pub trait SchedulingPolicy: Send + Sync {
    /// Re-orders already FIFO-ordered (by `status_changed_at`, then
    /// `session_id`) pending sessions per this policy's preference.
    fn order(&self, sessions: Vec<HandlerSessionData>) -> Vec<HandlerSessionData>;

    /// Picks the first agent in `candidates` with enough remaining
    /// capacity for `request`, or `None` if none fits.
    fn pick_agent<'a>(&self, request: &ResourceSlot, candidates: &'a [Agent]) -> Option<&'a Agent> {
        candidates.iter().find(|a| request.le(&a.remaining_slots()))
    }
}

/// First-in-first-out: the repository already returns pending sessions
/// in this order, so this is the identity.
pub struct FifoPolicy;
impl SchedulingPolicy for FifoPolicy {
    fn order(&self, sessions: Vec<HandlerSessionData>) -> Vec<HandlerSessionData> {
        sessions
    }
}

/// Last-in-first-out: newest submissions scheduled first.
pub struct LifoPolicy;
impl SchedulingPolicy for LifoPolicy {
    fn order(&self, mut sessions: Vec<HandlerSessionData>) -> Vec<HandlerSessionData> {
        sessions.reverse();
        sessions
    }
}

/// Dominant Resource Fairness, approximated without an external
/// capacity call (the `SchedulingPolicy::order` contract has no agent
/// access): a session's "dominant share" is the largest fraction its
/// total kernel request represents of the largest request for that
/// same slot seen anywhere in this batch. Sessions with a smaller
/// dominant share are scheduled first, so one outsized request does
/// not starve many small ones.
pub struct DrfPolicy;
impl DrfPolicy {
    fn total_request(session: &HandlerSessionData) -> ResourceSlot {
        session
            .kernels
            .iter()
            .fold(ResourceSlot::new(), |acc, k| acc.add(&k.requested_slots))
    }
}
impl SchedulingPolicy for DrfPolicy {
    fn order(&self, sessions: Vec<HandlerSessionData>) -> Vec<HandlerSessionData> {
        let totals: Vec<ResourceSlot> = sessions.iter().map(Self::total_request).collect();
        let mut batch_max = ResourceSlot::new();
        for t in &totals {
            for key in t.keys() {
                let v = t.get(key);
                if v > batch_max.get(key) {
                    batch_max.set(key, v);
                }
            }
        }
        let mut with_share: Vec<(rust_decimal::Decimal, HandlerSessionData)> = sessions
            .into_iter()
            .zip(totals)
            .map(|(session, total)| {
                let share = total
                    .keys()
                    .map(|k| {
                        let cap = batch_max.get(k);
                        if cap.is_zero() {
                            rust_decimal::Decimal::ZERO
                        } else {
                            total.get(k) / cap
                        }
                    })
                    .fold(rust_decimal::Decimal::ZERO, rust_decimal::Decimal::max);
                (share, session)
            })
            .collect();
        with_share.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.status_changed_at.cmp(&b.1.status_changed_at))
                .then_with(|| a.1.session_id.cmp(&b.1.session_id))
        });
        with_share.into_iter().map(|(_, s)| s).collect()
    }
}

/// The handler itself. Owns the scheduler repository so it can perform
/// the full fetch-decide-commit cycle (spec.md §4.2's
/// `apply_scheduling_decision`) rather than only relabeling statuses.
pub struct SchedulePendingHandler<R: SchedulerRepository + SessionRepository> {
    repo: Arc<R>,
    policy: Box<dyn SchedulingPolicy>,
}

impl<R: SchedulerRepository + SessionRepository> SchedulePendingHandler<R> {
    pub fn new(repo: Arc<R>, policy: Box<dyn SchedulingPolicy>) -> Self {
        Self { repo, policy }
    }

    fn place_single_node(
        &self,
        session: &HandlerSessionData,
        agents: &mut Vec<Agent>,
    ) -> Option<Vec<KernelAssignment>> {
        let mut total = ResourceSlot::new();
        for k in &session.kernels {
            total = total.add(&k.requested_slots);
        }
        let agent_idx = agents.iter().position(|a| total.le(&a.remaining_slots()))?;
        let agent = &mut agents[agent_idx];
        let assignments = session
            .kernels
            .iter()
            .map(|k| KernelAssignment {
                kernel_id: k.kernel_id,
                agent_id: agent.id,
                allocated_slots: k.requested_slots.clone(),
            })
            .collect();
        agent.occupied_slots = agent.occupied_slots.add(&total);
        Some(assignments)
    }

    /// Multi-node placement: every kernel must land on a distinct
    /// agent, or the whole session stays PENDING (spec.md §8 scenario
    /// 6, "no partial placement").
    fn place_multi_node(
        &self,
        session: &HandlerSessionData,
        agents: &mut Vec<Agent>,
    ) -> Option<Vec<KernelAssignment>> {
        let mut used_idx = Vec::new();
        let mut assignments = Vec::new();
        for k in &session.kernels {
            let idx = agents
                .iter()
                .enumerate()
                .find(|(i, a)| !used_idx.contains(i) && k.requested_slots.le(&a.remaining_slots()))
                .map(|(i, _)| i)?;
            used_idx.push(idx);
            assignments.push(KernelAssignment {
                kernel_id: k.kernel_id,
                agent_id: agents[idx].id,
                allocated_slots: k.requested_slots.clone(),
            });
        }
        for (idx, assignment) in used_idx.iter().zip(assignments.iter()) {
            agents[*idx].occupied_slots =
                agents[*idx].occupied_slots.add(&assignment.allocated_slots);
        }
        Some(assignments)
    }
}

#[async_trait]
impl<R: SchedulerRepository + SessionRepository> LifecycleHandler for SchedulePendingHandler<R> {
    fn name(&self) -> &'static str {
        "schedule_pending"
    }

    fn target_statuses(&self) -> &'static [SessionStatus] {
        TARGET_STATUSES
    }

    fn target_kernel_statuses(&self) -> &'static [KernelStatus] {
        TARGET_KERNEL_STATUSES
    }

    fn success_status(&self) -> SessionStatus {
        SessionStatus::Scheduled
    }

    fn failure_status(&self) -> Option<SessionStatus> {
        Some(SessionStatus::Pending)
    }

    fn stale_status(&self) -> Option<SessionStatus> {
        None
    }

    fn lock_id(&self) -> LockId {
        LockId::SchedulePending
    }

    async fn execute(
        &self,
        _batch: &[HandlerSessionData],
        scaling_group: &ScalingGroupName,
    ) -> SessionExecutionResult {
        let pending = match self.repo.get_pending_sessions(scaling_group).await {
            Ok(p) => p,
            Err(_) => return SessionExecutionResult::empty(),
        };
        if pending.is_empty() {
            return SessionExecutionResult::empty();
        }
        let mut agents = match self.repo.get_schedulable_agents(scaling_group).await {
            Ok(a) => a,
            Err(_) => return SessionExecutionResult::empty(),
        };

        let ordered = self.policy.order(pending);
        let mut result = SessionExecutionResult::empty();
        let mut decision = SchedulingDecision::default();

        for session in ordered {
            if session.kernels.is_empty() {
                // Cancelled directly rather than scheduled (spec.md
                // §4.3 edge case); this status is neither this
                // handler's success nor failure status, so it is
                // applied here rather than via the coordinator's
                // generic successes/failures partition.
                let _ = self
                    .repo
                    .force_update_lifecycle(session.session_id, SessionStatus::Cancelled)
                    .await;
                continue;
            }

            let placed = match session.cluster_mode {
                ClusterMode::SingleNode => self.place_single_node(&session, &mut agents),
                ClusterMode::MultiNode => self.place_multi_node(&session, &mut agents),
            };

            match placed {
                Some(assignments) => {
                    decision.scheduled_sessions.push(session.session_id);
                    decision.assignments.extend(assignments);
                    result.successes.push(session.session_id);
                    result.scheduled_data.push(ScheduledSessionData {
                        session_id: session.session_id,
                        creation_id: session.creation_id,
                        access_key: session.access_key,
                        reason: "scheduled".to_string(),
                    });
                }
                None => {
                    result.failures.push(session.session_id);
                }
            }
        }

        if !decision.is_empty() {
            if let Err(CoreError::ResourceExhausted { .. }) =
                self.repo.apply_scheduling_decision(&decision).await
            {
                // A race since `get_schedulable_agents` was read; leave
                // everything PENDING this round, it will retry.
                return SessionExecutionResult {
                    successes: Vec::new(),
                    failures: result
                        .successes
                        .into_iter()
                        .chain(result.failures)
                        .collect(),
                    stales: Vec::new(),
                    scheduled_data: Vec::new(),
                };
            }
        }

        result
    }
}
