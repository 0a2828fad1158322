// src/core/coordinator/scheduler.rs

//! The scheduling coordinator (spec.md §4.4, component C5): the main
//! loop that runs every lifecycle handler, in order, under its named
//! lock, for one scaling group.

use super::locks::LockService;
use super::trigger::SchedulingTriggerRx;
use crate::core::events::{EventBus, LifecycleEvent};
use crate::core::handler::traits::LifecycleHandler;
use crate::core::ids::ScalingGroupName;
use crate::core::repository::scheduler_repo::SchedulerRepository;
use crate::core::repository::session_repo::SessionRepository;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Per-handler timing knobs, distinct from the per-round tick interval
/// (spec.md §6.4).
pub struct CoordinatorTiming {
    pub tick_interval: Duration,
    pub debounce: Duration,
    pub lock_acquire_timeout: Duration,
}

pub struct SchedulingCoordinator<R, E>
where
    R: SchedulerRepository + SessionRepository,
    E: EventBus,
{
    scaling_group: ScalingGroupName,
    handlers: Vec<Box<dyn LifecycleHandler>>,
    lock_service: Arc<dyn LockService>,
    repo: Arc<R>,
    event_bus: Arc<E>,
    trigger: super::trigger::SchedulingTrigger,
    timing: CoordinatorTiming,
}

impl<R, E> SchedulingCoordinator<R, E>
where
    R: SchedulerRepository + SessionRepository,
    E: EventBus,
{
    pub fn new(
        scaling_group: ScalingGroupName,
        handlers: Vec<Box<dyn LifecycleHandler>>,
        lock_service: Arc<dyn LockService>,
        repo: Arc<R>,
        event_bus: Arc<E>,
        trigger: super::trigger::SchedulingTrigger,
        timing: CoordinatorTiming,
    ) -> Self {
        Self { scaling_group, handlers, lock_service, repo, event_bus, trigger, timing }
    }

    /// Runs one round: each handler in declared order, each under its
    /// own lock (spec.md §4.4 main loop, steps 3a-g).
    #[instrument(skip(self), fields(scaling_group = %self.scaling_group))]
    pub async fn run_round(&self) {
        for handler in &self.handlers {
            self.run_handler(handler.as_ref()).await;
        }
    }

    async fn run_handler(&self, handler: &dyn LifecycleHandler) {
        let Some(_guard) = self
            .lock_service
            .try_acquire(handler.lock_id(), self.timing.lock_acquire_timeout)
            .await
        else {
            debug!(handler = handler.name(), "lock held elsewhere, skipping this round");
            return;
        };

        let batch = match self
            .repo
            .get_sessions_for_transition(
                handler.target_statuses(),
                handler.target_kernel_statuses(),
                &self.scaling_group,
            )
            .await
        {
            Ok(b) => b,
            Err(err) => {
                warn!(handler = handler.name(), error = %err, "failed to fetch batch");
                return;
            }
        };

        if batch.is_empty() {
            debug!(handler = handler.name(), "empty batch");
            return;
        }

        let result = handler.execute(&batch, &self.scaling_group).await;

        // Group successes by their per-session reason so each session
        // records its own status_info (spec.md §4.4 step e: "reason
        // strings come from each scheduled payload").
        let reasons: HashMap<_, _> = result
            .scheduled_data
            .iter()
            .map(|sd| (sd.session_id, sd.reason.clone()))
            .collect();
        let mut by_reason: HashMap<Option<String>, Vec<_>> = HashMap::new();
        for session_id in &result.successes {
            by_reason.entry(reasons.get(session_id).cloned()).or_default().push(*session_id);
        }
        for (reason, ids) in by_reason {
            if let Err(err) = self
                .repo
                .update_sessions_to(handler.success_status(), &ids, reason.as_deref())
                .await
            {
                warn!(handler = handler.name(), error = %err, "failed to apply success status");
            }
        }

        if let Some(failure_status) = handler.failure_status() {
            if !result.failures.is_empty() {
                if let Err(err) = self
                    .repo
                    .update_sessions_to(failure_status, &result.failures, None)
                    .await
                {
                    warn!(handler = handler.name(), error = %err, "failed to apply failure status");
                }
            }
        }

        if let Some(stale_status) = handler.stale_status() {
            if !result.stales.is_empty() {
                if let Err(err) =
                    self.repo.update_sessions_to(stale_status, &result.stales, None).await
                {
                    warn!(handler = handler.name(), error = %err, "failed to apply stale status");
                }
            }
        }

        info!(
            handler = handler.name(),
            successes = result.successes.len(),
            failures = result.failures.len(),
            stales = result.stales.len(),
            "round complete"
        );

        if result.needs_post_processing() {
            if let Some(kind) = handler.emitted_event_kind() {
                let status_before: HashMap<_, _> =
                    batch.iter().map(|s| (s.session_id, s.status)).collect();
                for sd in &result.scheduled_data {
                    self.event_bus
                        .publish(LifecycleEvent {
                            kind,
                            session_id: Some(sd.session_id),
                            agent_id: None,
                            reason: sd.reason.clone(),
                            timestamp: chrono::Utc::now(),
                            status_before: status_before.get(&sd.session_id).copied(),
                            status_after: Some(handler.success_status()),
                        })
                        .await;
                }
            }
            // Freeing/placing resources may have made more sessions
            // schedulable (spec.md §4.4's trigger list).
            self.trigger.mark_needed();
        }
    }

    /// The top-level loop: wakes on a periodic tick or a debounced
    /// trigger signal, whichever comes first, and runs one round.
    pub async fn run(&self, mut trigger_rx: SchedulingTriggerRx, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.timing.tick_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = trigger_rx.wait_for_signal(self.timing.debounce) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            self.run_round().await;
        }
    }
}
