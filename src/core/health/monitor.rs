// src/core/health/monitor.rs

//! The health monitor (spec.md §4.5, component C6): runs independently
//! of the scheduling coordinator, dispatching each tick's sessions to
//! the keeper registered for their status.

use super::keeper::HealthKeeper;
use super::result::HealthCheckResult;
use super::types::SessionHealthData;
use crate::core::model::SessionStatus;
use crate::core::repository::scheduler_repo::SchedulerRepository;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

pub struct HealthMonitor<R: SchedulerRepository> {
    repo: Arc<R>,
    keepers: HashMap<SessionStatus, Arc<dyn HealthKeeper>>,
    tick_interval: Duration,
}

impl<R: SchedulerRepository> HealthMonitor<R> {
    pub fn new(repo: Arc<R>, tick_interval: Duration) -> Self {
        Self { repo, keepers: HashMap::new(), tick_interval }
    }

    /// Registers `keeper` under every status in its `target_statuses()`,
    /// matching the same keeper instance against each one (spec.md §4.5:
    /// `{PREPARING: pulling_keeper, PULLING: pulling_keeper, CREATING:
    /// creating_keeper}`).
    pub fn register(&mut self, keeper: Arc<dyn HealthKeeper>) {
        for status in keeper.target_statuses() {
            self.keepers.insert(*status, keeper.clone());
        }
    }

    /// Runs one check cycle: per registered status, fetch its sessions
    /// and run that status's keeper (spec.md §4.5: "per-status dispatch
    /// is a straight map lookup; sessions whose status is not in the
    /// map are ignored").
    #[instrument(skip(self), fields(statuses = self.keepers.len()))]
    pub async fn run_tick(&self) -> HealthCheckResult {
        let now = chrono::Utc::now();
        let mut total = HealthCheckResult::empty();
        for (status, keeper) in &self.keepers {
            let sessions = match self.repo.get_sessions_by_status(*status).await {
                Ok(s) => s,
                Err(_) => continue,
            };
            if sessions.is_empty() {
                continue;
            }
            let health_data: Vec<SessionHealthData> =
                sessions.iter().map(SessionHealthData::from).collect();
            let result = keeper.handle_batch(health_data, now).await;
            info!(
                status = %status,
                healthy = result.healthy.len(),
                unhealthy = result.unhealthy.len(),
                "health check tick"
            );
            total = total.merge(result);
        }
        total
    }

    /// The top-level loop (spec.md §4.5): ticks on `tick_interval`
    /// until `shutdown` fires.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_tick().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
