// src/core/health/pulling_keeper.rs

//! `PullingHealthKeeper` (spec.md §4.5): attends to sessions in
//! `{PREPARING, PULLING}`. A session is healthy if its main kernel's
//! agent reports a pull in progress for any of its kernels' images.

use super::keeper::HealthKeeper;
use super::result::HealthCheckResult;
use super::types::SessionHealthData;
use crate::core::agent_rpc::AgentRpcClient;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::ids::SessionId;
use crate::core::model::SessionStatus;
use crate::core::repository::session_repo::SessionRepository;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

pub struct PullingHealthKeeper<Rpc: AgentRpcClient, Repo: SessionRepository> {
    rpc: Arc<Rpc>,
    repo: Arc<Repo>,
    threshold: Duration,
    retry_backoff: Vec<Duration>,
    max_retries: u32,
    check_timeout: Duration,
}

impl<Rpc: AgentRpcClient, Repo: SessionRepository> PullingHealthKeeper<Rpc, Repo> {
    pub fn new(
        rpc: Arc<Rpc>,
        repo: Arc<Repo>,
        threshold: Duration,
        retry_backoff: Vec<Duration>,
        max_retries: u32,
        check_timeout: Duration,
    ) -> Self {
        Self { rpc, repo, threshold, retry_backoff, max_retries, check_timeout }
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let idx = (attempt.saturating_sub(1)) as usize;
        self.retry_backoff
            .get(idx)
            .copied()
            .unwrap_or_else(|| *self.retry_backoff.last().unwrap_or(&Duration::from_secs(60)))
    }

    async fn check_pulling_bounded(&self, agent_id: crate::core::ids::AgentId, image: &str) -> CoreResult<bool> {
        match tokio::time::timeout(self.check_timeout, self.rpc.check_pulling(agent_id, image)).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Transient(format!(
                "check_pulling timed out after {:?} for agent {agent_id}",
                self.check_timeout
            ))),
        }
    }
}

#[async_trait]
impl<Rpc: AgentRpcClient, Repo: SessionRepository> HealthKeeper for PullingHealthKeeper<Rpc, Repo> {
    fn target_statuses(&self) -> &'static [SessionStatus] {
        &[SessionStatus::Preparing, SessionStatus::Pulling]
    }

    fn need_check(&self, session: &SessionHealthData, now: DateTime<Utc>) -> bool {
        match session.status_changed_at {
            None => true,
            Some(changed_at) => {
                now - changed_at >= ChronoDuration::from_std(self.threshold).unwrap_or_default()
            }
        }
    }

    async fn check_batch(&self, sessions: &[SessionHealthData]) -> HealthCheckResult {
        let checks = sessions.iter().map(|session| async move {
            let Some(main) = session.main_kernel() else {
                return (session.session_id, false);
            };
            let Some(agent_id) = main.agent_id else {
                return (session.session_id, false);
            };
            // Group this session's kernels by image name and check each
            // distinct image once against its main kernel's agent.
            let images: HashSet<&str> =
                session.kernels.iter().map(|k| k.image_ref.as_str()).collect();
            let image_checks = images
                .iter()
                .map(|image| async move { self.check_pulling_bounded(agent_id, image).await.unwrap_or(false) });
            let any_active = join_all(image_checks).await.into_iter().any(|active| active);
            (session.session_id, any_active)
        });

        let outcomes = join_all(checks).await;
        let mut result = HealthCheckResult::empty();
        for (session_id, healthy) in outcomes {
            if healthy {
                result.healthy.push(session_id);
            } else {
                result.unhealthy.push(session_id);
            }
        }
        result
    }

    async fn retry_unhealthy(&self, ids: &[SessionId]) {
        for id in ids {
            let attempt = self.repo.increment_retry_count(*id).await.unwrap_or(1);
            if attempt > self.max_retries {
                let _ = self
                    .repo
                    .update_sessions_to(SessionStatus::Error, &[*id], Some("health-retry-exhausted"))
                    .await;
                continue;
            }
            let backoff = self.backoff_for(attempt);
            let _ = self
                .repo
                .update_sessions_to(SessionStatus::Pending, &[*id], Some("health-retry"))
                .await;
            let _ = self
                .repo
                .defer_until(
                    *id,
                    Utc::now() + ChronoDuration::from_std(backoff).unwrap_or_default(),
                )
                .await;
        }
    }
}
