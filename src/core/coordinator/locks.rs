// src/core/coordinator/locks.rs

//! Named-lock service (spec.md §4.4): handlers never lock anything
//! themselves; the coordinator acquires `handler.lock_id()` before
//! running a handler stage so that, across a replicated control plane,
//! only one coordinator instance runs a given stage at a time.
//!
//! spec.md §1 deliberately does not prescribe the election/locking
//! primitive; `LockService` is the contract a deployment's real
//! implementation (etcd, a DB advisory lock, …) must satisfy. The
//! in-memory implementation here is for single-process deployments and
//! tests, built the same way the teacher guards concurrent
//! reconfiguration attempts per replica in `warden/worker.rs`
//! (`DashMap<K, Arc<Mutex<()>>>` + `try_lock`).

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// The named lock a handler stage runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockId {
    SchedulePending,
    CheckPullingProgress,
    CheckCreatingProgress,
    CheckTerminatingProgress,
    CheckAbnormalRunning,
}

impl LockId {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockId::SchedulePending => "lock:schedule-pending",
            LockId::CheckPullingProgress => "lock:check-pulling-progress",
            LockId::CheckCreatingProgress => "lock:check-creating-progress",
            LockId::CheckTerminatingProgress => "lock:check-terminating-progress",
            LockId::CheckAbnormalRunning => "lock:check-abnormal-running",
        }
    }
}

/// An acquired lock handle. Dropping it releases the lock (spec.md
/// §4.4 step g: "release the lock" after the round completes).
pub struct LockGuard {
    _inner: tokio::sync::OwnedMutexGuard<()>,
}

/// The named-lock contract. A lock acquisition failure (timeout or
/// contention) is not an error condition (spec.md §4.4): it means
/// another coordinator instance is handling this stage, and this round
/// should simply skip it.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Attempts to acquire `lock_id`, waiting up to `timeout` before
    /// giving up. Returns `None` on contention/timeout, never an error.
    async fn try_acquire(&self, lock_id: LockId, timeout: Duration) -> Option<LockGuard>;
}

/// A single-process lock service backed by one `tokio::sync::Mutex` per
/// `LockId`, created lazily. Suitable for a single coordinator instance
/// per scaling group; a replicated deployment must supply a
/// cross-process implementation instead.
#[derive(Default)]
pub struct InMemoryLockService {
    locks: DashMap<LockId, Arc<Mutex<()>>>,
}

impl InMemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, lock_id: LockId) -> Arc<Mutex<()>> {
        self.locks.entry(lock_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn try_acquire(&self, lock_id: LockId, wait: Duration) -> Option<LockGuard> {
        let mutex = self.lock_for(lock_id);
        match timeout(wait, mutex.lock_owned()).await {
            Ok(guard) => Some(LockGuard { _inner: guard }),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_acquire_times_out_while_first_holds() {
        let svc = InMemoryLockService::new();
        let g1 = svc
            .try_acquire(LockId::SchedulePending, Duration::from_millis(50))
            .await;
        assert!(g1.is_some());

        let g2 = svc
            .try_acquire(LockId::SchedulePending, Duration::from_millis(20))
            .await;
        assert!(g2.is_none(), "lock should be contended while g1 is held");

        drop(g1);
        let g3 = svc
            .try_acquire(LockId::SchedulePending, Duration::from_millis(50))
            .await;
        assert!(g3.is_some(), "lock should be free after release");
    }

    #[tokio::test]
    async fn distinct_lock_ids_do_not_contend() {
        let svc = InMemoryLockService::new();
        let g1 = svc
            .try_acquire(LockId::SchedulePending, Duration::from_millis(50))
            .await;
        let g2 = svc
            .try_acquire(LockId::CheckCreatingProgress, Duration::from_millis(50))
            .await;
        assert!(g1.is_some());
        assert!(g2.is_some());
    }
}
