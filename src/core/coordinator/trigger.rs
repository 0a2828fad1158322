// src/core/coordinator/trigger.rs

//! Scheduling-needed signal (spec.md §4.4 step 1): any repository
//! mutation that could make more sessions schedulable (a new session
//! submitted, an agent becoming available, a session terminating and
//! freeing slots) calls [`SchedulingTrigger::mark_needed`] instead of
//! waking the coordinator directly. The coordinator's tick loop wakes
//! on *either* its interval timer or this signal, whichever comes
//! first, and coalesces bursts of signals into a single extra tick
//! (spec.md §4.4: "debounced").
//!
//! Grounded on the teacher's use of `tokio::sync::watch` to fan a
//! single state change out to many awaiting tasks (`warden/worker.rs`).

use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// The write side: cheap to clone, held by every component that can
/// make more sessions schedulable.
#[derive(Clone)]
pub struct SchedulingTrigger {
    tx: watch::Sender<u64>,
}

/// The read side, held by the coordinator's tick loop.
pub struct SchedulingTriggerRx {
    rx: watch::Receiver<u64>,
}

/// Creates a linked trigger/receiver pair.
pub fn channel() -> (SchedulingTrigger, SchedulingTriggerRx) {
    let (tx, rx) = watch::channel(0);
    (SchedulingTrigger { tx }, SchedulingTriggerRx { rx })
}

impl SchedulingTrigger {
    /// Signals that scheduling should be (re-)attempted soon. Never
    /// blocks; multiple signals before the coordinator wakes collapse
    /// into one round, since only the latest value is kept.
    pub fn mark_needed(&self) {
        self.tx.send_modify(|counter| *counter = counter.wrapping_add(1));
    }
}

impl SchedulingTriggerRx {
    /// Waits until a signal has arrived, then sleeps `debounce` once
    /// more to coalesce any signals that follow in quick succession,
    /// and drains them so the next call blocks on a genuinely fresh one.
    pub async fn wait_for_signal(&mut self, debounce: Duration) {
        if self.rx.changed().await.is_err() {
            // Sender dropped; nothing more will ever arrive.
            std::future::pending::<()>().await;
        }
        if !debounce.is_zero() {
            sleep(debounce).await;
        }
        self.rx.mark_unchanged();
    }
}
