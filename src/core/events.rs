// src/core/events.rs

//! Lifecycle event bus (spec.md §6.2): the core publishes events after
//! a status transition commits; publication never rolls back the
//! transition on failure (spec.md §4.4's failure model). Modelled as a
//! `tokio::sync::broadcast` fan-out, the same primitive the teacher
//! uses for its pub/sub channel delivery (`core/pubsub`).

use crate::core::ids::{AgentId, SessionId};
use crate::core::model::{SessionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// One lifecycle event (spec.md §6.2). `session_id` is `None` for
/// agent-scoped events (`AgentHeartbeat`, `AgentTerminated`) and
/// `agent_id` is `None` for session/kernel-scoped ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub kind: LifecycleEventKind,
    pub session_id: Option<SessionId>,
    pub agent_id: Option<AgentId>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    pub status_before: Option<SessionStatus>,
    pub status_after: Option<SessionStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEventKind {
    SessionStarted,
    SessionTerminated,
    KernelStarted,
    KernelTerminated,
    AgentHeartbeat,
    AgentTerminated,
}

/// The publish side of the event bus. `publish` never fails the
/// caller's transaction on error; at-least-once delivery with
/// idempotent consumers is assumed (spec.md §4.4).
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: LifecycleEvent);
}

/// An in-memory broadcast-channel event bus for tests and single-process
/// deployments. Subscribers that lag behind the channel's capacity miss
/// events, consistent with "at-least-once, not exactly-once" (spec.md §5).
pub struct InMemoryEventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl InMemoryEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: LifecycleEvent) {
        // No receivers is not an error: nobody is listening yet.
        let _ = self.tx.send(event);
    }
}
