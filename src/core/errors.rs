// src/core/errors.rs

//! Defines the primary error type for the scheduling core.

use crate::core::ids::{AgentId, SessionId};
use thiserror::Error;

/// The main error enum, representing all failures the core recognises.
///
/// Mirrors the taxonomy in spec.md §7: each variant maps to a distinct
/// propagation policy decided by the caller (coordinator, handler, or
/// health monitor), not by this type itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A referenced session/agent/kernel/image/policy does not exist.
    /// Never retried; surfaced to the caller.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller lacks rights to perform the requested operation.
    /// Never retried.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A status guard failed (the session was not in the expected status
    /// when the write was attempted). Treated as a no-op this round; the
    /// next round re-reads current state.
    #[error("precondition failed for session {session_id}: {reason}")]
    PreconditionFailed { session_id: SessionId, reason: String },

    /// No agent has enough capacity for a pending session. The session is
    /// left PENDING and retried on the next trigger.
    #[error("resource exhausted for session {session_id}: {reason}")]
    ResourceExhausted { session_id: SessionId, reason: String },

    /// A network/RPC/store hiccup. Retried with bounded exponential
    /// backoff by the caller, then demoted to `Failure`.
    #[error("transient error: {0}")]
    Transient(String),

    /// Retries exhausted or an unrecoverable error occurred. The session
    /// moves to ERROR with this as the reason.
    #[error("failure: {0}")]
    Failure(String),

    /// A process-level error (misconfiguration, corrupt state). The
    /// caller logs and exits; the supervising process restarts the core.
    #[error("fatal error: {0}")]
    Fatal(String),

    /// An agent-scoped operation referenced an agent that could not be
    /// reached or is no longer schedulable.
    #[error("agent {agent_id} unavailable: {reason}")]
    AgentUnavailable { agent_id: AgentId, reason: String },
}

impl CoreError {
    /// Whether this error kind is, in principle, retryable by the
    /// coordinator on a later round without operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::PreconditionFailed { .. }
                | CoreError::ResourceExhausted { .. }
                | CoreError::Transient(_)
        )
    }

    /// A short, stable reason string suitable for `status_info` (spec.md §7).
    pub fn status_info(&self) -> String {
        match self {
            CoreError::NotFound(s) => format!("not-found: {s}"),
            CoreError::PermissionDenied(s) => format!("permission-denied: {s}"),
            CoreError::PreconditionFailed { reason, .. } => {
                format!("precondition-failed: {reason}")
            }
            CoreError::ResourceExhausted { reason, .. } => {
                format!("resource-exhausted: {reason}")
            }
            CoreError::Transient(s) => format!("transient: {s}"),
            CoreError::Failure(s) => format!("failure: {s}"),
            CoreError::Fatal(s) => format!("fatal: {s}"),
            CoreError::AgentUnavailable { reason, .. } => format!("agent-unavailable: {reason}"),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
