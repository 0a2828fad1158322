// src/core/model/mod.rs

//! Value types for the data model described in spec.md §3.1.
//!
//! These are plain structs with no back-references to each other;
//! handlers receive compact, query-time-built batches rather than a
//! live object graph (spec.md §9).

pub mod agent;
pub mod kernel;
pub mod scaling_group;
pub mod session;

pub use agent::{Agent, AgentStatus};
pub use kernel::{Kernel, KernelRole, KernelStatus};
pub use scaling_group::{ScalingGroup, SchedulingPolicyKind};
pub use session::{ClusterMode, Session, SessionStatus, SessionType};
