// src/core/handler/mod.rs

//! Lifecycle handlers (spec.md §4.3, component C4): the five canonical
//! per-transition handlers plus the shared `LifecycleHandler` contract.

pub mod check_abnormal_running;
pub mod check_creating;
pub mod check_pulling;
pub mod check_terminating;
pub mod schedule_pending;
pub mod traits;

pub use check_abnormal_running::CheckAbnormalRunningHandler;
pub use check_creating::CheckCreatingProgressHandler;
pub use check_pulling::CheckPullingProgressHandler;
pub use check_terminating::CheckTerminatingProgressHandler;
pub use schedule_pending::{DrfPolicy, FifoPolicy, LifoPolicy, SchedulePendingHandler, SchedulingPolicy};
pub use traits::{
    HandlerKernelData, HandlerSessionData, LifecycleHandler, ScheduledSessionData,
    SessionExecutionResult,
};
