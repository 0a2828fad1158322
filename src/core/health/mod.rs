// src/core/health/mod.rs

//! The health monitor (spec.md §4.5, component C6).

pub mod creating_keeper;
pub mod keeper;
pub mod monitor;
pub mod pulling_keeper;
pub mod result;
pub mod types;

pub use creating_keeper::CreatingHealthKeeper;
pub use keeper::HealthKeeper;
pub use monitor::HealthMonitor;
pub use pulling_keeper::PullingHealthKeeper;
pub use result::HealthCheckResult;
pub use types::{KernelHealthData, SessionHealthData};
