// src/core/model/agent.rs

//! The `Agent` entity: a compute node that runs kernels.
//!
//! Agent records are owned by an agent-heartbeat pipeline external to
//! this core (spec.md §3.3); the core consumes them read-only except to
//! update cache-layer bookkeeping such as `last_seen`.

use crate::core::ids::{AgentId, ScalingGroupName};
use crate::core::slots::resource_slot::ResourceSlot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Alive,
    Lost,
    Terminated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub status: AgentStatus,
    pub scaling_group: ScalingGroupName,
    pub region: String,
    pub architecture: String,
    pub public_host: String,
    pub addr: String,
    pub available_slots: ResourceSlot,
    pub occupied_slots: ResourceSlot,
    pub compute_plugins: Vec<String>,
    pub version: String,
    pub first_contact: DateTime<Utc>,
    pub lost_at: Option<DateTime<Utc>>,
    pub schedulable: bool,
}

impl Agent {
    /// Capacity still available for new reservations on this agent.
    pub fn remaining_slots(&self) -> ResourceSlot {
        self.available_slots.sub_saturating(&self.occupied_slots)
    }

    pub fn can_schedule(&self) -> bool {
        self.schedulable && self.status == AgentStatus::Alive
    }
}
