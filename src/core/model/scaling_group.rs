// src/core/model/scaling_group.rs

//! A named pool of agents with a scheduling policy attached.

use crate::core::ids::ScalingGroupName;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The ordering/placement policy a scaling group applies to its pending
/// sessions. spec.md §1 deliberately leaves the policy set open
/// ("fifo | lifo | drf | …"); this enum covers the policies the core
/// ships, and `SchedulingPolicyKind::Custom` is the escape hatch for a
/// deployment-specific policy registered at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SchedulingPolicyKind {
    Fifo,
    Lifo,
    Drf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingGroup {
    pub name: ScalingGroupName,
    pub policy: SchedulingPolicyKind,
}
