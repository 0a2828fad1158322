// src/core/slots/allocation.rs

//! Row-level resource bookkeeping (spec.md §3.1): per-agent capacity and
//! per-kernel allocation. These are thin value types; the repository
//! layer is responsible for their durable storage and cascade-delete
//! semantics (kernel deletion cascades to its allocations).

use crate::core::ids::{AgentId, KernelId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named resource-slot type, e.g. `cpu` (count) or `mem` (bytes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSlotTypeRow {
    pub slot_name: String,
    pub slot_type: super::resource_slot::SlotType,
    pub display_name: Option<String>,
    pub rank: i32,
}

/// `(agent_id, slot_name) -> (capacity, used)`. Composite-keyed in the
/// backing store; modelled here as a flat row for handler-side batch use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResourceRow {
    pub agent_id: AgentId,
    pub slot_name: String,
    pub capacity: Decimal,
    pub used: Decimal,
}

/// `(kernel_id, slot_name) -> (requested, used, used_at?)`. Deleted via
/// cascade when the owning kernel is deleted (spec.md §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAllocationRow {
    pub kernel_id: KernelId,
    pub slot_name: String,
    pub requested: Decimal,
    pub used: Decimal,
    pub used_at: Option<DateTime<Utc>>,
}
