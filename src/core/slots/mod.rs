// src/core/slots/mod.rs

//! Resource-slot accounting (component C1, spec.md §4.1).

pub mod allocation;
pub mod resource_slot;

pub use allocation::{AgentResourceRow, ResourceAllocationRow, ResourceSlotTypeRow};
pub use resource_slot::{ResourceSlot, SlotType};
