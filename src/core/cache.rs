// src/core/cache.rs

//! Schedule cache (spec.md §6.3): a rebuildable side-index the
//! image-sync step and device-plugin side populate and the scheduling
//! path consults, distinct from the relational store that remains the
//! source of truth. `mark_schedule_needed`/`take_schedule_needed` is
//! not modeled here: `coordinator::trigger::SchedulingTrigger` already
//! implements that same debounced signal in-process for this
//! single-node deployment (see DESIGN.md).

use crate::core::ids::AgentId;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// An image already pulled onto an agent, as reported by its heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledImage {
    pub canonical: String,
    pub digest: String,
    pub architecture: String,
}

#[async_trait]
pub trait ScheduleCache: Send + Sync {
    /// `installed_image:{agent_id}` (spec.md §6.3).
    async fn installed_images(&self, agent_id: AgentId) -> Vec<InstalledImage>;
    async fn set_installed_images(&self, agent_id: AgentId, images: Vec<InstalledImage>);

    /// `agents_for_image:{image_id}` (spec.md §6.3).
    async fn agents_for_image(&self, image_id: &str) -> HashSet<AgentId>;
    async fn add_agent_for_image(&self, image_id: &str, agent_id: AgentId);

    /// `gpu_allocation_map:{agent_id}` (spec.md §6.3): an opaque JSON
    /// blob maintained by the device-plugin side; the core only stores
    /// and returns it.
    async fn gpu_allocation_map(&self, agent_id: AgentId) -> Option<serde_json::Value>;
    async fn set_gpu_allocation_map(&self, agent_id: AgentId, value: serde_json::Value);
}

#[derive(Default)]
pub struct InMemoryScheduleCache {
    installed_images: DashMap<AgentId, Vec<InstalledImage>>,
    agents_for_image: DashMap<String, HashSet<AgentId>>,
    gpu_allocation_map: DashMap<AgentId, serde_json::Value>,
}

impl InMemoryScheduleCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl ScheduleCache for InMemoryScheduleCache {
    async fn installed_images(&self, agent_id: AgentId) -> Vec<InstalledImage> {
        self.installed_images.get(&agent_id).map(|r| r.clone()).unwrap_or_default()
    }

    async fn set_installed_images(&self, agent_id: AgentId, images: Vec<InstalledImage>) {
        self.installed_images.insert(agent_id, images);
    }

    async fn agents_for_image(&self, image_id: &str) -> HashSet<AgentId> {
        self.agents_for_image.get(image_id).map(|r| r.clone()).unwrap_or_default()
    }

    async fn add_agent_for_image(&self, image_id: &str, agent_id: AgentId) {
        self.agents_for_image
            .entry(image_id.to_string())
            .or_default()
            .insert(agent_id);
    }

    async fn gpu_allocation_map(&self, agent_id: AgentId) -> Option<serde_json::Value> {
        self.gpu_allocation_map.get(&agent_id).map(|r| r.clone())
    }

    async fn set_gpu_allocation_map(&self, agent_id: AgentId, value: serde_json::Value) {
        self.gpu_allocation_map.insert(agent_id, value);
    }
}
