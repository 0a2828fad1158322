// src/core/hooks.rs

//! Transition hooks (spec.md §4.3: `on_transition_to_running`,
//! `on_transition_to_terminated`) as a small registry of trait objects
//! rather than a dynamic decorator/event-subscription system (spec.md
//! §9 "dynamic decorator/hook registration" flag). A hook is registered
//! once at startup and invoked synchronously by the handler that owns
//! that transition point.

use crate::core::errors::CoreResult;
use crate::core::ids::SessionId;
use async_trait::async_trait;

/// A side-channel action run at a specific lifecycle transition point.
/// Failure keeps the session at its current status for this round
/// (spec.md §4.3: "on failure of the hook the session stays in
/// CREATING").
#[async_trait]
pub trait TransitionHook: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, session_id: SessionId) -> CoreResult<()>;
}

/// An ordered list of hooks run for one transition point. All hooks
/// must succeed for the transition point as a whole to succeed.
#[derive(Default)]
pub struct HookRegistry {
    on_transition_to_running: Vec<Box<dyn TransitionHook>>,
    on_transition_to_terminated: Vec<Box<dyn TransitionHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_on_transition_to_running(&mut self, hook: Box<dyn TransitionHook>) {
        self.on_transition_to_running.push(hook);
    }

    pub fn register_on_transition_to_terminated(&mut self, hook: Box<dyn TransitionHook>) {
        self.on_transition_to_terminated.push(hook);
    }

    pub async fn run_on_transition_to_running(&self, session_id: SessionId) -> CoreResult<()> {
        for hook in &self.on_transition_to_running {
            hook.run(session_id).await?;
        }
        Ok(())
    }

    pub async fn run_on_transition_to_terminated(&self, session_id: SessionId) -> CoreResult<()> {
        for hook in &self.on_transition_to_terminated {
            hook.run(session_id).await?;
        }
        Ok(())
    }
}
