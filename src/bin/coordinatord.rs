// src/bin/coordinatord.rs

//! The `clustord-coordind` binary: wires the scheduling core's library
//! types against the in-memory store/lock/event-bus backends and runs
//! either the full coordinator + health monitor, or, with
//! `--health-monitor-only`, just the health monitor tick loop.

use clustord::config::AppConfig;
use clustord::core::agent_rpc::AgentRpcClient;
use clustord::core::coordinator::{self, CoordinatorTiming, InMemoryLockService, SchedulingCoordinator};
use clustord::core::events::InMemoryEventBus;
use clustord::core::handler::{
    CheckAbnormalRunningHandler, CheckCreatingProgressHandler, CheckPullingProgressHandler,
    CheckTerminatingProgressHandler, FifoPolicy, LifecycleHandler, SchedulePendingHandler,
};
use clustord::core::health::{CreatingHealthKeeper, HealthMonitor, PullingHealthKeeper};
use clustord::core::hooks::HookRegistry;
use clustord::core::ids::ScalingGroupName;
use clustord::core::repository::InMemoryStore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// An agent RPC client stub: every call reports "not active", the
/// fail-closed default spec.md §4.5 prescribes for an unreachable
/// agent. Real deployments supply their own `AgentRpcClient`.
struct NullAgentRpcClient;

#[async_trait::async_trait]
impl AgentRpcClient for NullAgentRpcClient {
    async fn check_pulling(
        &self,
        _agent_id: clustord::core::ids::AgentId,
        _image: &str,
    ) -> clustord::core::CoreResult<bool> {
        Ok(false)
    }

    async fn check_creating(
        &self,
        _agent_id: clustord::core::ids::AgentId,
        _kernel_id: clustord::core::ids::KernelId,
    ) -> clustord::core::CoreResult<bool> {
        Ok(false)
    }

    async fn purge_images(
        &self,
        _agent_id: clustord::core::ids::AgentId,
        images: &[clustord::core::agent_rpc::ImageRef],
        _force: bool,
        _noprune: bool,
    ) -> clustord::core::CoreResult<Vec<clustord::core::agent_rpc::PurgeImageResult>> {
        Ok(images
            .iter()
            .map(|img| clustord::core::agent_rpc::PurgeImageResult {
                image: img.name.clone(),
                error: Some("no agent RPC backend configured".to_string()),
            })
            .collect())
    }

    async fn create_session(
        &self,
        _agent_id: clustord::core::ids::AgentId,
        spec: &clustord::core::agent_rpc::SessionCreationSpec,
    ) -> clustord::core::CoreResult<clustord::core::agent_rpc::CreateSessionResult> {
        Err(clustord::core::CoreError::Fatal(format!(
            "no agent RPC backend configured for session {}",
            spec.session_id
        )))
    }

    async fn commit_session(
        &self,
        _agent_id: clustord::core::ids::AgentId,
        session_id: clustord::core::ids::SessionId,
    ) -> clustord::core::CoreResult<clustord::core::agent_rpc::CommitSessionResult> {
        Err(clustord::core::CoreError::Fatal(format!(
            "no agent RPC backend configured for session {session_id}"
        )))
    }
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config() -> AppConfig {
    let config_path = std::env::var("CLUSTORD_CONFIG").unwrap_or_else(|_| "clustord.toml".to_string());
    match AppConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("using default configuration ({config_path} unavailable: {err})");
            AppConfig::default()
        }
    }
}

fn build_handlers(hooks: Arc<HookRegistry>, store: Arc<InMemoryStore>) -> Vec<Box<dyn LifecycleHandler>> {
    vec![
        Box::new(SchedulePendingHandler::new(store.clone(), Box::new(FifoPolicy))),
        Box::new(CheckPullingProgressHandler),
        Box::new(CheckCreatingProgressHandler::new(hooks.clone())),
        Box::new(CheckTerminatingProgressHandler::new(store, hooks)),
        Box::new(CheckAbnormalRunningHandler),
    ]
}

async fn run_health_monitor_only(config: AppConfig, store: Arc<InMemoryStore>) {
    let rpc = Arc::new(NullAgentRpcClient);
    let mut monitor = HealthMonitor::new(store.clone(), config.health.check_interval());
    monitor.register(Arc::new(PullingHealthKeeper::new(
        rpc.clone(),
        store.clone(),
        config.health.pulling_threshold(),
        config.health.retry_backoff_or_default(),
        config.health.max_retries,
        config.rpc.check_timeout(),
    )));
    monitor.register(Arc::new(CreatingHealthKeeper::new(
        rpc,
        store,
        config.health.creating_threshold(),
        config.health.retry_backoff_or_default(),
        config.health.max_retries,
        config.rpc.check_timeout(),
    )));

    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    info!("running in health-monitor-only mode");
    monitor.run(shutdown_rx).await;
}

async fn run_coordinators(config: AppConfig, store: Arc<InMemoryStore>) {
    let lock_service = Arc::new(InMemoryLockService::new());
    let event_bus = Arc::new(InMemoryEventBus::new(1024));
    let rpc = Arc::new(NullAgentRpcClient);

    let mut join_set = tokio::task::JoinSet::new();
    for group_name in &config.scaling_groups {
        let scaling_group = ScalingGroupName::from(group_name.as_str());
        let hooks = Arc::new(HookRegistry::new());
        let handlers = build_handlers(hooks, store.clone());
        let (trigger, trigger_rx) = coordinator::channel();
        let timing = CoordinatorTiming {
            tick_interval: config.scheduler.tick_interval,
            debounce: config.scheduler.debounce(),
            lock_acquire_timeout: config.scheduler.lock_acquire_timeout(),
        };
        let coordinator = Arc::new(SchedulingCoordinator::new(
            scaling_group.clone(),
            handlers,
            lock_service.clone(),
            store.clone(),
            event_bus.clone(),
            trigger,
            timing,
        ));
        let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        join_set.spawn(async move {
            info!(scaling_group = %scaling_group, "coordinator starting");
            coordinator.run(trigger_rx, shutdown_rx).await;
        });
    }

    let rpc = rpc.clone();
    let mut monitor = HealthMonitor::new(store.clone(), config.health.check_interval());
    monitor.register(Arc::new(PullingHealthKeeper::new(
        rpc.clone(),
        store.clone(),
        config.health.pulling_threshold(),
        config.health.retry_backoff_or_default(),
        config.health.max_retries,
        config.rpc.check_timeout(),
    )));
    monitor.register(Arc::new(CreatingHealthKeeper::new(
        rpc,
        store,
        config.health.creating_threshold(),
        config.health.retry_backoff_or_default(),
        config.health.max_retries,
        config.rpc.check_timeout(),
    )));
    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    join_set.spawn(async move {
        monitor.run(shutdown_rx).await;
    });

    while join_set.join_next().await.is_some() {}
}

#[tokio::main]
async fn main() {
    let config = load_config();
    init_logging(&config.log_level);

    let health_monitor_only = std::env::args().any(|a| a == "--health-monitor-only");
    let store = Arc::new(InMemoryStore::new());

    if health_monitor_only {
        run_health_monitor_only(config, store).await;
    } else {
        run_coordinators(config, store).await;
    }
}
