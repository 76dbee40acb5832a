//! Discovery scheduler: background cache warm-up passes.
//!
//! A coarse full pass and a fine incremental pass iterate the inventory,
//! resolving each item through the engine so only cache misses reach the
//! dispatcher. Passes run off the request path on their own task; the tick
//! loop also drives the TTL sweep.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::models::{DiscoveryConfig, DiscoveryRun, DiscoveryStatus, PassKind};
use crate::domain::ports::InventoryProvider;
use crate::services::cache_manager::CacheManager;
use crate::services::resolution_service::ResolutionService;

/// Drives periodic warm-up passes over the inventory.
pub struct DiscoveryScheduler {
    service: Arc<ResolutionService>,
    cache: Arc<CacheManager>,
    inventory: Arc<dyn InventoryProvider>,
    config: DiscoveryConfig,
    runs: Arc<RwLock<VecDeque<DiscoveryRun>>>,
    running: Arc<AtomicBool>,
}

impl DiscoveryScheduler {
    pub fn new(
        service: Arc<ResolutionService>,
        cache: Arc<CacheManager>,
        inventory: Arc<dyn InventoryProvider>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            service,
            cache,
            inventory,
            config,
            runs: Arc::new(RwLock::new(VecDeque::new())),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the tick loop. Returns its join handle.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        let service = Arc::clone(&self.service);
        let cache = Arc::clone(&self.cache);
        let inventory = Arc::clone(&self.inventory);
        let runs = Arc::clone(&self.runs);
        let running = Arc::clone(&self.running);
        let config = self.config.clone();
        let tick = Duration::from_millis(config.tick_interval_ms);

        tokio::spawn(async move {
            let mut last_full: Option<DateTime<Utc>> = None;
            let mut last_incremental: Option<DateTime<Utc>> = None;

            while running.load(Ordering::SeqCst) {
                tokio::time::sleep(tick).await;
                let now = Utc::now();

                if is_due(last_full, config.full_interval_secs, now) {
                    let run = execute_pass(
                        &service,
                        &inventory,
                        &config,
                        PassKind::Full,
                        None,
                    )
                    .await;
                    record_run(&runs, run, config.run_history_capacity).await;
                    last_full = Some(now);
                    last_incremental = Some(now);
                } else if is_due(last_incremental, config.incremental_interval_secs, now) {
                    let run = execute_pass(
                        &service,
                        &inventory,
                        &config,
                        PassKind::Incremental,
                        last_incremental,
                    )
                    .await;
                    record_run(&runs, run, config.run_history_capacity).await;
                    last_incremental = Some(now);
                    cache.sweep_expired().await;
                }
            }
        })
    }

    /// Stop the tick loop after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one full pass immediately, outside the tick loop.
    pub async fn run_full_pass(&self) -> DiscoveryRun {
        let run = execute_pass(&self.service, &self.inventory, &self.config, PassKind::Full, None).await;
        record_run(&self.runs, run.clone(), self.config.run_history_capacity).await;
        run
    }

    /// Run one incremental pass immediately, scanning items first seen
    /// after `since`.
    pub async fn run_incremental_pass(&self, since: Option<DateTime<Utc>>) -> DiscoveryRun {
        let run = execute_pass(
            &self.service,
            &self.inventory,
            &self.config,
            PassKind::Incremental,
            since,
        )
        .await;
        record_run(&self.runs, run.clone(), self.config.run_history_capacity).await;
        run
    }

    /// Recent pass history, most recent first.
    pub async fn recent_runs(&self) -> Vec<DiscoveryRun> {
        self.runs.read().await.iter().cloned().collect()
    }
}

fn is_due(last: Option<DateTime<Utc>>, interval_secs: u64, now: DateTime<Utc>) -> bool {
    match last {
        None => true,
        Some(last) => now.signed_duration_since(last) >= chrono::Duration::seconds(interval_secs as i64),
    }
}

async fn execute_pass(
    service: &Arc<ResolutionService>,
    inventory: &Arc<dyn InventoryProvider>,
    config: &DiscoveryConfig,
    kind: PassKind,
    since: Option<DateTime<Utc>>,
) -> DiscoveryRun {
    let started_at = Utc::now();

    let items = match (kind, since) {
        (PassKind::Incremental, Some(since)) => inventory.added_since(since).await,
        _ => inventory.all().await,
    };

    let (items_scanned, status) = match items {
        Ok(items) => {
            let scanned = items.len() as u64;
            futures::stream::iter(items)
                .for_each_concurrent(config.max_concurrent_resolutions, |item| {
                    let service = Arc::clone(service);
                    async move {
                        service.resolve(&item).await;
                    }
                })
                .await;
            (scanned, DiscoveryStatus::Completed)
        }
        Err(err) => {
            warn!(kind = kind.as_str(), error = %err, "inventory scan failed");
            (0, DiscoveryStatus::Failed)
        }
    };

    let run = DiscoveryRun {
        id: Uuid::new_v4(),
        kind,
        started_at,
        finished_at: Utc::now(),
        items_scanned,
        status,
    };
    info!(
        kind = kind.as_str(),
        items = items_scanned,
        status = status.as_str(),
        "discovery pass finished"
    );
    run
}

async fn record_run(
    runs: &Arc<RwLock<VecDeque<DiscoveryRun>>>,
    run: DiscoveryRun,
    capacity: usize,
) {
    let mut runs = runs.write().await;
    runs.push_front(run);
    runs.truncate(capacity);
}
