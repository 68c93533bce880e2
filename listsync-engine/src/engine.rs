//! Batch orchestration over a set of list definitions.
//!
//! The engine is constructed once by the host and shared by reference.
//! A single atomic flag ensures only one run is active at a time; it is
//! released by a guard on every exit path.

use crate::config::{ConcurrentRunPolicy, SyncConfig};
use crate::detector::{ChangeDetector, ChangeKind};
use crate::error::{SyncError, SyncResult};
use crate::reconciler::ListReconciler;
use crate::report::{ListOutcome, SyncPlan, SyncReport};
use crate::status::{ListenerId, StatusHub, SyncStatus};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use listsync_storage::CatalogStore;
use listsync_types::ListDefinition;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// Reconcile only definitions whose fingerprint changed.
    Auto,
    /// Reconcile every definition.
    Force,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto sync"),
            Self::Force => f.write_str("forced sync"),
        }
    }
}

/// Clears the in-progress flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The list sync engine.
pub struct ListSyncEngine {
    /// Configuration.
    config: SyncConfig,
    /// Backing store.
    store: Arc<dyn CatalogStore>,
    detector: ChangeDetector,
    reconciler: ListReconciler,
    /// Set while a run is active.
    running: AtomicBool,
    /// Completion time of the last successful run.
    last_sync: RwLock<Option<DateTime<Utc>>>,
    status: StatusHub,
}

impl ListSyncEngine {
    /// Creates an engine writing to `store`.
    pub fn new(store: Arc<dyn CatalogStore>, config: SyncConfig) -> Self {
        Self {
            detector: ChangeDetector::new(Arc::clone(&store)),
            reconciler: ListReconciler::new(Arc::clone(&store)),
            status: StatusHub::new(config.status_channel_capacity),
            running: AtomicBool::new(false),
            last_sync: RwLock::new(None),
            config,
            store,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the batch size.
    pub fn batch_size(&self) -> usize {
        self.config.effective_batch_size()
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    // ── Single-list operations ───────────────────────────────────

    /// Returns true if the definition is new or changed since its last sync.
    pub async fn needs_update(&self, definition: &ListDefinition) -> SyncResult<bool> {
        self.detector.needs_update(definition).await
    }

    /// Reconciles one list outside of a batch run.
    pub async fn sync_single_list(&self, definition: &ListDefinition) -> ListOutcome {
        self.reconciler.sync_single_list(definition).await
    }

    // ── Runs ─────────────────────────────────────────────────────

    /// Reconciles every definition whose content changed since it was last
    /// written, in batches of `batch_size` concurrent lists.
    ///
    /// Per-list failures are reported in the returned report. Errors are
    /// returned only for run-level failures: a concurrent run (under
    /// `ConcurrentRunPolicy::Reject`), duplicate codes in `definitions`, or
    /// a failed lookup while scanning for changes.
    pub async fn auto_sync(&self, definitions: &[ListDefinition]) -> SyncResult<SyncReport> {
        self.run(definitions, RunMode::Auto).await
    }

    /// Reconciles every definition, ignoring stored fingerprints.
    pub async fn force_sync(&self, definitions: &[ListDefinition]) -> SyncResult<SyncReport> {
        self.run(definitions, RunMode::Force).await
    }

    /// Classifies definitions without writing anything.
    pub async fn plan(&self, definitions: &[ListDefinition]) -> SyncResult<SyncPlan> {
        check_unique_codes(definitions)?;
        let mut plan = SyncPlan::default();
        for definition in definitions {
            let code = definition.code.clone();
            match self.detector.classify(definition).await? {
                ChangeKind::New => plan.create.push(code),
                ChangeKind::Changed => plan.update.push(code),
                ChangeKind::Unchanged => plan.unchanged.push(code),
            }
        }
        Ok(plan)
    }

    /// Returns true while a run is active.
    pub fn is_sync_in_progress(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns when the last run completed, if any has.
    pub async fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.read().await
    }

    // ── Progress ─────────────────────────────────────────────────

    /// Registers a callback receiving every status update.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        self.status.add_listener(listener)
    }

    /// Unregisters a callback.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.status.remove_listener(id)
    }

    /// Opens a channel receiving every subsequent status update.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    // ── Internals ────────────────────────────────────────────────

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    async fn run(&self, definitions: &[ListDefinition], mode: RunMode) -> SyncResult<SyncReport> {
        let Some(_guard) = self.try_begin() else {
            return match self.config.concurrent_run_policy {
                ConcurrentRunPolicy::Reject => {
                    warn!("Rejected {}: another run is in progress", mode);
                    Err(SyncError::AlreadyRunning)
                }
                ConcurrentRunPolicy::ReturnEmpty => {
                    debug!("Skipped {}: another run is in progress", mode);
                    Ok(SyncReport::empty())
                }
            };
        };

        let started = Instant::now();
        match self.run_batches(definitions, mode, Utc::now()).await {
            Ok(mut report) => {
                report.finish(started.elapsed());
                *self.last_sync.write().await = Some(report.finished_at);
                self.status.publish(SyncStatus::completed());
                info!(
                    "Finished {} in {:?}: {} created, {} updated, {} skipped, {} failed",
                    mode, report.duration, report.created, report.updated, report.skipped,
                    report.failed
                );
                Ok(report)
            }
            Err(e) => {
                error!("Aborted {}: {}", mode, e);
                self.status.publish(SyncStatus::error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn run_batches(
        &self,
        definitions: &[ListDefinition],
        mode: RunMode,
        started_at: DateTime<Utc>,
    ) -> SyncResult<SyncReport> {
        check_unique_codes(definitions)?;
        info!("Starting {} of {} list definitions", mode, definitions.len());
        self.status.publish(SyncStatus::running(0, None));

        let mut report = SyncReport::begin(started_at);
        let mut pending = Vec::new();
        for definition in definitions {
            if mode == RunMode::Force || self.detector.needs_update(definition).await? {
                pending.push(definition);
            } else {
                debug!("List {} is up to date", definition.code);
                report.record(ListOutcome::skipped(&definition.code));
            }
        }

        let total = pending.len();
        let mut processed = 0;
        for batch in pending.chunks(self.batch_size()) {
            let outcomes =
                join_all(batch.iter().map(|definition| self.reconcile(definition, mode))).await;
            processed += batch.len();
            for outcome in outcomes {
                report.record(outcome);
            }
            let current = batch.last().map(|definition| definition.name.clone());
            self.status.publish(SyncStatus::running(percent(processed, total), current));
        }

        Ok(report)
    }

    async fn reconcile(&self, definition: &ListDefinition, mode: RunMode) -> ListOutcome {
        match mode {
            RunMode::Auto => self.reconciler.sync_single_list(definition).await,
            RunMode::Force => self.reconciler.force_sync_single_list(definition).await,
        }
    }
}

fn check_unique_codes(definitions: &[ListDefinition]) -> SyncResult<()> {
    let mut seen = HashSet::with_capacity(definitions.len());
    for definition in definitions {
        if !seen.insert(definition.code.as_str()) {
            return Err(SyncError::InvalidDefinition(format!(
                "list {} is defined more than once",
                definition.code
            )));
        }
    }
    Ok(())
}

fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (processed.min(total) * 100 / total) as u8
}
