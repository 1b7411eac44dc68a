//! View sessions
//!
//! A `ViewSession` owns the "current" graph of one logical view. Each
//! refresh is tagged with a sequence number and a cancellation token; issuing
//! a new refresh cancels the previous one, and a response is published only
//! while its sequence is still the latest. Periodic refresh runs as a tokio
//! task that exists only between `start_auto_refresh` and
//! `stop_auto_refresh` (or drop).

use super::GraphService;
use crate::error::ServiceError;
use crate::graph::{DependencyGraph, GraphFilter, Subgraph, extract};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub type Snapshot = Option<Arc<DependencyGraph>>;

struct SessionInner {
    service: GraphService,
    sequence: AtomicU64,
    /// Token of the latest request; held while the sequence is compared
    current: Mutex<Option<CancellationToken>>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl SessionInner {
    fn lock_current(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn refresh(&self, filter: &GraphFilter) -> Result<Arc<DependencyGraph>, ServiceError> {
        let token = CancellationToken::new();
        let sequence = {
            let mut current = self.lock_current();
            if let Some(previous) = current.replace(token.clone()) {
                previous.cancel();
            }
            self.sequence.fetch_add(1, Ordering::SeqCst) + 1
        };
        tracing::debug!("Starting refresh #{}", sequence);

        let result = self.service.retrieve_cancellable(filter, &token).await;

        let _current = self.lock_current();
        let latest = self.sequence.load(Ordering::SeqCst);
        if sequence != latest {
            tracing::debug!(
                "Discarding response of refresh #{} (latest is #{})",
                sequence,
                latest
            );
            return Err(ServiceError::Superseded { sequence, latest });
        }

        let graph = Arc::new(result?);
        self.snapshot_tx.send_replace(Some(graph.clone()));
        Ok(graph)
    }
}

/// The current graph of one view
pub struct ViewSession {
    inner: Arc<SessionInner>,
    refresh_task: Option<JoinHandle<()>>,
}

impl ViewSession {
    pub fn new(service: GraphService) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner {
                service,
                sequence: AtomicU64::new(0),
                current: Mutex::new(None),
                snapshot_tx,
            }),
            refresh_task: None,
        }
    }

    /// Retrieve the graph and make it current
    ///
    /// Fails with `ServiceError::Superseded` when another refresh was issued
    /// before this one completed; the newer request's result wins.
    pub async fn refresh(&self, filter: &GraphFilter) -> Result<Arc<DependencyGraph>, ServiceError> {
        self.inner.refresh(filter).await
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn current(&self) -> Snapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Sequence number of the most recently issued refresh
    pub fn latest_sequence(&self) -> u64 {
        self.inner.sequence.load(Ordering::SeqCst)
    }

    /// Neighbourhood of `id` in the current snapshot
    pub fn focus(&self, id: &str, depth: usize) -> Option<Subgraph> {
        self.current().map(|graph| extract(&graph, id, depth))
    }

    /// Refresh every `interval` until stopped
    ///
    /// The first refresh happens one interval after the call. `on_refresh`
    /// receives each outcome, including superseded ones. Starting again
    /// replaces the running task.
    pub fn start_auto_refresh<F>(&mut self, filter: GraphFilter, interval: Duration, on_refresh: F)
    where
        F: Fn(Result<Arc<DependencyGraph>, ServiceError>) + Send + Sync + 'static,
    {
        self.stop_auto_refresh();

        let inner = self.inner.clone();
        tracing::debug!("Starting auto-refresh every {:?}", interval);
        self.refresh_task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let result = inner.refresh(&filter).await;
                if let Err(e) = &result {
                    tracing::warn!("Auto-refresh failed: {}", e);
                }
                on_refresh(result);
            }
        }));
    }

    pub fn stop_auto_refresh(&mut self) {
        if let Some(handle) = self.refresh_task.take() {
            tracing::debug!("Stopping auto-refresh");
            handle.abort();
        }
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.refresh_task
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ViewSession {
    fn drop(&mut self) {
        self.stop_auto_refresh();
        if let Some(token) = self.inner.lock_current().take() {
            token.cancel();
        }
    }
}
