//! Fetch strategy state machine
//!
//! Drives cache lookups and at most one network call per fetch, then applies
//! post-fetch cache maintenance. Outcomes are delivered through a
//! [`FetchHandle`].

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::fetch_handle::FetchHandle;
use crate::domain::cache::{CacheKey, Payload};
use crate::domain::fetch::{FetchMode, FetchOutcome, FetchRequest, Strategy};
use crate::domain::transport::{Transport, TransportError};
use crate::infrastructure::cache::ResponseCache;
use crate::infrastructure::observability::metrics;

/// Composes a [`ResponseCache`] and a [`Transport`] according to a fetch strategy
#[derive(Debug, Clone)]
pub struct FetchCoordinator {
    cache: Arc<ResponseCache>,
    transport: Arc<dyn Transport>,
}

impl FetchCoordinator {
    pub fn new(cache: Arc<ResponseCache>, transport: Arc<dyn Transport>) -> Self {
        Self { cache, transport }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Starts a fetch on the current tokio runtime
    ///
    /// Must be called from within a tokio runtime: the state machine runs on a
    /// spawned task, and `tokio::spawn` panics outside one.
    pub fn fetch(&self, request: FetchRequest) -> FetchHandle {
        let capacity = request.strategy.mode.max_deliveries();
        let (tx, rx) = mpsc::channel(capacity);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run(request, tx, cancel_rx).await;
        });

        FetchHandle::new(rx, Arc::new(cancel_tx))
    }

    async fn run(
        &self,
        request: FetchRequest,
        tx: mpsc::Sender<FetchOutcome>,
        mut cancel: watch::Receiver<bool>,
    ) {
        let key = request.cache_key(self.cache.key_generator());
        let strategy = request.strategy;
        let ttl = request.ttl;
        let delivery = Delivery {
            tx,
            mode: strategy.mode,
        };

        debug!(
            mode = %strategy.mode,
            endpoint = %request.endpoint,
            key = %key,
            "Starting fetch"
        );

        match strategy.mode {
            FetchMode::NetworkOnly => {
                let outcome = self.network(&request, &key, strategy, &mut cancel).await;
                delivery.send(outcome).await;
            }
            FetchMode::LocalOnly => {
                let cached = self.cache.get(&key, ttl).await;
                delivery.send(discard_if_cancelled(cached, &cancel)).await;
            }
            FetchMode::LocalFirst => {
                let cached = discard_if_cancelled(self.cache.get(&key, ttl).await, &cancel);
                if cached.is_hit() || cached.is_error() {
                    delivery.send(cached).await;
                } else {
                    let outcome = self.network(&request, &key, strategy, &mut cancel).await;
                    delivery.send(outcome).await;
                }
            }
            FetchMode::LocalAndNetwork => {
                let cached = discard_if_cancelled(self.cache.get(&key, ttl).await, &cancel);
                if cached.is_error() {
                    delivery.send(cached).await;
                } else {
                    if cached.is_hit() {
                        delivery.send(cached).await;
                    }
                    let outcome = self.network(&request, &key, strategy, &mut cancel).await;
                    delivery.send(outcome).await;
                }
            }
            FetchMode::NetworkFirst => {
                let outcome = self.network(&request, &key, strategy, &mut cancel).await;
                let fall_back = outcome
                    .error
                    .as_ref()
                    .is_some_and(|error| !error.is_cancelled());

                if fall_back {
                    let cached = discard_if_cancelled(self.cache.get(&key, ttl).await, &cancel);
                    if cached.is_hit() {
                        debug!(key = %key, "Network failed, serving cached entry");
                        delivery.send(cached).await;
                    } else if cached.is_error() {
                        delivery.send(cached).await;
                    } else {
                        delivery.send(outcome).await;
                    }
                } else {
                    delivery.send(outcome).await;
                }
            }
        }

        if strategy.delete_cache_after_completion {
            debug!(key = %key, "Deleting cache entry after completion");
            self.cache.remove(&key).await;
        }
    }

    /// Issues the network call and caches a successful payload
    async fn network(
        &self,
        request: &FetchRequest,
        key: &CacheKey,
        strategy: Strategy,
        cancel: &mut watch::Receiver<bool>,
    ) -> FetchOutcome {
        match self.send(request, cancel).await {
            Ok(payload) => {
                if !strategy.suppress_cache_update {
                    self.cache.store(key, payload.clone()).await;
                }
                FetchOutcome::network(payload)
            }
            Err(error) => {
                warn!(endpoint = %request.endpoint, error = %error, "Network request failed");
                FetchOutcome::network_error(error)
            }
        }
    }

    async fn send(
        &self,
        request: &FetchRequest,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Payload, TransportError> {
        let already_cancelled = *cancel.borrow();
        if already_cancelled {
            return Err(TransportError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancelled(cancel) => Err(TransportError::Cancelled),
            result = self.transport.send(&request.endpoint, &request.params) => result,
        }
    }
}

/// Replaces a cache read finished after cancellation with a cancelled outcome
fn discard_if_cancelled(cached: FetchOutcome, cancel: &watch::Receiver<bool>) -> FetchOutcome {
    let cancelled = *cancel.borrow();
    if cancelled {
        debug!(source = %cached.source, "Fetch cancelled, discarding cache read");
        FetchOutcome::network_error(TransportError::Cancelled)
    } else {
        cached
    }
}

/// Resolves once cancellation is requested; never if every handle is gone
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

struct Delivery {
    tx: mpsc::Sender<FetchOutcome>,
    mode: FetchMode,
}

impl Delivery {
    async fn send(&self, outcome: FetchOutcome) {
        metrics::record_fetch_delivery(self.mode, outcome.source, outcome.is_error());

        if self.tx.send(outcome).await.is_err() {
            debug!(mode = %self.mode, "Fetch receiver dropped, outcome discarded");
        }
    }
}
