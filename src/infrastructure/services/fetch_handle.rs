//! Receiving side of a running fetch

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::domain::fetch::FetchOutcome;

/// Outcomes of one fetch, in delivery order
///
/// The channel yields one outcome, or two for a cache hit under
/// `LocalAndNetwork`, and then closes. Dropping the handle does not cancel
/// the fetch.
#[derive(Debug)]
pub struct FetchHandle {
    outcomes: mpsc::Receiver<FetchOutcome>,
    cancel: Arc<watch::Sender<bool>>,
}

impl FetchHandle {
    pub(crate) fn new(
        outcomes: mpsc::Receiver<FetchOutcome>,
        cancel: Arc<watch::Sender<bool>>,
    ) -> Self {
        Self { outcomes, cancel }
    }

    /// Waits for the next outcome; `None` once the fetch has completed
    pub async fn next(&mut self) -> Option<FetchOutcome> {
        self.outcomes.recv().await
    }

    /// Waits for completion and returns every outcome
    pub async fn collect(mut self) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::with_capacity(2);
        while let Some(outcome) = self.outcomes.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Waits for completion and returns the final outcome
    pub async fn last(self) -> Option<FetchOutcome> {
        self.collect().await.pop()
    }

    /// Cancels the in-flight network call, if any
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn canceller(&self) -> FetchCanceller {
        FetchCanceller {
            cancel: Arc::clone(&self.cancel),
        }
    }

    /// Invokes `callback` for each outcome on a background task
    pub fn on_outcome<F>(mut self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(FetchOutcome) + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(outcome) = self.outcomes.recv().await {
                callback(outcome);
            }
        })
    }
}

impl Stream for FetchHandle {
    type Item = FetchOutcome;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.outcomes.poll_recv(cx)
    }
}

/// Detached cancellation for a fetch
#[derive(Debug, Clone)]
pub struct FetchCanceller {
    cancel: Arc<watch::Sender<bool>>,
}

impl FetchCanceller {
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}
