//! Replay-of-latest state publication.
//!
//! A single-slot cache holding the most recent state plus a fan-out list of
//! subscribers. A new subscriber is handed the cached state immediately and
//! then every later state in publication order. Each subscriber owns an
//! unbounded queue, so a slow subscriber never drops or coalesces states and
//! never slows the reduction loop.
//!
//! When the store terminates, every subscriber sees the end of its stream;
//! abnormal termination is delivered first as one `Err` item.

use crate::error::StoreError;
use crate::metrics::{STATES_PUBLISHED_TOTAL, SUBSCRIBERS};
use futures::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

type Item<S> = Result<S, StoreError>;

/// Lifecycle of a store as seen by observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreStatus {
    /// The reduction loop is processing actions
    Running,

    /// Every dispatcher was dropped and all effect streams finished
    Completed,

    /// The reduction loop stopped on an error
    Failed(StoreError),
}

impl StoreStatus {
    /// Whether the loop is still running
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

struct Shared<S> {
    latest: Option<S>,
    status: StoreStatus,
    subscribers: Vec<mpsc::UnboundedSender<Item<S>>>,
}

fn lock<S>(shared: &Mutex<Shared<S>>) -> MutexGuard<'_, Shared<S>> {
    // State is only ever replaced wholesale, a poisoned guard is still consistent
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Subscribable handle over a store's published state.
///
/// Cloning is cheap; every clone observes the same live stream.
pub struct StateStream<S> {
    shared: Arc<Mutex<Shared<S>>>,
}

impl<S> Clone for StateStream<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> std::fmt::Debug for StateStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = lock(&self.shared);
        f.debug_struct("StateStream")
            .field("has_state", &shared.latest.is_some())
            .field("status", &shared.status)
            .field("subscribers", &shared.subscribers.len())
            .finish()
    }
}

impl<S: Clone> StateStream<S> {
    /// Subscribe to state updates.
    ///
    /// The cached state, if any, is already queued when this returns, so the
    /// first poll of the subscription yields it without waiting. A store that
    /// has already terminated replays its last state and terminal signal.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut shared = lock(&self.shared);

        if let Some(latest) = &shared.latest {
            let _ = tx.send(Ok(latest.clone()));
        }

        match &shared.status {
            StoreStatus::Running => shared.subscribers.push(tx),
            StoreStatus::Completed => {},
            StoreStatus::Failed(error) => {
                let _ = tx.send(Err(error.clone()));
            },
        }

        Subscription { rx }
    }

    /// The most recently published state
    #[must_use]
    pub fn current(&self) -> Option<S> {
        lock(&self.shared).latest.clone()
    }
}

impl<S> StateStream<S> {
    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> StoreStatus {
        lock(&self.shared).status.clone()
    }

    /// Number of subscriptions that have not been dropped
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut shared = lock(&self.shared);
        shared.subscribers.retain(|tx| !tx.is_closed());
        shared.subscribers.len()
    }
}

impl<S: Clone> StateStream<S> {
    /// Wait until the store terminates and return the final status.
    pub async fn closed(&self) -> StoreStatus {
        let mut subscription = self.subscribe();
        while subscription.recv().await.is_some() {}
        self.status()
    }
}

/// Write side of a [`StateStream`], owned by the reduction loop.
pub(crate) struct Publisher<S> {
    shared: Arc<Mutex<Shared<S>>>,
    name: String,
}

impl<S: Clone> Publisher<S> {
    /// Create a publisher seeded with `initial` and its read handle.
    pub(crate) fn new(initial: Option<S>, name: String) -> (Self, StateStream<S>) {
        let shared = Arc::new(Mutex::new(Shared {
            latest: initial,
            status: StoreStatus::Running,
            subscribers: Vec::new(),
        }));

        let stream = StateStream {
            shared: Arc::clone(&shared),
        };

        (Self { shared, name }, stream)
    }

    /// Cache `state` and deliver it to every live subscriber.
    pub(crate) fn publish(&self, state: S) {
        let mut shared = lock(&self.shared);

        shared
            .subscribers
            .retain(|tx| tx.send(Ok(state.clone())).is_ok());
        shared.latest = Some(state);

        ::metrics::counter!(STATES_PUBLISHED_TOTAL, "store" => self.name.clone()).increment(1);
        // Note: Precision loss acceptable for metrics (subscriber counts < 2^52)
        #[allow(clippy::cast_precision_loss)]
        ::metrics::gauge!(SUBSCRIBERS, "store" => self.name.clone())
            .set(shared.subscribers.len() as f64);

        tracing::trace!(subscribers = shared.subscribers.len(), "Published state");
    }
}

impl<S> Publisher<S> {
    /// Record the terminal status and close every subscription.
    pub(crate) fn finish(&self, status: StoreStatus) {
        let mut shared = lock(&self.shared);
        if !shared.status.is_running() {
            return;
        }

        let subscribers = std::mem::take(&mut shared.subscribers);
        if let StoreStatus::Failed(error) = &status {
            for tx in &subscribers {
                let _ = tx.send(Err(error.clone()));
            }
        }
        shared.status = status;
    }
}

impl<S> Drop for Publisher<S> {
    fn drop(&mut self) {
        // Loop task dropped without finishing, e.g. its runtime shut down
        self.finish(StoreStatus::Failed(StoreError::Aborted));
    }
}

/// One observer's view of a [`StateStream`].
///
/// Yields `Ok(state)` for the cached state and every later publication,
/// `Err(error)` once if the store fails, then ends. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription<S> {
    rx: mpsc::UnboundedReceiver<Item<S>>,
}

impl<S> Subscription<S> {
    /// Receive the next item, or `None` once the store has terminated.
    pub async fn recv(&mut self) -> Option<Result<S, StoreError>> {
        self.rx.recv().await
    }

    /// Take the next item if one is already queued.
    pub fn try_recv(&mut self) -> Option<Result<S, StoreError>> {
        self.rx.try_recv().ok()
    }

    /// Skip states equal to the previously yielded one.
    #[must_use]
    pub fn distinct_until_changed(self) -> DistinctUntilChanged<S> {
        DistinctUntilChanged {
            inner: self,
            last: None,
        }
    }
}

impl<S> Stream for Subscription<S> {
    type Item = Result<S, StoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// A [`Subscription`] that suppresses consecutive duplicate states.
#[derive(Debug)]
pub struct DistinctUntilChanged<S> {
    inner: Subscription<S>,
    last: Option<S>,
}

impl<S: Clone + PartialEq + Unpin> Stream for DistinctUntilChanged<S> {
    type Item = Result<S, StoreError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match this.inner.rx.poll_recv(cx) {
                Poll::Ready(Some(Ok(state))) => {
                    if this.last.as_ref() == Some(&state) {
                        continue;
                    }
                    this.last = Some(state.clone());
                    return Poll::Ready(Some(Ok(state)));
                },
                other => return other,
            }
        }
    }
}
