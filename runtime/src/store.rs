//! The Store engine.
//!
//! One store owns one reduction loop: a single task on the configured
//! scheduler that consumes a merged timeline of external actions and
//! effect-produced actions, one at a time.
//!
//! ```text
//! dispatch(a) ─┐
//!              ├─▶ timeline ─▶ reducer ─▶ Next { state?, effects }
//! handler(e) ──┘                              │          │
//!     ▲                                       │          └─▶ publish(state)
//!     └───────────────────────────────────────┘
//! ```

use crate::dispatch::Dispatcher;
use crate::error::StoreError;
use crate::metrics::{
    describe_metrics, ACTIONS_TOTAL, EFFECTS_ACTIVE, EFFECTS_COUNT, EFFECTS_FAILED_TOTAL,
    REDUCER_DURATION_SECONDS, TERMINATIONS_TOTAL,
};
use crate::state_stream::{Publisher, StateStream, StoreStatus, Subscription};
use crate::{HandlerFailurePolicy, StoreConfig};
use foldstore_core::{
    pure_reducer, ActionStream, EffectError, EffectHandler, NoEffects, Reducer, Scheduler,
};
use futures::future;
use futures::stream::{BoxStream, SelectAll, StreamExt};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::Instrument;

/// The Store - a running reduction loop and its two endpoints
///
/// The Store exposes:
/// 1. A [`StateStream`] publishing every non-empty reduced state (replay of latest)
/// 2. A [`Dispatcher`] feeding actions into the timeline
///
/// Both are cheap to clone. The loop keeps running while any dispatcher or
/// effect stream is alive, independent of how many subscribers exist.
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
///
/// # Example
///
/// ```ignore
/// let store = Store::new(Some(Model::default()), ModelReducer, FlashHandler::default())?;
///
/// let mut states = store.subscribe();
/// store.dispatch(Action::Increment)?;
/// ```
pub struct Store<S, A> {
    state: StateStream<S>,
    dispatcher: Dispatcher<A>,
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + 'static,
    A: Send + 'static,
{
    /// Build a store and start its reduction loop.
    ///
    /// # Arguments
    ///
    /// - `initial_state`: Seed state, published to subscribers immediately.
    ///   `None` means nothing is published until a reduction yields a state.
    /// - `reducer`: Pure business logic
    /// - `handler`: Interprets the reducer's effects into action streams
    /// - `config`: Scheduler, name and handler failure policy
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoRuntime`] if no scheduler is configured and
    /// this is called outside a tokio runtime.
    pub fn build<R, H>(
        initial_state: Option<S>,
        reducer: R,
        handler: H,
        config: StoreConfig,
    ) -> Result<Self, StoreError>
    where
        R: Reducer<State = S, Action = A> + Send + 'static,
        H: EffectHandler<Effect = R::Effect, Action = A> + Send + 'static,
    {
        let scheduler = match config.scheduler {
            Some(scheduler) => scheduler,
            None => Scheduler::current()?,
        };
        describe_metrics();

        let (tx, rx) = mpsc::unbounded_channel();
        let (publisher, state) = Publisher::new(initial_state.clone(), config.name.clone());

        let reduction_loop = ReductionLoop {
            reducer,
            handler,
            scheduler: scheduler.clone(),
            state: initial_state,
            publisher,
            effects: SelectAll::new(),
            next_effect_id: 0,
            policy: config.handler_failure,
            name: config.name,
        };

        let span = tracing::info_span!("store_loop", store = %reduction_loop.name);
        scheduler.spawn(reduction_loop.run(rx).instrument(span));

        Ok(Self {
            state,
            dispatcher: Dispatcher::new(tx),
        })
    }

    /// Build a store with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoRuntime`] when called outside a tokio runtime.
    pub fn new<R, H>(initial_state: Option<S>, reducer: R, handler: H) -> Result<Self, StoreError>
    where
        R: Reducer<State = S, Action = A> + Send + 'static,
        H: EffectHandler<Effect = R::Effect, Action = A> + Send + 'static,
    {
        Self::build(initial_state, reducer, handler, StoreConfig::default())
    }

    /// Build an effect-less store from a state-only reducer closure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoRuntime`] when called outside a tokio runtime.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::pure(Some(0), |count: Option<&i64>, delta: i64| {
    ///     count.copied().unwrap_or_default() + delta
    /// })?;
    /// ```
    pub fn pure<F>(initial_state: Option<S>, reducer: F) -> Result<Self, StoreError>
    where
        F: Fn(Option<&S>, A) -> S + Send + 'static,
    {
        Self::new(initial_state, pure_reducer(reducer), NoEffects::new())
    }
}

impl<S, A> Store<S, A> {
    /// The state stream
    #[must_use]
    pub const fn state(&self) -> &StateStream<S> {
        &self.state
    }

    /// The dispatcher
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher<A> {
        &self.dispatcher
    }

    /// Split into the state stream and the dispatcher.
    ///
    /// Dropping the returned dispatcher (and all its clones) lets the store
    /// complete once its effect streams finish.
    #[must_use]
    pub fn into_parts(self) -> (StateStream<S>, Dispatcher<A>) {
        (self.state, self.dispatcher)
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> StoreStatus {
        self.state.status()
    }
}

impl<S: Clone, A: Send + 'static> Store<S, A> {
    /// Queue an action. See [`Dispatcher::dispatch`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Terminated`] if the reduction loop has ended.
    pub fn dispatch(&self, action: A) -> Result<(), StoreError> {
        self.dispatcher.dispatch(action)
    }

    /// Subscribe to state updates. See [`StateStream::subscribe`].
    #[must_use]
    pub fn subscribe(&self) -> Subscription<S> {
        self.state.subscribe()
    }

    /// The most recently published state
    #[must_use]
    pub fn current(&self) -> Option<S> {
        self.state.current()
    }

    /// Wait for the reduction loop to end and return how it ended.
    ///
    /// A store that still holds its own dispatcher can only end by failing.
    /// Use [`into_parts`](Self::into_parts) to observe completion.
    pub async fn terminated(&self) -> StoreStatus {
        self.state.closed().await
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<S, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Where an action entered the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionSource {
    External,
    Effect(u64),
}

impl ActionSource {
    const fn as_str(self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Effect(_) => "effect",
        }
    }
}

type TaggedStream<A> = BoxStream<'static, (u64, Result<A, EffectError>)>;

/// Internal: state owned exclusively by the reduction task.
struct ReductionLoop<R, H>
where
    R: Reducer,
{
    reducer: R,
    handler: H,
    scheduler: Scheduler,
    state: Option<R::State>,
    publisher: Publisher<R::State>,
    effects: SelectAll<TaggedStream<R::Action>>,
    next_effect_id: u64,
    policy: HandlerFailurePolicy,
    name: String,
}

impl<R, H> ReductionLoop<R, H>
where
    R: Reducer,
    R::State: Clone,
    R::Action: Send + 'static,
    H: EffectHandler<Effect = R::Effect, Action = R::Action>,
{
    /// Consume the timeline until the store completes or fails.
    async fn run(mut self, mut external: mpsc::UnboundedReceiver<R::Action>) {
        tracing::debug!("Reduction loop started");
        let mut external_open = true;

        let status = loop {
            let (action, source) = tokio::select! {
                received = external.recv(), if external_open => match received {
                    Some(action) => (action, ActionSource::External),
                    None => {
                        tracing::debug!("All dispatchers dropped");
                        external_open = false;
                        continue;
                    },
                },
                Some((effect_id, item)) = self.next_effect(), if !self.effects.is_empty() => {
                    match item {
                        Ok(action) => (action, ActionSource::Effect(effect_id)),
                        Err(error) => match self.effect_failed(effect_id, &error) {
                            Ok(()) => continue,
                            Err(error) => break StoreStatus::Failed(error),
                        },
                    }
                },
                else => break StoreStatus::Completed,
            };

            if let Err(error) = self.step(action, source) {
                break StoreStatus::Failed(error);
            }
        };

        // Refuse further dispatches before subscribers observe the end
        drop(external);
        self.terminate(status);
    }

    /// Next item from any running handler stream.
    async fn next_effect(&mut self) -> Option<(u64, Result<R::Action, EffectError>)> {
        let item = self.effects.next().await;
        self.record_active_effects();
        item
    }

    /// Reduce one action, start its effects and publish its state.
    fn step(&mut self, action: R::Action, source: ActionSource) -> Result<(), StoreError> {
        tracing::debug!(
            source = source.as_str(),
            effect_id = ?effect_id_of(source),
            "Processing action"
        );
        ::metrics::counter!(
            ACTIONS_TOTAL,
            "store" => self.name.clone(),
            "source" => source.as_str()
        )
        .increment(1);

        let start = Instant::now();
        let reducer = &self.reducer;
        let state = self.state.as_ref();
        let next = panic::catch_unwind(AssertUnwindSafe(|| reducer.reduce(state, action)))
            .map_err(|payload| StoreError::ReducerPanicked(panic_message(payload.as_ref())))?;
        ::metrics::histogram!(REDUCER_DURATION_SECONDS, "store" => self.name.clone())
            .record(start.elapsed().as_secs_f64());

        let (state, effects) = next.into_parts();
        tracing::trace!(
            has_state = state.is_some(),
            effects = effects.len(),
            "Reducer completed"
        );
        // Note: Precision loss acceptable for metrics (effect counts < 2^52)
        #[allow(clippy::cast_precision_loss)]
        ::metrics::histogram!(EFFECTS_COUNT, "store" => self.name.clone())
            .record(effects.len() as f64);

        for effect in effects {
            self.start_effect(effect)?;
        }

        if let Some(state) = state {
            self.state = Some(state.clone());
            self.publisher.publish(state);
        }

        Ok(())
    }

    /// Invoke the handler and merge its action stream into the timeline.
    fn start_effect(&mut self, effect: R::Effect) -> Result<(), StoreError> {
        let effect_id = self.next_effect_id;
        self.next_effect_id = self.next_effect_id.wrapping_add(1);

        let handler = &self.handler;
        let scheduler = &self.scheduler;
        let started = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(effect, scheduler)));
        let actions = match started {
            Ok(actions) => actions,
            Err(payload) => {
                let error = EffectError::new(panic_message(payload.as_ref()));
                return self.effect_failed(effect_id, &error);
            },
        };

        tracing::trace!(effect_id, "Effect handler started");
        self.effects.push(tag(effect_id, actions));
        self.record_active_effects();
        Ok(())
    }

    fn record_active_effects(&self) {
        // Note: Precision loss acceptable for metrics (stream counts < 2^52)
        #[allow(clippy::cast_precision_loss)]
        ::metrics::gauge!(EFFECTS_ACTIVE, "store" => self.name.clone())
            .set(self.effects.len() as f64);
    }

    /// Apply the handler failure policy.
    fn effect_failed(&self, effect_id: u64, error: &EffectError) -> Result<(), StoreError> {
        ::metrics::counter!(EFFECTS_FAILED_TOTAL, "store" => self.name.clone()).increment(1);
        self.record_active_effects();

        match self.policy {
            HandlerFailurePolicy::Isolate => {
                tracing::warn!(
                    effect_id,
                    error = %error,
                    "Effect handler failed, dropping its action stream"
                );
                Ok(())
            },
            HandlerFailurePolicy::Propagate => {
                tracing::error!(effect_id, error = %error, "Effect handler failed, stopping store");
                Err(StoreError::EffectFailed(error.message().to_string()))
            },
        }
    }

    fn terminate(self, status: StoreStatus) {
        let outcome = match &status {
            StoreStatus::Failed(error) => {
                tracing::error!(error = %error, "Store terminated abnormally");
                "failed"
            },
            StoreStatus::Running | StoreStatus::Completed => {
                tracing::debug!("Store completed");
                "completed"
            },
        };
        ::metrics::counter!(
            TERMINATIONS_TOTAL,
            "store" => self.name.clone(),
            "outcome" => outcome
        )
        .increment(1);

        // Dropping `self.effects` cancels any handler stream still running
        ::metrics::gauge!(EFFECTS_ACTIVE, "store" => self.name.clone()).set(0.0);
        self.publisher.finish(status);
    }
}

/// Tag a handler stream with its effect id and end it after the first error.
///
/// A panic while polling the stream becomes an error item.
fn tag<A: Send + 'static>(effect_id: u64, actions: ActionStream<A>) -> TaggedStream<A> {
    AssertUnwindSafe(actions)
        .catch_unwind()
        .map(|polled| {
            polled.unwrap_or_else(|payload| Err(EffectError::new(panic_message(payload.as_ref()))))
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .map(move |item| (effect_id, item))
        .boxed()
}

const fn effect_id_of(source: ActionSource) -> Option<u64> {
    match source {
        ActionSource::External => None,
        ActionSource::Effect(id) => Some(id),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
