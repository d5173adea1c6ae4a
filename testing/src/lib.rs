//! # Foldstore Testing
//!
//! Testing utilities and helpers for foldstore.
//!
//! This crate provides:
//! - [`ReducerTest`]: Given-When-Then checks for a single reduction
//! - [`mocks::RecordingHandler`]: An effect handler that records what it was asked to do
//! - [`helpers`]: Bounded stream collection for async assertions
//! - [`properties`]: proptest strategies for action sequences
//!
//! ## Example
//!
//! ```ignore
//! use foldstore_testing::{helpers::take_within, mocks::RecordingHandler};
//! use foldstore_runtime::Store;
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_flash_on_underflow() {
//!     let handler = RecordingHandler::new();
//!     let store = Store::new(Some(Model::default()), ModelReducer, handler.clone()).unwrap();
//!
//!     store.dispatch(Action::Decrement).unwrap();
//!
//!     let states = take_within(&mut store.subscribe(), 2, Duration::from_secs(1)).await;
//!     assert_eq!(handler.recorded(), vec![Effect::Flash]);
//! }
//! ```

/// Reducer Given-When-Then test builder
pub mod reducer_test;

/// Mock implementations of the effect boundary
pub mod mocks {
    use foldstore_core::{actions, ActionStream, EffectHandler, Scheduler};
    use std::fmt;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    type Respond<E, A> = dyn Fn(&E, &Scheduler) -> ActionStream<A> + Send + Sync;

    /// Effect handler that records every effect it is given.
    ///
    /// By default each effect produces no actions. Use
    /// [`RecordingHandler::with_response`] to script follow-up actions.
    /// Clones share one recording, so keep a clone to inspect after handing
    /// the handler to a store.
    ///
    /// # Example
    ///
    /// ```
    /// use foldstore_core::{actions, EffectHandler, Scheduler};
    /// use foldstore_testing::mocks::RecordingHandler;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let handler = RecordingHandler::with_response(|tick: &u32, _scheduler: &Scheduler| {
    ///     actions::just(*tick + 1)
    /// });
    ///
    /// let _actions = handler.handle(1, &Scheduler::current().unwrap());
    /// assert_eq!(handler.recorded(), vec![1]);
    /// # }
    /// ```
    pub struct RecordingHandler<E, A> {
        recorded: Arc<Mutex<Vec<E>>>,
        respond: Arc<Respond<E, A>>,
    }

    impl<E: 'static, A: Send + 'static> RecordingHandler<E, A> {
        /// Create a handler whose effects produce no actions
        #[must_use]
        pub fn new() -> Self {
            Self::with_response(|_: &E, _: &Scheduler| actions::empty())
        }

        /// Create a handler that answers each effect with `respond`
        #[must_use]
        pub fn with_response<F>(respond: F) -> Self
        where
            F: Fn(&E, &Scheduler) -> ActionStream<A> + Send + Sync + 'static,
        {
            Self {
                recorded: Arc::new(Mutex::new(Vec::new())),
                respond: Arc::new(respond),
            }
        }
    }

    impl<E, A> RecordingHandler<E, A> {
        fn lock(&self) -> MutexGuard<'_, Vec<E>> {
            self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Number of effects handled so far
        #[must_use]
        pub fn handled_count(&self) -> usize {
            self.lock().len()
        }

        /// Forget every recorded effect
        pub fn clear(&self) {
            self.lock().clear();
        }
    }

    impl<E: Clone, A> RecordingHandler<E, A> {
        /// Every effect handled so far, in order
        #[must_use]
        pub fn recorded(&self) -> Vec<E> {
            self.lock().clone()
        }
    }

    impl<E, A> EffectHandler for RecordingHandler<E, A> {
        type Effect = E;
        type Action = A;

        fn handle(&self, effect: E, scheduler: &Scheduler) -> ActionStream<A> {
            let actions = (self.respond)(&effect, scheduler);
            self.lock().push(effect);
            actions
        }
    }

    impl<E: 'static, A: Send + 'static> Default for RecordingHandler<E, A> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<E, A> Clone for RecordingHandler<E, A> {
        fn clone(&self) -> Self {
            Self {
                recorded: Arc::clone(&self.recorded),
                respond: Arc::clone(&self.respond),
            }
        }
    }

    impl<E, A> fmt::Debug for RecordingHandler<E, A> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("RecordingHandler")
                .field("handled", &self.handled_count())
                .finish_non_exhaustive()
        }
    }
}

/// Async collection helpers
pub mod helpers {
    use foldstore_core::{ActionStream, EffectError};
    use futures::{Stream, StreamExt};
    use std::time::Duration;

    /// Take up to `n` items, stopping early if the stream ends or if no item
    /// arrives within `timeout` of the previous one.
    ///
    /// Under a paused tokio clock the timeout only elapses once every task is
    /// idle, so it never cuts off timer-driven items.
    pub async fn take_within<St>(stream: &mut St, n: usize, timeout: Duration) -> Vec<St::Item>
    where
        St: Stream + Unpin,
    {
        let mut items = Vec::with_capacity(n);
        while items.len() < n {
            match tokio::time::timeout(timeout, stream.next()).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) | Err(_) => break,
            }
        }
        items
    }

    /// Drain an effect handler's action stream to completion.
    pub async fn collect_actions<A>(actions: ActionStream<A>) -> Vec<Result<A, EffectError>> {
        actions.collect().await
    }

    /// Install a `tracing` subscriber that writes through the test harness.
    ///
    /// Honors `RUST_LOG`. Safe to call from every test.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::collection::vec;
    use proptest::strategy::Strategy;
    use std::fmt::Debug;

    /// Sequences of up to `max_len` actions drawn from `action`.
    pub fn action_sequences<A, S>(action: S, max_len: usize) -> impl Strategy<Value = Vec<A>>
    where
        A: Debug,
        S: Strategy<Value = A>,
    {
        vec(action, 0..=max_len)
    }
}

// Re-export commonly used items
pub use mocks::RecordingHandler;
pub use reducer_test::{assertions, ReducerTest};
