//! # Foldstore Runtime
//!
//! Runtime implementation for foldstore.
//!
//! This crate provides the Store engine that serializes actions onto a single
//! timeline, runs the reducer, interprets effects and publishes state.
//!
//! ## Core Components
//!
//! - **Store**: Builds and owns one reduction loop
//! - **Dispatcher**: Non-blocking entry point for external actions
//! - **`StateStream`**: Replay-of-latest publication of reduced state
//! - **Reduction loop**: Single consumer task merging external and effect actions
//!
//! ## Example
//!
//! ```ignore
//! use foldstore_runtime::Store;
//!
//! let store = Store::new(Some(CounterState::default()), CounterReducer, FlashHandler::default())?;
//!
//! // Observe state: the current value is delivered first
//! let mut states = store.subscribe();
//!
//! // Dispatch returns immediately; reduction happens on the store's scheduler
//! store.dispatch(CounterAction::Increment)?;
//!
//! while let Some(Ok(state)) = states.recv().await {
//!     println!("count = {}", state.count);
//! }
//! ```

/// Dispatcher handles feeding actions into a store
pub mod dispatch;

/// Metric names and descriptions recorded by the runtime
pub mod metrics;

/// Replay-of-latest state publication
pub mod state_stream;

/// The Store engine and its reduction loop
pub mod store;

/// Error types for the Store runtime
pub mod error {
    use foldstore_core::SchedulerError;
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// Terminal errors (`ReducerPanicked`, `EffectFailed`, `Aborted`) are also
    /// delivered to every state subscriber, so the type is `Clone`.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// No runtime was configured and none is running on this thread
        #[error("No tokio runtime available to run the store")]
        NoRuntime,

        /// The reduction loop has ended and no longer accepts actions
        ///
        /// Returned by `dispatch()` after the store completed or failed.
        #[error("Store has terminated")]
        Terminated,

        /// The reducer panicked while processing an action
        ///
        /// Reducers are assumed total, so this is a defect. The store stops.
        #[error("Reducer panicked: {0}")]
        ReducerPanicked(String),

        /// An effect handler failed and the store propagates handler failures
        #[error("Effect execution failed: {0}")]
        EffectFailed(String),

        /// The reduction loop stopped without finishing (runtime shut down)
        #[error("Reduction loop stopped unexpectedly")]
        Aborted,
    }

    impl From<SchedulerError> for StoreError {
        fn from(error: SchedulerError) -> Self {
            match error {
                SchedulerError::NoRuntime => Self::NoRuntime,
            }
        }
    }
}

use foldstore_core::Scheduler;

/// What the store does when an effect handler's action stream fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandlerFailurePolicy {
    /// Log the failure, drop that handler's stream and keep running
    #[default]
    Isolate,

    /// Fail the store: the state stream ends with [`StoreError::EffectFailed`]
    Propagate,
}

/// Configuration for Store instances
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_name("counter")
///     .with_scheduler(Scheduler::from_handle(runtime.handle().clone()))
///     .with_handler_failure(HandlerFailurePolicy::Propagate);
///
/// let store = Store::build(None, reducer, handler, config)?;
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Runtime that runs the reduction loop and effect emissions.
    /// `None` uses the runtime `build` is called from.
    pub scheduler: Option<Scheduler>,
    /// Name recorded on tracing spans and metric labels
    pub name: String,
    /// Handling of effect handler failures
    pub handler_failure: HandlerFailurePolicy,
}

impl StoreConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheduler
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Set the store name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the handler failure policy
    #[must_use]
    pub const fn with_handler_failure(mut self, policy: HandlerFailurePolicy) -> Self {
        self.handler_failure = policy;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scheduler: None,
            name: "store".to_string(),
            handler_failure: HandlerFailurePolicy::default(),
        }
    }
}

// Re-export for convenience
pub use dispatch::Dispatcher;
pub use error::StoreError;
pub use state_stream::{DistinctUntilChanged, StateStream, StoreStatus, Subscription};
pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = StoreConfig::default();
        assert!(config.scheduler.is_none());
        assert_eq!(config.name, "store");
        assert_eq!(config.handler_failure, HandlerFailurePolicy::Isolate);
    }

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::new()
            .with_name("counter")
            .with_handler_failure(HandlerFailurePolicy::Propagate);
        assert_eq!(config.name, "counter");
        assert_eq!(config.handler_failure, HandlerFailurePolicy::Propagate);
    }

    #[test]
    fn test_scheduler_error_maps_to_no_runtime() {
        let error: StoreError = foldstore_core::SchedulerError::NoRuntime.into();
        assert_eq!(error, StoreError::NoRuntime);
    }
}
