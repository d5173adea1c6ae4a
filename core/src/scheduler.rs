//! Execution context for reduction loops and effect emissions.
//!
//! A [`Scheduler`] is a handle to the tokio runtime a store runs on. The
//! store spawns its reduction loop through it and effect handlers use it for
//! timers, so everything belonging to one store shares one clock.
//!
//! Tests can pause tokio's clock (`tokio::time::pause`) to drive timer-based
//! handlers in virtual time.

use crate::effect::ActionStream;
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep};

/// Errors from creating a [`Scheduler`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// No tokio runtime is running on the current thread
    #[error("no tokio runtime available on this thread")]
    NoRuntime,
}

/// Handle to the runtime that executes a store.
#[derive(Debug, Clone)]
pub struct Scheduler {
    handle: Handle,
}

impl Scheduler {
    /// The runtime the caller is currently running on.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] when called outside a tokio runtime.
    pub fn current() -> Result<Self, SchedulerError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(|_| SchedulerError::NoRuntime)
    }

    /// Wrap an explicit runtime handle.
    #[must_use]
    pub const fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }

    /// The underlying runtime handle
    #[must_use]
    pub const fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawn a task on this scheduler.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Current time on this scheduler's clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        let _guard = self.handle.enter();
        Instant::now()
    }

    /// A future completing after `duration`.
    #[must_use]
    pub fn sleep(&self, duration: Duration) -> Sleep {
        let _guard = self.handle.enter();
        tokio::time::sleep(duration)
    }

    /// Ticks `0, 1, 2, …`, the first one `period` after this call.
    ///
    /// A zero period is raised to one nanosecond. Missed ticks are delayed,
    /// never burst.
    #[must_use]
    pub fn interval(&self, period: Duration) -> BoxStream<'static, u64> {
        let period = period.max(Duration::from_nanos(1));
        let mut interval = {
            let _guard = self.handle.enter();
            tokio::time::interval_at(Instant::now() + period, period)
        };
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        stream::unfold((interval, 0_u64), |(mut interval, tick)| async move {
            interval.tick().await;
            Some((tick, (interval, tick.wrapping_add(1))))
        })
        .boxed()
    }

    /// An action stream yielding `action` once, `duration` from now.
    #[must_use]
    pub fn delay<A: Send + 'static>(&self, duration: Duration, action: A) -> ActionStream<A> {
        let sleep = self.sleep(duration);
        stream::once(async move {
            sleep.await;
            Ok(action)
        })
        .boxed()
    }
}
