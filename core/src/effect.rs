//! Effect interpretation boundary.
//!
//! Reducers describe effects as plain values. An [`EffectHandler`] turns one
//! effect into an [`ActionStream`]: a lazy sequence of follow-up actions the
//! store merges back into its timeline as they arrive.
//!
//! A handler may be impure (timers, I/O, logging). A failure surfaces as an
//! `Err` item on the handler's own stream and ends that stream.

use crate::scheduler::Scheduler;
use futures::stream::{self, BoxStream, StreamExt};
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use thiserror::Error;

/// Failure raised by an effect handler while producing actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("effect handler failed: {message}")]
pub struct EffectError {
    message: String,
}

impl EffectError {
    /// Create an error from any displayable message.
    #[must_use]
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    /// The failure message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The lazy action sequence returned by an effect handler.
pub type ActionStream<A> = BoxStream<'static, Result<A, EffectError>>;

/// Interprets effect descriptions into streams of follow-up actions.
///
/// `handle` is called synchronously, once per effect, inside the reduction
/// step that produced it. The returned stream is polled afterwards on the
/// store's scheduler; its items may arrive at any later time.
pub trait EffectHandler {
    /// Effect descriptions this handler understands
    type Effect;

    /// Actions it produces
    type Action;

    /// Start handling `effect`.
    fn handle(&self, effect: Self::Effect, scheduler: &Scheduler) -> ActionStream<Self::Action>;
}

impl<H: EffectHandler + ?Sized> EffectHandler for Box<H> {
    type Effect = H::Effect;
    type Action = H::Action;

    fn handle(&self, effect: Self::Effect, scheduler: &Scheduler) -> ActionStream<Self::Action> {
        (**self).handle(effect, scheduler)
    }
}

impl<H: EffectHandler + ?Sized> EffectHandler for std::sync::Arc<H> {
    type Effect = H::Effect;
    type Action = H::Action;

    fn handle(&self, effect: Self::Effect, scheduler: &Scheduler) -> ActionStream<Self::Action> {
        (**self).handle(effect, scheduler)
    }
}

/// An [`EffectHandler`] backed by a closure. Created with [`handler_fn`].
pub struct FnHandler<F, E, A> {
    f: F,
    _marker: PhantomData<fn(E) -> A>,
}

impl<F, E, A> EffectHandler for FnHandler<F, E, A>
where
    F: Fn(E, &Scheduler) -> ActionStream<A>,
{
    type Effect = E;
    type Action = A;

    fn handle(&self, effect: E, scheduler: &Scheduler) -> ActionStream<A> {
        (self.f)(effect, scheduler)
    }
}

impl<F: Clone, E, A> Clone for FnHandler<F, E, A> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

impl<F, E, A> fmt::Debug for FnHandler<F, E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Wrap a closure as an [`EffectHandler`].
///
/// # Examples
///
/// ```
/// use foldstore_core::effect::{actions, handler_fn, EffectHandler};
///
/// #[derive(Debug)]
/// enum Effect { PlaySound }
///
/// #[derive(Debug, PartialEq)]
/// enum Action { Reset }
///
/// let handler = handler_fn(|effect: Effect, _scheduler: &foldstore_core::Scheduler| match effect {
///     Effect::PlaySound => actions::just(Action::Reset),
/// });
/// # let _ = handler;
/// ```
pub const fn handler_fn<F, E, A>(f: F) -> FnHandler<F, E, A>
where
    F: Fn(E, &Scheduler) -> ActionStream<A>,
{
    FnHandler {
        f,
        _marker: PhantomData,
    }
}

/// Handler for reducers whose effect type is [`Infallible`].
///
/// It can never be called, since no effect value exists.
pub struct NoEffects<A>(PhantomData<fn() -> A>);

impl<A> NoEffects<A> {
    /// Create the handler
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<A> Default for NoEffects<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Clone for NoEffects<A> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for NoEffects<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NoEffects")
    }
}

impl<A> EffectHandler for NoEffects<A> {
    type Effect = Infallible;
    type Action = A;

    fn handle(&self, effect: Infallible, _scheduler: &Scheduler) -> ActionStream<A> {
        match effect {}
    }
}

/// Constructors for common [`ActionStream`] shapes.
pub mod actions {
    use super::{stream, ActionStream, EffectError, Future, StreamExt};

    /// A stream yielding exactly one action.
    #[must_use]
    pub fn just<A: Send + 'static>(action: A) -> ActionStream<A> {
        stream::once(async move { Ok(action) }).boxed()
    }

    /// A stream that completes without yielding.
    #[must_use]
    pub fn empty<A: Send + 'static>() -> ActionStream<A> {
        stream::empty().boxed()
    }

    /// A stream yielding every action of `actions` in order.
    pub fn from_iter<A, I>(actions: I) -> ActionStream<A>
    where
        A: Send + 'static,
        I: IntoIterator<Item = A>,
        I::IntoIter: Send + 'static,
    {
        stream::iter(actions.into_iter().map(Ok)).boxed()
    }

    /// A stream that fails immediately with `error`.
    #[must_use]
    pub fn fail<A: Send + 'static>(error: EffectError) -> ActionStream<A> {
        stream::once(async move { Err(error) }).boxed()
    }

    /// A stream that awaits `future` and yields its action, if any.
    pub fn from_future<A, F>(future: F) -> ActionStream<A>
    where
        A: Send + 'static,
        F: Future<Output = Option<A>> + Send + 'static,
    {
        stream::once(future)
            .filter_map(|action| async move { action.map(Ok) })
            .boxed()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Tick(u32),
        Reset,
    }

    #[tokio::test]
    async fn test_just_yields_once() {
        let items: Vec<_> = actions::just(TestAction::Reset).collect().await;
        assert_eq!(items, vec![Ok(TestAction::Reset)]);
    }

    #[tokio::test]
    async fn test_from_iter_preserves_order() {
        let items: Vec<_> = actions::from_iter((1..=3).map(TestAction::Tick))
            .collect()
            .await;
        assert_eq!(
            items,
            vec![
                Ok(TestAction::Tick(1)),
                Ok(TestAction::Tick(2)),
                Ok(TestAction::Tick(3)),
            ]
        );
    }

    #[tokio::test]
    async fn test_from_future_skips_none() {
        let items: Vec<_> = actions::from_future(async { None::<TestAction> })
            .collect()
            .await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_fail_surfaces_on_stream() {
        let items: Vec<_> = actions::fail::<TestAction>(EffectError::new("boom"))
            .collect()
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].clone().err().map(|e| e.message().to_owned()),
            Some("boom".to_owned())
        );
    }

    #[tokio::test]
    async fn test_generator_handler_yields_then_fails() {
        let handler = handler_fn(|count: u32, _scheduler: &Scheduler| {
            async_stream::stream! {
                for tick in 0..count {
                    yield Ok(TestAction::Tick(tick));
                }
                yield Err(EffectError::new("exhausted"));
            }
            .boxed()
        });
        let scheduler = Scheduler::current().unwrap();

        let items: Vec<_> = handler.handle(2, &scheduler).collect().await;

        assert_eq!(
            items,
            vec![
                Ok(TestAction::Tick(0)),
                Ok(TestAction::Tick(1)),
                Err(EffectError::new("exhausted")),
            ]
        );
    }

    #[tokio::test]
    async fn test_handler_fn_receives_effect() {
        let handler = handler_fn(|tick: u32, _scheduler: &Scheduler| {
            actions::just(TestAction::Tick(tick * 2))
        });
        let scheduler = Scheduler::current().unwrap();
        let items: Vec<_> = handler.handle(21, &scheduler).collect().await;
        assert_eq!(items, vec![Ok(TestAction::Tick(42))]);
    }
}
