//! The reducer: the single place business logic lives.
//!
//! Reducers are pure functions `(Option<&State>, Action) -> Next<State, Effect>`.
//! They are deterministic and perform no I/O. Asynchronous work is requested
//! by returning effect descriptions, which the store interprets.
//!
//! # Examples
//!
//! ```
//! use foldstore_core::{Next, Reducer};
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Counter {
//!     value: i64,
//! }
//!
//! enum CounterAction {
//!     Increment,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = Counter;
//!     type Action = CounterAction;
//!     type Effect = ();
//!
//!     fn reduce(&self, state: Option<&Counter>, action: CounterAction) -> Next<Counter, ()> {
//!         let mut state = state.cloned().unwrap_or_default();
//!         match action {
//!             CounterAction::Increment => state.value += 1,
//!         }
//!         Next::state(state)
//!     }
//! }
//!
//! let next = CounterReducer.reduce(None, CounterAction::Increment);
//! assert_eq!(next.state, Some(Counter { value: 1 }));
//! ```

use crate::next::Next;
use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

/// The Reducer trait - core abstraction for business logic
///
/// # Type Parameters
///
/// - `State`: The state this reducer folds actions into
/// - `Action`: The input the reducer processes
/// - `Effect`: Descriptions of asynchronous work the reducer may request
///
/// # Contract
///
/// - Total over every `(state, action)` pair it can observe. `state` is
///   `None` until the first state exists; substitute a default.
/// - Pure: identical inputs give identical results, no side effects.
/// - A panic is a programming error and terminates the owning store.
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// The effect descriptions this reducer can emit
    type Effect;

    /// Reduce an action against the current state.
    ///
    /// # Arguments
    ///
    /// - `state`: Current state, or `None` if no state exists yet
    /// - `action`: The action to process
    ///
    /// # Returns
    ///
    /// The optional new state plus the effects to dispatch
    fn reduce(
        &self,
        state: Option<&Self::State>,
        action: Self::Action,
    ) -> Next<Self::State, Self::Effect>;
}

impl<R: Reducer + ?Sized> Reducer for Box<R> {
    type State = R::State;
    type Action = R::Action;
    type Effect = R::Effect;

    fn reduce(
        &self,
        state: Option<&Self::State>,
        action: Self::Action,
    ) -> Next<Self::State, Self::Effect> {
        (**self).reduce(state, action)
    }
}

impl<R: Reducer + ?Sized> Reducer for std::sync::Arc<R> {
    type State = R::State;
    type Action = R::Action;
    type Effect = R::Effect;

    fn reduce(
        &self,
        state: Option<&Self::State>,
        action: Self::Action,
    ) -> Next<Self::State, Self::Effect> {
        (**self).reduce(state, action)
    }
}

/// A [`Reducer`] backed by a closure.
///
/// Created with [`reducer_fn`].
pub struct FnReducer<F, S, A, E> {
    f: F,
    _marker: PhantomData<fn(Option<&S>, A) -> Next<S, E>>,
}

impl<F, S, A, E> Reducer for FnReducer<F, S, A, E>
where
    F: Fn(Option<&S>, A) -> Next<S, E>,
{
    type State = S;
    type Action = A;
    type Effect = E;

    fn reduce(&self, state: Option<&S>, action: A) -> Next<S, E> {
        (self.f)(state, action)
    }
}

impl<F: Clone, S, A, E> Clone for FnReducer<F, S, A, E> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

impl<F, S, A, E> fmt::Debug for FnReducer<F, S, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnReducer").finish_non_exhaustive()
    }
}

/// Wrap a closure as a [`Reducer`].
///
/// # Examples
///
/// ```
/// use foldstore_core::{reducer_fn, Next, Reducer};
///
/// let reducer = reducer_fn(|state: Option<&u32>, step: u32| -> Next<u32, ()> {
///     Next::state(state.copied().unwrap_or(0) + step)
/// });
///
/// assert_eq!(reducer.reduce(Some(&2), 3).state, Some(5));
/// ```
pub const fn reducer_fn<F, S, A, E>(f: F) -> FnReducer<F, S, A, E>
where
    F: Fn(Option<&S>, A) -> Next<S, E>,
{
    FnReducer {
        f,
        _marker: PhantomData,
    }
}

/// Effect-less reducer: `(Option<&S>, A) -> S`.
///
/// Every step yields a state and no effects. Its effect type is
/// [`Infallible`], so a store built from it never invokes a handler.
/// Created with [`pure_reducer`].
pub struct PureReducer<F, S, A> {
    f: F,
    _marker: PhantomData<fn(Option<&S>, A) -> S>,
}

impl<F, S, A> Reducer for PureReducer<F, S, A>
where
    F: Fn(Option<&S>, A) -> S,
{
    type State = S;
    type Action = A;
    type Effect = Infallible;

    fn reduce(&self, state: Option<&S>, action: A) -> Next<S, Infallible> {
        Next::state((self.f)(state, action))
    }
}

impl<F: Clone, S, A> Clone for PureReducer<F, S, A> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

impl<F, S, A> fmt::Debug for PureReducer<F, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PureReducer").finish_non_exhaustive()
    }
}

/// Wrap a state-only closure as a [`Reducer`] with no effects.
pub const fn pure_reducer<F, S, A>(f: F) -> PureReducer<F, S, A>
where
    F: Fn(Option<&S>, A) -> S,
{
    PureReducer {
        f,
        _marker: PhantomData,
    }
}
