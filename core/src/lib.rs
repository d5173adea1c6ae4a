//! # Foldstore Core
//!
//! Core traits and types for foldstore, a unidirectional state container.
//!
//! A store folds a stream of actions into a state value with a pure reducer.
//! The reducer may also request asynchronous side effects, which an effect
//! handler turns into further actions fed back into the same stream.
//!
//! ## Core Concepts
//!
//! - **State**: The value folded by the reducer and published to observers
//! - **Action**: Input to the reducer, dispatched externally or by effects
//! - **Reducer**: Pure function `(Option<&State>, Action) → Next<State, Effect>`
//! - **Effect**: Description of asynchronous work (not execution)
//! - **Effect handler**: Impure function `(Effect, &Scheduler) → ActionStream<Action>`
//! - **Scheduler**: The runtime that executes the reduction loop and effect timers
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Explicit Effects (no hidden I/O)
//!
//! The runtime that executes all of this lives in `foldstore-runtime`.

pub mod effect;
pub mod next;
pub mod reducer;
pub mod scheduler;

pub use effect::{
    actions, handler_fn, ActionStream, EffectError, EffectHandler, FnHandler, NoEffects,
};
pub use next::{Effects, Next};
pub use reducer::{pure_reducer, reducer_fn, FnReducer, PureReducer, Reducer};
pub use scheduler::{Scheduler, SchedulerError};

// Re-export for building effect lists in reducers
pub use smallvec::{smallvec, SmallVec};
