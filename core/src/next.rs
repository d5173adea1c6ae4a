//! The result of a single reduction step.
//!
//! A reducer never touches the outside world. Instead it returns a [`Next`]:
//! an optional replacement state plus a list of effect descriptions that the
//! store hands to the effect handler afterwards.
//!
//! # Examples
//!
//! ```
//! use foldstore_core::next::Next;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Effect {
//!     Flash,
//! }
//!
//! // New state, nothing else to do
//! let next: Next<i32, Effect> = Next::state(1);
//! assert_eq!(next.state, Some(1));
//! assert!(!next.has_effects());
//!
//! // Leave state alone, ask for a flash
//! let next: Next<i32, Effect> = Next::effect(Effect::Flash);
//! assert!(!next.has_state());
//! assert_eq!(next.effects.as_slice(), &[Effect::Flash]);
//! ```

use smallvec::SmallVec;

/// Effects returned from one reduction. Most reductions produce zero or one.
pub type Effects<E> = SmallVec<[E; 4]>;

/// Reduction result: an optional new state and the effects to dispatch.
///
/// `state: None` means the step produced no new state. The store keeps the
/// previous state current and publishes nothing for this step. Every effect
/// in `effects` is handed to the effect handler, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Next<S, E> {
    /// Replacement state, if the action changed it
    pub state: Option<S>,
    /// Effects to dispatch after the reduction
    pub effects: Effects<E>,
}

impl<S, E> Next<S, E> {
    /// No new state and no effects.
    #[must_use]
    pub fn none() -> Self {
        Self {
            state: None,
            effects: SmallVec::new(),
        }
    }

    /// A new state without effects.
    #[must_use]
    pub fn state(state: S) -> Self {
        Self {
            state: Some(state),
            effects: SmallVec::new(),
        }
    }

    /// A new state together with effects.
    #[must_use]
    pub fn next(state: S, effects: impl IntoIterator<Item = E>) -> Self {
        Self {
            state: Some(state),
            effects: effects.into_iter().collect(),
        }
    }

    /// A single effect, leaving state unchanged.
    #[must_use]
    pub fn effect(effect: E) -> Self {
        let mut effects = SmallVec::new();
        effects.push(effect);
        Self {
            state: None,
            effects,
        }
    }

    /// Several effects, leaving state unchanged.
    #[must_use]
    pub fn effects(effects: impl IntoIterator<Item = E>) -> Self {
        Self {
            state: None,
            effects: effects.into_iter().collect(),
        }
    }

    /// Append one more effect.
    #[must_use]
    pub fn with_effect(mut self, effect: E) -> Self {
        self.effects.push(effect);
        self
    }

    /// Whether this step carries a new state
    #[must_use]
    pub const fn has_state(&self) -> bool {
        self.state.is_some()
    }

    /// Whether this step requests any effects
    #[must_use]
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    /// Split into `(state, effects)`.
    #[must_use]
    pub fn into_parts(self) -> (Option<S>, Effects<E>) {
        (self.state, self.effects)
    }
}

impl<S, E> Default for Next<S, E> {
    fn default() -> Self {
        Self::none()
    }
}

impl<S, E> From<S> for Next<S, E> {
    fn from(state: S) -> Self {
        Self::state(state)
    }
}
