//! # Counter Example
//!
//! A counter with a floor at zero, demonstrating foldstore.
//!
//! This example showcases:
//! - Optional previous state (`None` starts from `Model::default()`)
//! - Effect-only steps: decrementing at zero changes nothing and asks for a flash
//! - A timer-driven effect handler feeding actions back into the store
//! - Mapping a view's `UserAction` onto the store's `Action`
//!
//! ## Example
//!
//! ```no_run
//! use counter::{build_store, UserAction};
//! use foldstore_runtime::StoreConfig;
//!
//! # async fn example() -> Result<(), foldstore_runtime::StoreError> {
//! let store = build_store(StoreConfig::new().with_name("counter"))?;
//! let buttons = store.dispatcher().map_action(counter::Action::User);
//!
//! buttons.dispatch(UserAction::Decrement)?;
//! # Ok(())
//! # }
//! ```

use foldstore_core::{ActionStream, EffectHandler, Next, Reducer, Scheduler};
use foldstore_runtime::{Store, StoreConfig, StoreError};
use futures::StreamExt;
use std::time::Duration;

/// Counter state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Model {
    /// Current count, never below zero
    pub counter: u64,
    /// Whether the counter label is highlighted
    pub flash: bool,
}

impl Model {
    /// Text shown on the counter label
    #[must_use]
    pub fn label(&self) -> String {
        self.counter.to_string()
    }
}

/// Actions a view can send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    /// The plus button
    Increment,
    /// The minus button
    Decrement,
}

/// Counter actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Something the user did
    User(UserAction),
    /// Turn the highlight on or off
    SetFlash(bool),
}

/// Counter effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Blink the counter label
    Flash,
}

/// Counter reducer
///
/// Decrementing at zero leaves the state alone and returns [`Effect::Flash`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelReducer;

impl Reducer for ModelReducer {
    type State = Model;
    type Action = Action;
    type Effect = Effect;

    fn reduce(&self, state: Option<&Model>, action: Action) -> Next<Model, Effect> {
        let mut model = state.copied().unwrap_or_default();

        match action {
            Action::User(UserAction::Increment) => model.counter += 1,
            Action::User(UserAction::Decrement) if model.counter == 0 => {
                return Next::effect(Effect::Flash);
            },
            Action::User(UserAction::Decrement) => model.counter -= 1,
            Action::SetFlash(flash) => model.flash = flash,
        }

        Next::state(model)
    }
}

/// Interprets [`Effect::Flash`] as alternating `SetFlash(true)` / `SetFlash(false)`
/// actions, one every `period`.
#[derive(Debug, Clone, Copy)]
pub struct FlashHandler {
    /// Time between toggles
    pub period: Duration,
    /// Number of `SetFlash` actions per flash
    pub toggles: usize,
}

impl Default for FlashHandler {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(70),
            toggles: 4,
        }
    }
}

impl EffectHandler for FlashHandler {
    type Effect = Effect;
    type Action = Action;

    fn handle(&self, effect: Effect, scheduler: &Scheduler) -> ActionStream<Action> {
        match effect {
            Effect::Flash => scheduler
                .interval(self.period)
                .take(self.toggles)
                .map(|tick| Ok(Action::SetFlash(tick % 2 == 0)))
                .boxed(),
        }
    }
}

/// Build a counter store starting from `Model::default()`.
///
/// # Errors
///
/// Returns [`StoreError::NoRuntime`] when no scheduler is configured and no
/// tokio runtime is running.
pub fn build_store(config: StoreConfig) -> Result<Store<Model, Action>, StoreError> {
    Store::build(Some(Model::default()), ModelReducer, FlashHandler::default(), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foldstore_testing::{assertions, ReducerTest};

    #[test]
    fn test_increment() {
        ReducerTest::new(ModelReducer)
            .given_state(Model::default())
            .when_action(Action::User(UserAction::Increment))
            .then_state(|model| assert_eq!(model.map(|m| m.counter), Some(1)))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_decrement() {
        ReducerTest::new(ModelReducer)
            .given_state(Model { counter: 5, flash: false })
            .when_action(Action::User(UserAction::Decrement))
            .then_state(|model| assert_eq!(model.map(|m| m.counter), Some(4)))
            .run();
    }

    #[test]
    fn test_decrement_at_zero_flashes() {
        let decrement = Action::User(UserAction::Decrement);
        let next = ModelReducer.reduce(Some(&Model::default()), decrement);

        assert_eq!(next.state, None);
        assert_eq!(next.effects.as_slice(), &[Effect::Flash]);
    }

    #[test]
    fn test_no_state_starts_from_default() {
        ReducerTest::new(ModelReducer)
            .given_no_state()
            .when_action(Action::SetFlash(true))
            .then_state(|model| assert_eq!(model, Some(&Model { counter: 0, flash: true })))
            .run();
    }

    #[test]
    fn test_label() {
        assert_eq!(Model { counter: 12, flash: true }.label(), "12");
    }
}
