//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use foldstore_core::Reducer;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(Option<&S>)>;

/// Type alias for effect assertion functions
type EffectAssertion<E> = Box<dyn FnOnce(&[E])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// The state seen by `then_state` is the state the store would hold after
/// the step: the returned state, or the given one if the step returned none.
///
/// # Example
///
/// ```ignore
/// use foldstore_testing::{assertions, ReducerTest};
///
/// ReducerTest::new(ModelReducer)
///     .given_state(Model { counter: 0, flash: false })
///     .when_action(Action::User(UserAction::Decrement))
///     .then_state(|state| {
///         assert_eq!(state.map(|model| model.counter), Some(0));
///     })
///     .then_effects(|effects| {
///         assertions::assert_effects_count(effects, 1);
///     })
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    initial_state: Option<R::State>,
    action: Option<R::Action>,
    state_assertions: Vec<StateAssertion<R::State>>,
    effect_assertions: Vec<EffectAssertion<R::Effect>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
{
    /// Create a new reducer test with the given reducer
    ///
    /// The test starts with no state until [`given_state`](Self::given_state) is called.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Start from no state at all (Given)
    #[must_use]
    pub fn given_no_state(mut self) -> Self {
        self.initial_state = None;
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(Option<&R::State>) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[R::Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if the action is not set, or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let action = self.action.expect("Action must be set with when_action()");

        // Execute reducer
        let next = self.reducer.reduce(self.initial_state.as_ref(), action);
        let (state, effects) = next.into_parts();
        let state = state.or(self.initial_state);

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(state.as_ref());
        }

        // Run effect assertions
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use std::fmt::Debug;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<E: Debug>(effects: &[E]) {
        assert!(
            effects.is_empty(),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<E>(effects: &[E], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain `expected`
    ///
    /// # Panics
    ///
    /// Panics if no effect equals `expected`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_effect<E: Debug + PartialEq>(effects: &[E], expected: &E) {
        assert!(
            effects.contains(expected),
            "Expected effect {expected:?}, but found {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foldstore_core::Next;

    #[derive(Clone, Debug, PartialEq)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Decrement,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestEffect {
        Beep,
    }

    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Effect = TestEffect;

        fn reduce(
            &self,
            state: Option<&TestState>,
            action: TestAction,
        ) -> Next<TestState, TestEffect> {
            let count = state.map_or(0, |state| state.count);
            match action {
                TestAction::Increment => Next::state(TestState { count: count + 1 }),
                TestAction::Decrement if count == 0 => Next::effect(TestEffect::Beep),
                TestAction::Decrement => Next::state(TestState { count: count - 1 }),
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state, Some(&TestState { count: 1 }));
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_from_no_state() {
        ReducerTest::new(TestReducer)
            .given_no_state()
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.map(|s| s.count), Some(1));
            })
            .run();
    }

    #[test]
    fn test_effect_only_step_keeps_given_state() {
        ReducerTest::new(TestReducer)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Decrement)
            .then_state(|state| {
                assert_eq!(state, Some(&TestState { count: 0 }));
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_effect(effects, &TestEffect::Beep);
            })
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<TestEffect>(&[]);
    }

    #[test]
    #[should_panic(expected = "Expected no effects")]
    fn test_assert_no_effects_rejects_effects() {
        assertions::assert_no_effects(&[TestEffect::Beep]);
    }

    #[test]
    fn test_assertions_effects_count() {
        assertions::assert_effects_count(&[TestEffect::Beep], 1);
        assertions::assert_effects_count::<TestEffect>(&[], 0);
    }
}
