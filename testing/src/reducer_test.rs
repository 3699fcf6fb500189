//! Ergonomic testing utilities for reducers
//!
//! Given-When-Then syntax over a single action or a whole sequence of them.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use storefront_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;

type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// With several `when_action` calls the actions are reduced in order and
/// effect assertions see the effects of the last one.
///
/// # Example
///
/// ```ignore
/// use storefront_testing::{assertions, MockCatalog, ReducerTest};
///
/// ReducerTest::new(UserReducer::new())
///     .with_env(UserEnvironment::new(Arc::new(MockCatalog::new())))
///     .given_state(UserState::default())
///     .when_action(UserAction::SetCartProducts(CartItem::new(product)))
///     .when_action(UserAction::AddToCart(1))
///     .then_state(|state| {
///         assert_eq!(state.cart_products.len(), 1);
///         assert_eq!(state.cart_count, 1);
///     })
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    actions: Vec<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Queue an action to reduce (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Queue several actions to reduce in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, actions, or environment are not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        assert!(
            !self.actions.is_empty(),
            "At least one action must be set with when_action()"
        );

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let mut effects = smallvec::SmallVec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env);
        }

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use std::time::Duration;
    use storefront_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
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
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that effects contain a Delay of `expected` whose action matches
    ///
    /// # Panics
    ///
    /// Panics if no such Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A, F>(effects: &[Effect<A>], expected: Duration, matches: F)
    where
        F: Fn(&A) -> bool,
    {
        assert!(
            effects.iter().any(|e| match e {
                Effect::Delay { duration, action } => *duration == expected && matches(action),
                _ => false,
            }),
            "Expected a Delay effect of {expected:?} with a matching action"
        );
    }
}

/// Run every Future effect to completion and collect the actions they produce
///
/// Parallel and Sequential effects are walked in order. Delay effects are
/// skipped since their action is already known to the caller.
pub async fn run_future_effects<A>(effects: impl IntoIterator<Item = Effect<A>>) -> Vec<A>
where
    A: Send + 'static,
{
    let mut actions = Vec::new();
    let mut queue: Vec<Effect<A>> = effects.into_iter().collect();
    queue.reverse();

    while let Some(effect) = queue.pop() {
        match effect {
            Effect::None | Effect::Delay { .. } => {},
            Effect::Parallel(children) | Effect::Sequential(children) => {
                queue.extend(children.into_iter().rev());
            },
            Effect::Future(fut) => {
                if let Some(action) = fut.await {
                    actions.push(action);
                }
            },
        }
    }

    actions
}

#[cfg(test)]
#[allow(clippy::panic)] // Tests can panic
mod tests {
    use super::*;
    use std::time::Duration;
    use storefront_core::effect::Effect;
    use storefront_core::reducer::Reducer;

    #[derive(Clone, Debug, PartialEq)]
    struct TallyState {
        count: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TallyAction {
        Increment,
        Decrement,
        IncrementLater,
        Report,
        Reported(i32),
    }

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = TallyState;
        type Action = TallyAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> smallvec::SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TallyAction::Increment => {
                    state.count += 1;
                    smallvec::smallvec![Effect::None]
                },
                TallyAction::Decrement => {
                    state.count -= 1;
                    smallvec::smallvec![Effect::None]
                },
                TallyAction::IncrementLater => smallvec::smallvec![Effect::Delay {
                    duration: Duration::from_secs(5),
                    action: Box::new(TallyAction::Increment),
                }],
                TallyAction::Report => {
                    let count = state.count;
                    smallvec::smallvec![Effect::Sequential(vec![
                        Effect::Future(Box::pin(async move { Some(TallyAction::Reported(count)) })),
                        Effect::Future(Box::pin(async { None })),
                        Effect::Future(Box::pin(async move {
                            Some(TallyAction::Reported(count + 1))
                        })),
                    ])]
                },
                TallyAction::Reported(_) => smallvec::SmallVec::new(),
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(TallyState { count: 0 })
            .when_action(TallyAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_reducer_test_action_sequence() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(TallyState { count: 5 })
            .when_actions([
                TallyAction::Decrement,
                TallyAction::Decrement,
                TallyAction::Increment,
            ])
            .then_state(|state| {
                assert_eq!(state.count, 4);
            })
            .run();
    }

    #[test]
    fn test_delay_assertion() {
        ReducerTest::new(TallyReducer)
            .with_env(())
            .given_state(TallyState { count: 0 })
            .when_action(TallyAction::IncrementLater)
            .then_state(|state| assert_eq!(state.count, 0))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_delay_effect(effects, Duration::from_secs(5), |a| {
                    *a == TallyAction::Increment
                });
            })
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<TallyAction>(&[Effect::None]);
        assertions::assert_no_effects::<TallyAction>(&[]);
    }

    #[tokio::test]
    async fn test_run_future_effects_collects_in_order() {
        let mut state = TallyState { count: 2 };
        let effects = TallyReducer.reduce(&mut state, TallyAction::Report, &());

        let actions = run_future_effects(effects).await;

        assert_eq!(
            actions,
            vec![TallyAction::Reported(2), TallyAction::Reported(3)]
        );
    }
}
