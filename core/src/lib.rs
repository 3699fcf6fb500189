//! # Storefront Core
//!
//! Core traits and types for the storefront state layer.
//!
//! Application state is owned by a single structure and only ever changed by
//! a reducer: a pure function `(State, Action, Environment) → (State, Effects)`.
//! Side effects such as HTTP requests are returned as descriptions and run by
//! the Store in `storefront-runtime`, which feeds their results back in as
//! new actions.
//!
//! ## Core Concepts
//!
//! - **State**: Owned data for a feature (a cart, a query cache)
//! - **Action**: A tagged union of everything that can happen to that state
//! - **Reducer**: The only place state is mutated
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies (catalog client, clock)
//!
//! ## Example
//!
//! ```
//! use storefront_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct BadgeState {
//!     count: usize,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum BadgeAction {
//!     Set(usize),
//! }
//!
//! struct BadgeReducer;
//!
//! impl Reducer for BadgeReducer {
//!     type State = BadgeState;
//!     type Action = BadgeAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut BadgeState,
//!         action: BadgeAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<BadgeAction>; 4]> {
//!         match action {
//!             BadgeAction::Set(n) => state.count = n,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = BadgeState::default();
//! let _ = BadgeReducer.reduce(&mut state, BadgeAction::Set(3), &());
//! assert_eq!(state.count, 3);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer composition (`combine_reducers`, `scope_reducer`)
pub mod composition;

/// Declarative macros for building effects
pub mod effect_macros;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They contain all state transitions and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for CartReducer {
    ///     type State = CartState;
    ///     type Action = CartAction;
    ///     type Environment = CartEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut CartState,
    ///         action: CartAction,
    ///         env: &CartEnvironment,
    ///     ) -> SmallVec<[Effect<CartAction>; 4]> {
    ///         match action {
    ///             CartAction::Clear => {
    ///                 state.lines.clear();
    ///                 smallvec![Effect::None]
    ///             }
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime. Most actions produce at most a
        /// handful, so the collection is stack-allocated up to four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and can be merged, chained and mapped.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    /// Shared action transformer used while lifting nested effects.
    type ActionMapper<A, B> = Arc<dyn Fn(A) -> B + Send + Sync>;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (cache eviction, debouncing)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns `true` for `Effect::None`
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }

    impl<Action> Effect<Action>
    where
        Action: Send + 'static,
    {
        /// Transform every action this effect can produce
        ///
        /// Used to lift the effects of a child reducer into the action type of
        /// its parent, e.g. `effect.map(AppAction::Cart)`.
        ///
        /// # Example
        ///
        /// ```
        /// use storefront_core::effect::Effect;
        /// use std::time::Duration;
        ///
        /// #[derive(Debug, PartialEq)]
        /// enum Child { Tick }
        /// #[derive(Debug, PartialEq)]
        /// enum Parent { Child(Child) }
        ///
        /// let effect = Effect::Delay {
        ///     duration: Duration::from_secs(1),
        ///     action: Box::new(Child::Tick),
        /// };
        ///
        /// match effect.map(Parent::Child) {
        ///     Effect::Delay { action, .. } => assert_eq!(*action, Parent::Child(Child::Tick)),
        ///     _ => unreachable!(),
        /// }
        /// ```
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            B: Send + 'static,
            F: Fn(Action) -> B + Send + Sync + 'static,
        {
            self.map_with(Arc::new(f))
        }

        fn map_with<B>(self, f: ActionMapper<Action, B>) -> Effect<B>
        where
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Parallel(effects) => Effect::Parallel(
                    effects
                        .into_iter()
                        .map(|effect| effect.map_with(Arc::clone(&f)))
                        .collect(),
                ),
                Effect::Sequential(effects) => Effect::Sequential(
                    effects
                        .into_iter()
                        .map(|effect| effect.map_with(Arc::clone(&f)))
                        .collect(),
                ),
                Effect::Delay { duration, action } => Effect::Delay {
                    duration,
                    action: Box::new(f(*action)),
                },
                Effect::Future(fut) => {
                    Effect::Future(Box::pin(async move { fut.await.map(|action| f(action)) }))
                },
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter. Domain crates define their own traits
/// (e.g. the product catalog) next to the code that needs them.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)] // Tests can panic
mod tests {
    use super::effect::Effect;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Inner {
        Loaded(u32),
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Outer {
        Inner(Inner),
    }

    #[test]
    fn map_preserves_structure() {
        let effect = Effect::merge(vec![
            Effect::None,
            Effect::chain(vec![Effect::Delay {
                duration: Duration::from_millis(5),
                action: Box::new(Inner::Loaded(1)),
            }]),
        ]);

        let mapped = effect.map(Outer::Inner);

        let Effect::Parallel(children) = mapped else {
            panic!("expected Parallel");
        };
        assert_eq!(children.len(), 2);
        assert!(children[0].is_none());
        let Effect::Sequential(inner) = &children[1] else {
            panic!("expected Sequential");
        };
        match &inner[0] {
            Effect::Delay { duration, action } => {
                assert_eq!(*duration, Duration::from_millis(5));
                assert_eq!(**action, Outer::Inner(Inner::Loaded(1)));
            },
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[tokio::test]
    async fn map_applies_to_future_output() {
        let effect: Effect<Inner> = Effect::Future(Box::pin(async { Some(Inner::Loaded(7)) }));

        let Effect::Future(fut) = effect.map(Outer::Inner) else {
            panic!("expected Future");
        };
        assert_eq!(fut.await, Some(Outer::Inner(Inner::Loaded(7))));
    }

    #[test]
    fn map_keeps_silent_futures_silent() {
        let effect: Effect<Inner> = Effect::Future(Box::pin(async { None }));

        let Effect::Future(fut) = effect.map(Outer::Inner) else {
            panic!("expected Future");
        };
        assert_eq!(tokio_test::block_on(fut), None);
    }
}
