//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Run a child reducer on one field of a parent state,
//!   for the subset of parent actions that wrap a child action
//!
//! A root store is usually built by scoping each feature reducer into its
//! slot of the root state and combining the results:
//!
//! ```
//! use std::sync::Arc;
//! use storefront_core::composition::{combine_reducers, scope_reducer};
//! use storefront_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct BadgeState { count: usize }
//!
//! #[derive(Clone, Debug)]
//! enum BadgeAction { Set(usize) }
//!
//! #[derive(Clone)]
//! struct BadgeReducer;
//!
//! impl Reducer for BadgeReducer {
//!     type State = BadgeState;
//!     type Action = BadgeAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut BadgeState, action: BadgeAction, _env: &()) -> SmallVec<[Effect<BadgeAction>; 4]> {
//!         let BadgeAction::Set(n) = action;
//!         state.count = n;
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! #[derive(Clone, Debug, Default)]
//! struct RootState { badge: BadgeState }
//!
//! #[derive(Clone, Debug)]
//! enum RootAction { Badge(BadgeAction) }
//!
//! let badge = scope_reducer(
//!     BadgeReducer,
//!     |root: &mut RootState| &mut root.badge,
//!     |action: RootAction| match action { RootAction::Badge(a) => Some(a) },
//!     RootAction::Badge,
//!     |env: &()| env,
//! );
//! let root = combine_reducers(vec![Arc::new(badge)]);
//!
//! let mut state = RootState::default();
//! let _ = root.reduce(&mut state, RootAction::Badge(BadgeAction::Set(2)), &());
//! assert_eq!(state.badge.count, 2);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::sync::Arc;

/// A reducer that can be shared across threads and stored behind a trait object.
pub type SharedReducer<S, A, E> = Arc<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in order on a clone of the action, and all effects are
/// collected and concatenated.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<SharedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<SharedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E> {
    /// Number of reducers in this combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Returns `true` if no reducers were combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Clone for CombinedReducer<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            reducers: self.reducers.iter().map(Arc::clone).collect(),
        }
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|effect| !effect.is_none()));
        }

        all_effects
    }
}

/// Scopes a child reducer into a parent state, action and environment.
///
/// - `state`: borrows the child state out of the parent state
/// - `extract`: returns the child action if the parent action wraps one
/// - `embed`: wraps child actions produced by effects back into parent actions
/// - `env`: borrows the child environment out of the parent environment
///
/// Parent actions that do not wrap a child action are ignored without
/// touching state.
pub fn scope_reducer<S, A, E, R>(
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    extract: fn(A) -> Option<R::Action>,
    embed: fn(R::Action) -> A,
    env: fn(&E) -> &R::Environment,
) -> ScopedReducer<S, A, E, R>
where
    R: Reducer,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
        env,
    }
}

/// A reducer lifted into a parent domain.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, A, E, R>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    extract: fn(A) -> Option<R::Action>,
    embed: fn(R::Action) -> A,
    env: fn(&E) -> &R::Environment,
}

impl<S, A, E, R> Clone for ScopedReducer<S, A, E, R>
where
    R: Reducer + Clone,
{
    fn clone(&self) -> Self {
        Self {
            reducer: self.reducer.clone(),
            state: self.state,
            extract: self.extract,
            embed: self.embed,
            env: self.env,
        }
    }
}

impl<S, A, E, R> Reducer for ScopedReducer<S, A, E, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(child_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        self.reducer
            .reduce((self.state)(state), child_action, (self.env)(env))
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}
