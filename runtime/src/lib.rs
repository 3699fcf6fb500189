//! # Storefront Runtime
//!
//! Runtime implementation for the storefront state layer.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that owns state and executes effects
//! - **Effect Executor**: Runs effect descriptions and feeds actions back to the reducer
//! - **Action Broadcast**: Lets observers (query hooks, UI bindings) see every
//!   action produced by an effect
//!
//! ## Example
//!
//! ```ignore
//! use storefront_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! let mut handle = store.send(Action::FetchProducts).await?;
//! handle.wait().await;
//!
//! // Read state
//! let loading = store.state(|s| s.loading).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use storefront_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{RwLock, watch};

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for terminal action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use storefront_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of effect-produced actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects started by
/// one action to finish. An effect counts as finished once the action it
/// produced (if any) has itself been reduced.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(UserAction::FetchProducts).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// // The catalog request has settled and its outcome is in state
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a new effect handle and the tracking context that feeds it
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    ///
    /// Useful for initialization in loops where you need a `last_handle`.
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracking context is gone, nothing left to wait for
                break;
            }
        }
    }

    /// Wait for all effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: Effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    /// Increment the effect counter (effect started)
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement the effect counter (effect completed)
    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            // Counter reached zero, notify waiters
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Ensures the effect counter is always decremented, even if the effect panics.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, DecrementGuard, Duration, Effect,
        EffectHandle, EffectTracking, Ordering, Reducer, RwLock, StoreConfig, StoreError, watch,
    };
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; reducers run one at a time)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        /// Flips to `true` once shutdown starts; pending delays stop waiting on it.
        shutdown_signal: Arc<watch::Sender<bool>>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here once it has
        /// been reduced, so observers that wake on it see the updated state.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default()`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// # Example
        ///
        /// ```ignore
        /// let config = StoreConfig::default().with_broadcast_capacity(128);
        /// let store = Store::with_config(ShopState::default(), shop_reducer(), env, config);
        /// ```
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                shutdown_signal: Arc::new(watch::channel(false).0),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// The configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Shut down with the configured [`StoreConfig::default_shutdown_timeout`]
        ///
        /// # Errors
        ///
        /// Same as [`shutdown`](Self::shutdown).
        pub async fn shutdown_with_default_timeout(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Cancels pending `Delay` effects; their actions are never sent
        /// 3. Waits for the remaining effects to complete (with timeout)
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);
            self.shutdown_signal.send_replace(true);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(20);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tracing::debug!(
                    pending_effects = pending,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Waiting for effects to complete"
                );

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Starts the returned effects on spawned tasks
        /// 4. Effects may produce more actions (feedback loop)
        ///
        /// `send()` returns after starting effect execution, not completion.
        /// Use the returned [`EffectHandle`] to wait for completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic will propagate. Reducers record
        /// failures in state instead of panicking.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());

                // Note: Precision loss acceptable for metrics (effect counts < 2^52)
                #[allow(clippy::cast_precision_loss)]
                metrics::histogram!("store.effects.count").record(effects.len() as f64);

                effects
            };

            for effect in effects {
                self.execute_effect(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast BEFORE sending, then returns the
        /// first effect-produced action matching `predicate`.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        ///
        /// # Example
        ///
        /// ```ignore
        /// let outcome = store.send_and_wait_for(
        ///     UserAction::FetchProducts,
        ///     |a| matches!(a, UserAction::ProductsFetched { .. } | UserAction::ProductsFetchFailed { .. }),
        ///     Duration::from_secs(10),
        /// ).await?;
        /// ```
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            wait_for_action(&mut rx, predicate, timeout).await
        }

        /// Subscribe to all actions produced by effects in this store
        ///
        /// Only actions produced by effects are broadcast (not actions passed
        /// to `send`). A receiver that falls behind skips old actions.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let line_count = store.state(|s| s.user.cart_products.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Register a spawned effect with both the per-action tracking and
        /// the store-wide shutdown counter.
        fn begin_effect(&self, tracking: &EffectTracking) -> (DecrementGuard, AtomicCounterGuard) {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            (
                DecrementGuard(tracking.clone()),
                AtomicCounterGuard(Arc::clone(&self.pending_effects)),
            )
        }

        /// Execute an effect with tracking
        ///
        /// - `None`: No-op
        /// - `Future`: Runs the async computation, sends resulting action if `Some`
        /// - `Delay`: Waits for duration, then sends action
        /// - `Parallel`: Executes effects concurrently
        /// - `Sequential`: Executes effects in order, waiting for each to complete
        ///
        /// Effect failures are the effect's own business: a catalog request
        /// that fails produces a failure action, it does not error here.
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                    let guards = self.begin_effect(&tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guards = guards;

                        if let Some(action) = fut.await {
                            if let Err(error) = store.send(action.clone()).await {
                                tracing::warn!(%error, "Dropped action produced by effect");
                            }
                            let _ = store.action_broadcast.send(action);
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);

                    let guards = self.begin_effect(&tracking);
                    let store = self.clone();
                    let mut stopping = self.shutdown_signal.subscribe();

                    tokio::spawn(async move {
                        let _guards = guards;

                        if *stopping.borrow() {
                            return;
                        }
                        tokio::select! {
                            () = tokio::time::sleep(duration) => {},
                            _ = stopping.changed() => {
                                tracing::trace!("Delay cancelled by shutdown");
                                return;
                            },
                        }

                        if let Err(error) = store.send((*action).clone()).await {
                            tracing::warn!(%error, "Dropped delayed action");
                        }
                        let _ = store.action_broadcast.send(*action);
                    });
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    tracing::trace!("Executing Effect::Sequential with {} effects", effect_count);
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);

                    let guards = self.begin_effect(&tracking);
                    let store = self.clone();

                    tokio::spawn(async move {
                        let _guards = guards;

                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!(
                                "Executing sequential effect {} of {}",
                                idx + 1,
                                effect_count
                            );

                            let (mut sub_handle, sub_tracking) = EffectHandle::new();
                            store.execute_effect(effect, sub_tracking);
                            sub_handle.wait().await;
                        }
                    });
                },
            }
        }
    }

    /// Wait on a broadcast receiver for the first action matching `predicate`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Timeout`] or [`StoreError::ChannelClosed`].
    pub async fn wait_for_action<A, F>(
        rx: &mut broadcast::Receiver<A>,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        A: Clone,
        F: Fn(&A) -> bool,
    {
        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // If the terminal action was dropped, the timeout catches it
                        tracing::warn!(skipped, "Action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                shutdown_signal: Arc::clone(&self.shutdown_signal),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::{Store, wait_for_action};

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;
    use storefront_core::{smallvec, SmallVec};

    #[derive(Clone, Debug, Default)]
    struct BadgeState {
        count: usize,
        loaded: Vec<usize>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum BadgeAction {
        Set(usize),
        Load(usize),
        Loaded(usize),
        LoadInOrder(Vec<usize>),
        LoadLater(usize),
        LoadMuchLater(usize),
    }

    #[derive(Clone)]
    struct BadgeReducer;

    impl Reducer for BadgeReducer {
        type State = BadgeState;
        type Action = BadgeAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                BadgeAction::Set(n) => {
                    state.count = n;
                    smallvec![Effect::None]
                },
                BadgeAction::Load(n) => smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some(BadgeAction::Loaded(n))
                }))],
                BadgeAction::Loaded(n) => {
                    state.loaded.push(n);
                    smallvec![Effect::None]
                },
                BadgeAction::LoadInOrder(values) => smallvec![Effect::chain(
                    values
                        .into_iter()
                        .map(|n| Effect::Future(Box::pin(async move {
                            // later values finish sooner if run concurrently
                            tokio::time::sleep(Duration::from_millis(20 / (n as u64 + 1))).await;
                            Some(BadgeAction::Loaded(n))
                        })))
                        .collect()
                )],
                BadgeAction::LoadLater(n) => smallvec![Effect::Delay {
                    duration: Duration::from_millis(10),
                    action: Box::new(BadgeAction::Loaded(n)),
                }],
                BadgeAction::LoadMuchLater(n) => smallvec![Effect::Delay {
                    duration: Duration::from_secs(60),
                    action: Box::new(BadgeAction::Loaded(n)),
                }],
            }
        }
    }

    #[tokio::test]
    async fn send_runs_reducer_synchronously() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        let handle = store.send(BadgeAction::Set(4)).await.unwrap();

        assert_eq!(handle.pending(), 0);
        assert_eq!(store.state(|s| s.count).await, 4);
    }

    #[tokio::test]
    async fn handle_waits_for_feedback_action() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        let mut handle = store.send(BadgeAction::Load(9)).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![9]);
    }

    #[tokio::test]
    async fn sequential_effects_keep_order() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        let mut handle = store
            .send(BadgeAction::LoadInOrder(vec![0, 1, 2]))
            .await
            .unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn delay_effect_feeds_back_after_duration() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        let mut handle = store.send(BadgeAction::LoadLater(3)).await.unwrap();
        assert!(store.state(|s| s.loaded.is_empty()).await);

        handle
            .wait_with_timeout(Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![3]);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_matching_action() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        let action = store
            .send_and_wait_for(
                BadgeAction::Load(1),
                |a| matches!(a, BadgeAction::Loaded(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(action, BadgeAction::Loaded(1));
    }

    #[tokio::test]
    async fn observers_see_reduced_state() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());
        let mut rx = store.subscribe_actions();

        store.send(BadgeAction::Load(5)).await.unwrap();
        let action = wait_for_action(
            &mut rx,
            |a| matches!(a, BadgeAction::Loaded(_)),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        assert_eq!(action, BadgeAction::Loaded(5));
        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![5]);
    }

    #[tokio::test]
    async fn send_and_wait_for_times_out_without_effects() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        let result = store
            .send_and_wait_for(
                BadgeAction::Set(1),
                |a| matches!(a, BadgeAction::Loaded(_)),
                Duration::from_millis(30),
            )
            .await;

        assert!(matches!(result, Err(StoreError::Timeout)));
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        let result = store.send(BadgeAction::Set(1)).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    }

    #[tokio::test]
    async fn shutdown_waits_for_running_effects() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        let _ = store.send(BadgeAction::Load(2)).await.unwrap();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn shutdown_cancels_pending_delays() {
        let store = Store::new(BadgeState::default(), BadgeReducer, ());

        let _ = store.send(BadgeAction::LoadMuchLater(7)).await.unwrap();
        assert_eq!(store.pending_effects(), 1);

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.pending_effects(), 0);
        assert!(store.state(|s| s.loaded.is_empty()).await);
    }

    #[tokio::test]
    async fn default_shutdown_timeout_comes_from_config() {
        let config = StoreConfig::default().with_shutdown_timeout(Duration::from_millis(30));
        let store = Store::with_config(BadgeState::default(), BadgeReducer, (), config);

        let _ = store.send(BadgeAction::LoadInOrder(vec![0; 20])).await.unwrap();
        let result = store.shutdown_with_default_timeout().await;

        assert!(matches!(result, Err(StoreError::ShutdownTimeout(_))));
    }

    #[test]
    fn completed_handle_has_nothing_pending() {
        let handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
    }
}
