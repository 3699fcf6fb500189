//! Root state, the composed reducer, and the [`ShopStore`] facade.
//!
//! The root combines the `user` slice and the `productsApi` cache. Each
//! child reducer sees only its own state, actions and environment.

use crate::config::ShopConfig;
use crate::error::ShopError;
use crate::products_api::{
    ProductsApiAction, ProductsApiEnvironment, ProductsApiReducer, ProductsApiState, QueryData,
    QueryKey, QueryStatus,
};
use crate::user::{UserAction, UserEnvironment, UserReducer, UserState};
use std::sync::Arc;
use std::time::Duration;
use storefront_catalog::{CatalogClient, Product, ProductCatalog, ProductId};
use storefront_core::composition::{combine_reducers, scope_reducer, CombinedReducer, SharedReducer};
use storefront_core::environment::{Clock, SystemClock};
use storefront_runtime::{EffectHandle, Store, StoreConfig, StoreError};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Root state
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShopState {
    /// Catalog fetch and cart
    pub user: UserState,
    /// Cached catalog queries
    pub products_api: ProductsApiState,
}

/// Root action
#[derive(Clone, Debug, PartialEq)]
pub enum ShopAction {
    /// Action for the `user` slice
    User(UserAction),
    /// Action for the `productsApi` cache
    ProductsApi(ProductsApiAction),
}

impl From<UserAction> for ShopAction {
    fn from(action: UserAction) -> Self {
        Self::User(action)
    }
}

impl From<ProductsApiAction> for ShopAction {
    fn from(action: ProductsApiAction) -> Self {
        Self::ProductsApi(action)
    }
}

/// Root environment
#[derive(Clone)]
pub struct ShopEnvironment {
    /// Dependencies of the `user` slice
    pub user: UserEnvironment,
    /// Dependencies of the `productsApi` cache
    pub products_api: ProductsApiEnvironment,
}

impl ShopEnvironment {
    /// Both slices read from `catalog`; the cache times eviction with `clock`
    #[must_use]
    pub fn new(catalog: Arc<dyn ProductCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user: UserEnvironment::new(Arc::clone(&catalog)),
            products_api: ProductsApiEnvironment::new(catalog, clock),
        }
    }

    /// Sets the grace period for unused query entries
    #[must_use]
    pub fn with_keep_unused(mut self, keep_unused: Duration) -> Self {
        self.products_api = self.products_api.with_keep_unused(keep_unused);
        self
    }
}

/// The composed root reducer
pub type ShopReducer = CombinedReducer<ShopState, ShopAction, ShopEnvironment>;

/// The store running [`ShopReducer`]
pub type ShopRuntime = Store<ShopState, ShopAction, ShopEnvironment, ShopReducer>;

fn user_state(state: &mut ShopState) -> &mut UserState {
    &mut state.user
}

fn user_action(action: ShopAction) -> Option<UserAction> {
    match action {
        ShopAction::User(action) => Some(action),
        ShopAction::ProductsApi(_) => None,
    }
}

fn user_env(env: &ShopEnvironment) -> &UserEnvironment {
    &env.user
}

fn products_api_state(state: &mut ShopState) -> &mut ProductsApiState {
    &mut state.products_api
}

fn products_api_action(action: ShopAction) -> Option<ProductsApiAction> {
    match action {
        ShopAction::ProductsApi(action) => Some(action),
        ShopAction::User(_) => None,
    }
}

fn products_api_env(env: &ShopEnvironment) -> &ProductsApiEnvironment {
    &env.products_api
}

/// Builds the root reducer from the two slice reducers
#[must_use]
pub fn shop_reducer() -> ShopReducer {
    let user: SharedReducer<ShopState, ShopAction, ShopEnvironment> = Arc::new(scope_reducer(
        UserReducer::new(),
        user_state,
        user_action,
        ShopAction::User,
        user_env,
    ));
    let products_api: SharedReducer<ShopState, ShopAction, ShopEnvironment> =
        Arc::new(scope_reducer(
            ProductsApiReducer::new(),
            products_api_state,
            products_api_action,
            ShopAction::ProductsApi,
            products_api_env,
        ));

    combine_reducers(vec![user, products_api])
}

/// Default time a query waits for its result
pub const DEFAULT_QUERY_WAIT: Duration = Duration::from_secs(30);

/// Storefront store with query helpers
///
/// ```ignore
/// let store = ShopStore::new(ShopEnvironment::new(catalog, Arc::new(SystemClock)));
///
/// store.send(UserAction::FetchProducts).await?.wait().await;
/// let backpack = store.get_product(ProductId::new(1)).await?;
/// store.send(UserAction::SetCartProducts(CartItem::new(backpack))).await?;
/// ```
#[derive(Clone)]
pub struct ShopStore {
    runtime: ShopRuntime,
    query_wait: Duration,
}

impl ShopStore {
    /// Creates a store with empty state
    #[must_use]
    pub fn new(environment: ShopEnvironment) -> Self {
        Self::with_config(environment, StoreConfig::default())
    }

    /// Creates a store with a custom runtime configuration
    #[must_use]
    pub fn with_config(environment: ShopEnvironment, config: StoreConfig) -> Self {
        Self {
            runtime: Store::with_config(ShopState::default(), shop_reducer(), environment, config),
            query_wait: DEFAULT_QUERY_WAIT,
        }
    }

    /// Creates a store talking to the configured HTTP catalog
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Catalog`] if the catalog client cannot be built.
    pub fn from_config(config: &ShopConfig) -> Result<Self, ShopError> {
        let catalog = CatalogClient::with_timeout(&config.catalog.base_url, config.catalog_timeout())?;
        let environment = ShopEnvironment::new(Arc::new(catalog), Arc::new(SystemClock))
            .with_keep_unused(config.keep_unused());
        let store_config = StoreConfig::default()
            .with_broadcast_capacity(config.store.broadcast_capacity)
            .with_shutdown_timeout(config.shutdown_timeout());

        tracing::info!(base_url = %config.catalog.base_url, "Shop store created");

        Ok(Self::with_config(environment, store_config).with_query_wait(config.query_wait()))
    }

    /// Sets how long `get_all_products` / `get_product` wait for a result
    #[must_use]
    pub const fn with_query_wait(mut self, query_wait: Duration) -> Self {
        self.query_wait = query_wait;
        self
    }

    /// The underlying store
    #[must_use]
    pub const fn runtime(&self) -> &ShopRuntime {
        &self.runtime
    }

    /// Send a `user` or `productsApi` action
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if the store is shutting down.
    pub async fn send(&self, action: impl Into<ShopAction>) -> Result<EffectHandle, ShopError> {
        Ok(self.runtime.send(action.into()).await?)
    }

    /// Start a catalog fetch into the `user` slice
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if the store is shutting down.
    pub async fn fetch_products(&self) -> Result<EffectHandle, ShopError> {
        self.send(UserAction::FetchProducts).await
    }

    /// Read current state via a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&ShopState) -> T,
    {
        self.runtime.state(f).await
    }

    /// Subscribe to actions produced by effects
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<ShopAction> {
        self.runtime.subscribe_actions()
    }

    /// All products, from cache or a shared request
    ///
    /// # Errors
    ///
    /// [`ShopError::QueryFailed`] if the request was rejected, or
    /// [`ShopError::Store`] on timeout or shutdown.
    pub async fn get_all_products(&self) -> Result<Vec<Product>, ShopError> {
        match self.query(QueryKey::AllProducts).await? {
            QueryData::Products(products) => Ok(products),
            QueryData::Product(_) => Err(ShopError::UnexpectedData(QueryKey::AllProducts)),
        }
    }

    /// One product, from cache or a shared request
    ///
    /// # Errors
    ///
    /// [`ShopError::QueryFailed`] if the request was rejected (unknown ids
    /// included), or [`ShopError::Store`] on timeout or shutdown.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ShopError> {
        let query = QueryKey::Product(id);
        match self.query(query).await? {
            QueryData::Product(product) => Ok(product),
            QueryData::Products(_) => Err(ShopError::UnexpectedData(query)),
        }
    }

    /// Force a new request for `query`, returning its data
    ///
    /// # Errors
    ///
    /// Same as [`get_all_products`](Self::get_all_products).
    pub async fn refetch(&self, query: QueryKey) -> Result<QueryData, ShopError> {
        let mut rx = self.runtime.subscribe_actions();
        self.send(ProductsApiAction::Subscribe(query)).await?;
        let outcome = match self.send(ProductsApiAction::Refetch(query)).await {
            Ok(_) => self.settlement(&mut rx, query).await,
            Err(error) => Err(error),
        };
        self.release(query, outcome).await
    }

    /// Stop accepting actions and wait for running effects, up to the
    /// store's configured shutdown timeout
    ///
    /// Pending cache evictions are cancelled rather than waited for.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if effects are still running at the timeout.
    pub async fn shutdown(&self) -> Result<(), ShopError> {
        Ok(self.runtime.shutdown_with_default_timeout().await?)
    }

    /// Like [`shutdown`](Self::shutdown) with an explicit timeout
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::Store`] if effects are still running at `timeout`.
    pub async fn shutdown_with_timeout(&self, timeout: Duration) -> Result<(), ShopError> {
        Ok(self.runtime.shutdown(timeout).await?)
    }

    // Subscribing to the broadcast before sending `Subscribe` means a
    // settlement that races the state read below is still received.
    async fn query(&self, query: QueryKey) -> Result<QueryData, ShopError> {
        let mut rx = self.runtime.subscribe_actions();
        self.send(ProductsApiAction::Subscribe(query)).await?;

        let outcome = match self.settled(query).await {
            Some(outcome) => outcome,
            None => self.settlement(&mut rx, query).await,
        };

        self.release(query, outcome).await
    }

    /// Outcome already recorded in the cache, `None` while unsettled
    async fn settled(&self, query: QueryKey) -> Option<Result<QueryData, ShopError>> {
        self.state(|s| {
            let entry = s.products_api.get(query)?;
            match (entry.status, &entry.data) {
                (QueryStatus::Fulfilled, Some(data)) => Some(Ok(data.clone())),
                (QueryStatus::Rejected, _) => Some(Err(ShopError::QueryFailed {
                    query,
                    message: entry.error.clone().unwrap_or_default(),
                })),
                _ => None,
            }
        })
        .await
    }

    // A lagged receiver may have skipped the settlement, so after a lag the
    // cache is consulted instead of waiting out `query_wait`.
    async fn settlement(
        &self,
        rx: &mut broadcast::Receiver<ShopAction>,
        query: QueryKey,
    ) -> Result<QueryData, ShopError> {
        let deadline = tokio::time::Instant::now() + self.query_wait;

        loop {
            let received = tokio::time::timeout_at(deadline, rx.recv())
                .await
                .map_err(|_| StoreError::Timeout)?;

            match received {
                Ok(ShopAction::ProductsApi(ProductsApiAction::QueryFulfilled {
                    query: settled,
                    data,
                    ..
                })) if settled == query => return Ok(data),
                Ok(ShopAction::ProductsApi(ProductsApiAction::QueryRejected {
                    query: settled,
                    error,
                })) if settled == query => {
                    return Err(ShopError::QueryFailed {
                        query,
                        message: error,
                    });
                },
                Ok(_) => {},
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%query, skipped, "Query observer lagged, reading cache");
                    if let Some(outcome) = self.settled(query).await {
                        return outcome;
                    }
                },
                Err(RecvError::Closed) => return Err(StoreError::ChannelClosed.into()),
            }
        }
    }

    async fn release(
        &self,
        query: QueryKey,
        outcome: Result<QueryData, ShopError>,
    ) -> Result<QueryData, ShopError> {
        if let Err(error) = self.send(ProductsApiAction::Unsubscribe(query)).await {
            tracing::warn!(%query, %error, "Failed to release query subscription");
        }
        outcome
    }
}
