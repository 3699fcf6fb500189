//! Cached read-only catalog queries (`getAllProducts`, `getProduct(id)`).
//!
//! Each query argument gets one cache entry. An entry is fetched when its
//! first subscriber arrives and shared by every later subscriber, so
//! concurrent readers never issue duplicate requests. Fulfilled data is
//! served from the entry until the last subscriber leaves and the entry has
//! been unused for `keep_unused`, at which point `CollectUnused` evicts it.
//! `Refetch` forces a new request regardless of cached data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use storefront_catalog::{Product, ProductCatalog, ProductId};
use storefront_core::{
    async_effect, delay, effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec,
};

/// How long an entry with no subscribers is kept before eviction
pub const DEFAULT_KEEP_UNUSED: Duration = Duration::from_secs(60);

/// Endpoint plus argument identifying one cache entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKey {
    /// `GET products`
    AllProducts,
    /// `GET products/{id}`
    Product(ProductId),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllProducts => write!(f, "getAllProducts"),
            Self::Product(id) => write!(f, "getProduct({id})"),
        }
    }
}

/// Request status of a cache entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    /// Never requested
    #[default]
    Uninitialized,
    /// A request is in flight
    Pending,
    /// The last request succeeded
    Fulfilled,
    /// The last request failed
    Rejected,
}

/// Payload of a fulfilled query
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum QueryData {
    /// Result of [`QueryKey::AllProducts`]
    Products(Vec<Product>),
    /// Result of [`QueryKey::Product`]
    Product(Product),
}

/// One cache entry
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryEntry {
    /// Request status
    pub status: QueryStatus,
    /// Last fulfilled data, kept across a failed refetch
    pub data: Option<QueryData>,
    /// Failure text of the last request, if it was rejected
    pub error: Option<String>,
    /// Number of active subscribers
    pub subscribers: usize,
    /// When `data` was fetched
    pub fulfilled_at: Option<DateTime<Utc>>,
    /// When the entry last lost its final subscriber
    pub unused_since: Option<DateTime<Utc>>,
}

impl QueryEntry {
    /// True while a request for this entry is in flight
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    fn begin_fetch(&mut self) {
        self.status = QueryStatus::Pending;
    }

    fn expired(&self, now: DateTime<Utc>, keep_unused: Duration) -> bool {
        if self.subscribers > 0 || self.is_fetching() {
            return false;
        }
        let Some(since) = self.unused_since else {
            return false;
        };
        chrono::Duration::from_std(keep_unused).is_ok_and(|keep| now - since >= keep)
    }
}

/// State of the `productsApi` cache
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductsApiState {
    /// Entries by query
    pub queries: HashMap<QueryKey, QueryEntry>,
}

impl ProductsApiState {
    /// Entry for `query`, if one exists
    #[must_use]
    pub fn get(&self, query: QueryKey) -> Option<&QueryEntry> {
        self.queries.get(&query)
    }

    /// Cached product list, if fetched
    #[must_use]
    pub fn all_products(&self) -> Option<&[Product]> {
        match self.get(QueryKey::AllProducts)?.data.as_ref()? {
            QueryData::Products(products) => Some(products),
            QueryData::Product(_) => None,
        }
    }

    /// Cached single product, if fetched
    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        match self.get(QueryKey::Product(id))?.data.as_ref()? {
            QueryData::Product(product) => Some(product),
            QueryData::Products(_) => None,
        }
    }
}

/// Actions of the `productsApi` cache
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProductsApiAction {
    /// A reader wants this query's data
    Subscribe(QueryKey),
    /// A reader no longer needs this query's data
    Unsubscribe(QueryKey),
    /// Fetch again even if data is cached
    Refetch(QueryKey),
    /// A request succeeded
    QueryFulfilled {
        /// Which query
        query: QueryKey,
        /// Fetched data
        data: QueryData,
        /// When the response arrived
        fulfilled_at: DateTime<Utc>,
    },
    /// A request failed
    QueryRejected {
        /// Which query
        query: QueryKey,
        /// Failure message
        error: String,
    },
    /// Evict entries that have been unused for longer than `keep_unused`
    CollectUnused,
}

/// Environment dependencies for the `productsApi` cache
#[derive(Clone)]
pub struct ProductsApiEnvironment {
    /// Catalog queried on cache misses
    pub catalog: Arc<dyn ProductCatalog>,
    /// Clock used to time eviction
    pub clock: Arc<dyn Clock>,
    /// Grace period for entries without subscribers
    pub keep_unused: Duration,
}

impl ProductsApiEnvironment {
    /// Creates an environment with the default grace period
    #[must_use]
    pub fn new(catalog: Arc<dyn ProductCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            clock,
            keep_unused: DEFAULT_KEEP_UNUSED,
        }
    }

    /// Sets the grace period for entries without subscribers
    #[must_use]
    pub const fn with_keep_unused(mut self, keep_unused: Duration) -> Self {
        self.keep_unused = keep_unused;
        self
    }
}

/// Reducer for the `productsApi` cache
#[derive(Clone, Debug, Default)]
pub struct ProductsApiReducer;

impl ProductsApiReducer {
    /// Creates a new `ProductsApiReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn fetch(query: QueryKey, env: &ProductsApiEnvironment) -> Effect<ProductsApiAction> {
        let catalog = Arc::clone(&env.catalog);
        let clock = Arc::clone(&env.clock);

        async_effect! {
            let result = match query {
                QueryKey::AllProducts => catalog.list_products().await.map(QueryData::Products),
                QueryKey::Product(id) => catalog.get_product(id).await.map(QueryData::Product),
            };

            Some(match result {
                Ok(data) => ProductsApiAction::QueryFulfilled {
                    query,
                    data,
                    fulfilled_at: clock.now(),
                },
                Err(error) => ProductsApiAction::QueryRejected {
                    query,
                    error: error.to_string(),
                },
            })
        }
    }

    fn schedule_collection(
        entry: &mut QueryEntry,
        env: &ProductsApiEnvironment,
    ) -> Effect<ProductsApiAction> {
        entry.unused_since = Some(env.clock.now());
        delay! {
            duration: env.keep_unused,
            action: ProductsApiAction::CollectUnused
        }
    }
}

impl Reducer for ProductsApiReducer {
    type State = ProductsApiState;
    type Action = ProductsApiAction;
    type Environment = ProductsApiEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ProductsApiAction::Subscribe(query) => {
                let entry = state.queries.entry(query).or_default();
                entry.subscribers += 1;
                entry.unused_since = None;

                match entry.status {
                    QueryStatus::Uninitialized | QueryStatus::Rejected => {
                        tracing::debug!(%query, "Query cache miss, fetching");
                        entry.begin_fetch();
                        smallvec![Self::fetch(query, env)]
                    },
                    QueryStatus::Pending => {
                        tracing::trace!(%query, "Joining in-flight query");
                        smallvec![Effect::None]
                    },
                    QueryStatus::Fulfilled => {
                        tracing::trace!(%query, "Query cache hit");
                        smallvec![Effect::None]
                    },
                }
            },
            ProductsApiAction::Unsubscribe(query) => {
                let Some(entry) = state.queries.get_mut(&query) else {
                    return smallvec![Effect::None];
                };
                entry.subscribers = entry.subscribers.saturating_sub(1);

                if entry.subscribers == 0 {
                    smallvec![Self::schedule_collection(entry, env)]
                } else {
                    smallvec![Effect::None]
                }
            },
            ProductsApiAction::Refetch(query) => {
                let entry = state.queries.entry(query).or_default();
                if entry.is_fetching() {
                    return smallvec![Effect::None];
                }
                tracing::debug!(%query, "Refetching query");
                entry.begin_fetch();
                smallvec![Self::fetch(query, env)]
            },
            ProductsApiAction::QueryFulfilled {
                query,
                data,
                fulfilled_at,
            } => {
                let Some(entry) = state.queries.get_mut(&query) else {
                    return smallvec![Effect::None];
                };
                tracing::debug!(%query, "Query fulfilled");
                entry.status = QueryStatus::Fulfilled;
                entry.data = Some(data);
                entry.error = None;
                entry.fulfilled_at = Some(fulfilled_at);

                if entry.subscribers == 0 && entry.unused_since.is_none() {
                    smallvec![Self::schedule_collection(entry, env)]
                } else {
                    smallvec![Effect::None]
                }
            },
            ProductsApiAction::QueryRejected { query, error } => {
                let Some(entry) = state.queries.get_mut(&query) else {
                    return smallvec![Effect::None];
                };
                tracing::warn!(%query, %error, "Query rejected");
                entry.status = QueryStatus::Rejected;
                entry.error = Some(error);

                if entry.subscribers == 0 && entry.unused_since.is_none() {
                    smallvec![Self::schedule_collection(entry, env)]
                } else {
                    smallvec![Effect::None]
                }
            },
            ProductsApiAction::CollectUnused => {
                let now = env.clock.now();
                let before = state.queries.len();
                state
                    .queries
                    .retain(|_, entry| !entry.expired(now, env.keep_unused));

                let evicted = before - state.queries.len();
                if evicted > 0 {
                    tracing::debug!(evicted, "Evicted unused queries");
                }
                smallvec![Effect::None]
            },
        }
    }
}
