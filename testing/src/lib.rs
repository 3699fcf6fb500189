//! # Storefront Testing
//!
//! Testing utilities and helpers for the storefront crates.
//!
//! This crate provides:
//! - Deterministic clocks for the `Clock` environment trait
//! - `MockCatalog`, a scripted `ProductCatalog`
//! - `ReducerTest`, a Given-When-Then harness for reducers
//! - proptest strategies for catalog types
//!
//! ## Example
//!
//! ```ignore
//! use storefront_testing::{mocks::MockCatalog, test_clock};
//!
//! #[tokio::test]
//! async fn fetch_fills_catalog() {
//!     let catalog = MockCatalog::new().with_products(vec![Product::new(1, "Backpack")]);
//!     let store = ShopStore::new(ShopEnvironment::new(Arc::new(catalog), Arc::new(test_clock())));
//!
//!     store.fetch_products().await?.wait().await;
//!
//!     let products = store.state(|s| s.user.products.clone()).await;
//!     assert_eq!(products.len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use storefront_core::environment::Clock;

pub mod reducer_test;

/// Mock implementations of Environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::time::Duration;
    use storefront_catalog::{CatalogError, CatalogFuture, Product, ProductCatalog, ProductId};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_testing::mocks::FixedClock;
    /// use storefront_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Used for cache expiry tests: reduce, `advance`, reduce again.
    ///
    /// ```
    /// use std::time::Duration;
    /// use storefront_core::environment::Clock;
    /// use storefront_testing::mocks::ManualClock;
    ///
    /// let clock = ManualClock::starting_at(storefront_testing::test_clock().now());
    /// let before = clock.now();
    /// clock.advance(Duration::from_secs(60));
    /// assert_eq!((clock.now() - before).num_seconds(), 60);
    /// ```
    #[derive(Debug)]
    pub struct ManualClock {
        time: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock reading `time`
        #[must_use]
        pub const fn starting_at(time: DateTime<Utc>) -> Self {
            Self {
                time: Mutex::new(time),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(next) = chrono::Duration::from_std(by)
                .ok()
                .and_then(|by| time.checked_add_signed(by))
            {
                *time = next;
            }
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    #[derive(Debug, Default)]
    struct Script {
        products: Vec<Product>,
        list_failure: Option<CatalogError>,
        product_failures: HashMap<ProductId, CatalogError>,
        latency: Option<Duration>,
    }

    /// Scripted in-memory product catalog
    ///
    /// Serves whatever products it was given, fails where told to, and
    /// counts every call so tests can assert on request sharing.
    #[derive(Debug, Default)]
    pub struct MockCatalog {
        script: Mutex<Script>,
        list_calls: AtomicUsize,
        product_calls: AtomicUsize,
    }

    impl MockCatalog {
        /// Empty catalog that answers immediately
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve these products
        #[must_use]
        pub fn with_products(self, products: Vec<Product>) -> Self {
            self.set_products(products);
            self
        }

        /// Delay every response by `latency` (tokio time)
        #[must_use]
        pub fn with_latency(self, latency: Duration) -> Self {
            self.script().latency = Some(latency);
            self
        }

        /// Replace the served products
        pub fn set_products(&self, products: Vec<Product>) {
            self.script().products = products;
        }

        /// Make `list_products` fail with `error` until cleared
        pub fn fail_list_with(&self, error: CatalogError) {
            self.script().list_failure = Some(error);
        }

        /// Make `get_product(id)` fail with `error`
        pub fn fail_product_with(&self, id: ProductId, error: CatalogError) {
            self.script().product_failures.insert(id, error);
        }

        /// Remove all scripted failures
        pub fn clear_failures(&self) {
            let mut script = self.script();
            script.list_failure = None;
            script.product_failures.clear();
        }

        /// Number of `list_products` calls so far
        #[must_use]
        pub fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        /// Number of `get_product` calls so far
        #[must_use]
        pub fn product_calls(&self) -> usize {
            self.product_calls.load(Ordering::SeqCst)
        }

        fn script(&self) -> MutexGuard<'_, Script> {
            self.script.lock().unwrap_or_else(PoisonError::into_inner)
        }

        async fn pause(latency: Option<Duration>) {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
        }
    }

    impl ProductCatalog for MockCatalog {
        fn list_products(&self) -> CatalogFuture<'_, Vec<Product>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let (result, latency) = {
                let script = self.script();
                let result = match &script.list_failure {
                    Some(error) => Err(error.clone()),
                    None => Ok(script.products.clone()),
                };
                (result, script.latency)
            };

            Box::pin(async move {
                Self::pause(latency).await;
                result
            })
        }

        fn get_product(&self, id: ProductId) -> CatalogFuture<'_, Product> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            let (result, latency) = {
                let script = self.script();
                let result = match script.product_failures.get(&id) {
                    Some(error) => Err(error.clone()),
                    None => script
                        .products
                        .iter()
                        .find(|p| p.id == id)
                        .cloned()
                        .ok_or(CatalogError::ProductNotFound(id)),
                };
                (result, script.latency)
            };

            Box::pin(async move {
                Self::pause(latency).await;
                result
            })
        }
    }
}

/// Helpers for integration tests.
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Install a test-friendly tracing subscriber once per process
    ///
    /// Honors `RUST_LOG`; output goes through the test harness capture.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use storefront_catalog::{Product, ProductId};

    /// Ids from a small range so generated sequences collide often
    pub fn product_id() -> impl Strategy<Value = ProductId> {
        (1u64..=8).prop_map(ProductId::new)
    }

    /// Catalog product with an id from [`product_id`]
    pub fn product() -> impl Strategy<Value = Product> {
        (product_id(), "[a-z]{1,12}", 0u32..50_000).prop_map(|(id, title, cents)| {
            Product::new(id.get(), title).with_price(f64::from(cents) / 100.0)
        })
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, MockCatalog, test_clock};
pub use reducer_test::{ReducerTest, assertions, run_future_effects};

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;
    use storefront_catalog::{CatalogError, Product, ProductCatalog, ProductId};

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }

    #[tokio::test]
    async fn test_mock_catalog_serves_and_counts() {
        let catalog = MockCatalog::new().with_products(vec![Product::new(1, "Backpack")]);

        assert_eq!(catalog.list_products().await.unwrap().len(), 1);
        assert_eq!(
            catalog.get_product(ProductId::new(1)).await.unwrap().title,
            "Backpack"
        );
        assert_eq!(
            catalog.get_product(ProductId::new(2)).await,
            Err(CatalogError::ProductNotFound(ProductId::new(2)))
        );
        assert_eq!(catalog.list_calls(), 1);
        assert_eq!(catalog.product_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_catalog_scripted_failure() {
        let catalog = MockCatalog::new();
        catalog.fail_list_with(CatalogError::RequestFailed("offline".into()));

        assert!(catalog.list_products().await.is_err());

        catalog.clear_failures();
        assert_eq!(catalog.list_products().await, Ok(vec![]));
    }
}
