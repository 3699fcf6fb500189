//! The `user` slice: catalog fetch lifecycle and the cart.
//!
//! A catalog fetch moves through three states:
//!
//! - pending (`FetchProducts`): `loading` is set and one request is started
//! - fulfilled (`ProductsFetched`): `loading` is cleared and `products` replaced
//! - rejected (`ProductsFetchFailed`): `loading` is cleared, `products` emptied
//!   and `error` set to the failure text
//!
//! Overlapping fetches are not de-duplicated; whichever settles last wins.
//!
//! Cart mutations are synchronous. A mutation whose precondition fails leaves
//! the cart as it was and records the reason in `last_cart_error`.

use crate::cart::{CartError, CartItem, CartLines};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_catalog::{Product, ProductCatalog, ProductId};
use storefront_core::{async_effect, effect::Effect, reducer::Reducer, smallvec, SmallVec};

/// State of the `user` slice
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    /// True while a catalog fetch is outstanding
    pub loading: bool,
    /// Last successfully fetched catalog
    pub products: Vec<Product>,
    /// Text of the last fetch failure, empty if none has happened
    pub error: String,
    /// Number of distinct line items, as last set or recomputed
    pub cart_count: usize,
    /// Cart lines in insertion order
    pub cart_products: Vec<CartItem>,
    /// Why the last cart mutation was refused, if it was
    pub last_cart_error: Option<CartError>,
}

impl UserState {
    /// Line for product `id`, if it is in the cart
    #[must_use]
    pub fn cart_item(&self, id: ProductId) -> Option<&CartItem> {
        self.cart_products.iter().find(|line| line.id() == id)
    }

    /// Sum of quantities over all lines
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.cart_products.iter().map(|line| u64::from(line.qty)).sum()
    }

    /// Sum of `price * qty` over all lines
    #[must_use]
    pub fn total_price(&self) -> f64 {
        self.cart_products
            .iter()
            .map(|line| line.product.price * f64::from(line.qty))
            .sum()
    }

    fn sync_cart_count(&mut self) {
        self.cart_count = self.cart_products.len();
    }
}

/// Actions of the `user` slice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum UserAction {
    /// Start a catalog fetch
    FetchProducts,
    /// A catalog fetch succeeded
    ProductsFetched {
        /// The fetched catalog
        products: Vec<Product>,
    },
    /// A catalog fetch failed
    ProductsFetchFailed {
        /// Failure message
        error: String,
    },
    /// Append a line to the cart
    SetCartProducts(CartItem),
    /// Set `cart_count` directly
    AddToCart(usize),
    /// Raise the quantity of a line by one
    Increment(ProductId),
    /// Lower the quantity of a line by one, removing it at zero
    Decrement(ProductId),
    /// Remove every line for a product
    DeleteProduct(ProductId),
}

/// Environment dependencies for the `user` slice
#[derive(Clone)]
pub struct UserEnvironment {
    /// Catalog the fetch lifecycle reads from
    pub catalog: Arc<dyn ProductCatalog>,
}

impl UserEnvironment {
    /// Creates a new `UserEnvironment`
    #[must_use]
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }
}

/// Reducer for the `user` slice
#[derive(Clone, Debug, Default)]
pub struct UserReducer;

impl UserReducer {
    /// Creates a new `UserReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn apply_cart_result(state: &mut UserState, result: Result<(), CartError>) {
        match result {
            Ok(()) => state.last_cart_error = None,
            Err(error) => {
                tracing::warn!(%error, "Cart mutation refused");
                state.last_cart_error = Some(error);
            },
        }
    }
}

impl Reducer for UserReducer {
    type State = UserState;
    type Action = UserAction;
    type Environment = UserEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            UserAction::FetchProducts => {
                tracing::debug!("Catalog fetch pending");
                state.loading = true;

                let catalog = Arc::clone(&env.catalog);
                smallvec![async_effect! {
                    match catalog.list_products().await {
                        Ok(products) => Some(UserAction::ProductsFetched { products }),
                        Err(error) => Some(UserAction::ProductsFetchFailed {
                            error: error.to_string(),
                        }),
                    }
                }]
            },
            UserAction::ProductsFetched { products } => {
                tracing::debug!(count = products.len(), "Catalog fetch fulfilled");
                state.loading = false;
                state.products = products;
                smallvec![Effect::None]
            },
            UserAction::ProductsFetchFailed { error } => {
                tracing::warn!(%error, "Catalog fetch rejected");
                state.loading = false;
                state.products.clear();
                state.error = error;
                smallvec![Effect::None]
            },
            UserAction::SetCartProducts(item) => {
                let result = state.cart_products.push_line(item);
                Self::apply_cart_result(state, result);
                smallvec![Effect::None]
            },
            UserAction::AddToCart(count) => {
                if count != state.cart_products.len() {
                    tracing::warn!(
                        count,
                        lines = state.cart_products.len(),
                        "Cart count set to a value that differs from the line count"
                    );
                }
                state.cart_count = count;
                state.last_cart_error = None;
                smallvec![Effect::None]
            },
            UserAction::Increment(id) => {
                let result = state.cart_products.increment(id).map(|_| ());
                Self::apply_cart_result(state, result);
                smallvec![Effect::None]
            },
            UserAction::Decrement(id) => {
                let result = state.cart_products.decrement(id);
                if matches!(result, Ok(None)) {
                    state.sync_cart_count();
                }
                Self::apply_cart_result(state, result.map(|_| ()));
                smallvec![Effect::None]
            },
            UserAction::DeleteProduct(id) => {
                let removed = state.cart_products.remove_all(id);
                tracing::debug!(%id, removed, "Deleted cart lines");
                state.sync_cart_count();
                state.last_cart_error = None;
                smallvec![Effect::None]
            },
        }
    }
}
