//! # Storefront Shop
//!
//! Client-side storefront state built on the reducer architecture:
//!
//! - [`user`]: catalog fetch lifecycle (`loading` / `products` / `error`) and
//!   the cart (`cart_products` / `cart_count`)
//! - [`products_api`]: cached `getAllProducts` and `getProduct(id)` queries
//! - [`app`]: the composed root reducer and the [`ShopStore`] facade
//!
//! ## Example
//!
//! ```no_run
//! use storefront_shop::{CartItem, ShopConfig, ShopStore, UserAction};
//!
//! # async fn example() -> Result<(), storefront_shop::ShopError> {
//! let store = ShopStore::from_config(&ShopConfig::from_env()?)?;
//!
//! store.fetch_products().await?.wait().await;
//!
//! let first = store.state(|s| s.user.products.first().cloned()).await;
//! if let Some(product) = first {
//!     store.send(UserAction::SetCartProducts(CartItem::new(product))).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cart;
pub mod config;
pub mod error;
pub mod products_api;
pub mod user;

pub use app::{shop_reducer, ShopAction, ShopEnvironment, ShopReducer, ShopState, ShopStore};
pub use cart::{CartError, CartItem};
pub use config::ShopConfig;
pub use error::{ConfigError, ShopError};
pub use products_api::{ProductsApiAction, QueryData, QueryKey, QueryStatus};
pub use storefront_catalog::{Product, ProductId};
pub use user::{UserAction, UserReducer, UserState};
