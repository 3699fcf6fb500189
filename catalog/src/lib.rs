//! # Storefront Catalog
//!
//! Client for the remote product catalog (`https://fakestoreapi.com/` by default).
//!
//! - [`ProductCatalog`]: the trait reducers depend on through their environment
//! - [`CatalogClient`]: the reqwest-backed implementation
//! - [`Product`] / [`ProductId`]: the wire types
//!
//! ## Example
//!
//! ```no_run
//! use storefront_catalog::{CatalogClient, ProductCatalog};
//!
//! # async fn example() -> Result<(), storefront_catalog::CatalogError> {
//! let client = CatalogClient::new("https://fakestoreapi.com/")?;
//! let products = client.list_products().await?;
//! println!("{} products", products.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{CatalogClient, CatalogFuture, ProductCatalog, DEFAULT_BASE_URL};
pub use error::CatalogError;
pub use types::{ParseProductIdError, Product, ProductId, Rating};
