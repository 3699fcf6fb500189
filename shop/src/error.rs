//! Error types for the shop facade

use crate::products_api::QueryKey;
use storefront_catalog::CatalogError;
use storefront_runtime::StoreError;
use thiserror::Error;

/// Errors returned by [`ShopStore`](crate::ShopStore) and its setup
#[derive(Debug, Error)]
pub enum ShopError {
    /// The store rejected or lost an action
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The catalog client could not be created
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A cached query settled as rejected
    #[error("{query} failed: {message}")]
    QueryFailed {
        /// Which query
        query: QueryKey,
        /// Failure message from the catalog
        message: String,
    },

    /// A query settled with data of the wrong shape
    #[error("{0} returned unexpected data")]
    UnexpectedData(QueryKey),
}

/// Errors from loading [`ShopConfig`](crate::ShopConfig)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Value found
        value: String,
    },
}
