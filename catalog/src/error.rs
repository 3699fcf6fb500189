//! Error types for the catalog client

use crate::types::ProductId;
use thiserror::Error;

/// Errors that can occur when talking to the product catalog
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The configured base URL cannot be used
    #[error("Invalid catalog base URL: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    /// HTTP request failed before a response was received
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body was not the expected JSON
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// The catalog has no product with this id
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// API returned a non-success status
    #[error("Request failed with status code {status}: {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },
}
