//! Product catalog client implementation

use crate::{
    error::CatalogError,
    types::{Product, ProductId},
};
use reqwest::{Client, StatusCode, Url};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// Catalog used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://fakestoreapi.com/";

/// Boxed future returned by [`ProductCatalog`] methods
pub type CatalogFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CatalogError>> + Send + 'a>>;

/// Read access to the product catalog
///
/// Reducers hold this behind an `Arc<dyn ProductCatalog>` in their
/// environment, so production uses [`CatalogClient`] and tests use a
/// scripted mock.
pub trait ProductCatalog: Send + Sync {
    /// `GET products`
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on transport, status, or decoding failure.
    fn list_products(&self) -> CatalogFuture<'_, Vec<Product>>;

    /// `GET products/{id}`
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] when the catalog has no
    /// such product, or another [`CatalogError`] on failure.
    fn get_product(&self, id: ProductId) -> CatalogFuture<'_, Product>;
}

/// HTTP product catalog client
#[derive(Clone, Debug)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Create a client for the catalog at `base_url` with no request timeout
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidBaseUrl` if `base_url` is not an
    /// absolute http(s) URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client with an optional per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidBaseUrl` for an unusable URL, or
    /// `CatalogError::Client` if the HTTP client cannot be built.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, CatalogError> {
        let base_url = normalize_base_url(base_url.into())?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| CatalogError::Client(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint is resolved against (always ends with `/`)
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        let started = Instant::now();

        let result = async {
            let response = self
                .client
                .get(self.endpoint("products"))
                .send()
                .await
                .map_err(|e| CatalogError::RequestFailed(e.to_string()))?;

            match response.status() {
                StatusCode::OK => response
                    .json::<Vec<Product>>()
                    .await
                    .map_err(|e| CatalogError::ResponseParseFailed(e.to_string())),
                status => {
                    let body = response.text().await.unwrap_or_default();
                    Err(CatalogError::ApiError {
                        status: status.as_u16(),
                        message: body,
                    })
                },
            }
        }
        .await;

        record_request("products", &result, started);

        match &result {
            Ok(products) => tracing::debug!(count = products.len(), "Fetched product list"),
            Err(error) => tracing::warn!(%error, "Product list request failed"),
        }

        result
    }

    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let started = Instant::now();

        let result = async {
            let response = self
                .client
                .get(self.endpoint(&format!("products/{id}")))
                .send()
                .await
                .map_err(|e| CatalogError::RequestFailed(e.to_string()))?;

            match response.status() {
                StatusCode::OK => {
                    let body = response
                        .text()
                        .await
                        .map_err(|e| CatalogError::RequestFailed(e.to_string()))?;
                    decode_product(id, &body)
                },
                StatusCode::NOT_FOUND => Err(CatalogError::ProductNotFound(id)),
                status => {
                    let body = response.text().await.unwrap_or_default();
                    Err(CatalogError::ApiError {
                        status: status.as_u16(),
                        message: body,
                    })
                },
            }
        }
        .await;

        record_request("product", &result, started);

        if let Err(error) = &result {
            tracing::warn!(%error, "Product request failed");
        }

        result
    }
}

impl ProductCatalog for CatalogClient {
    fn list_products(&self) -> CatalogFuture<'_, Vec<Product>> {
        Box::pin(self.fetch_products())
    }

    fn get_product(&self, id: ProductId) -> CatalogFuture<'_, Product> {
        Box::pin(self.fetch_product(id))
    }
}

fn normalize_base_url(raw: String) -> Result<String, CatalogError> {
    let url = Url::parse(raw.trim()).map_err(|e| CatalogError::InvalidBaseUrl(format!("{raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(CatalogError::InvalidBaseUrl(raw));
    }

    let mut base = url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(base)
}

// The upstream answers unknown ids with 200 and an empty body.
fn decode_product(id: ProductId, body: &str) -> Result<Product, CatalogError> {
    let body = body.trim();
    if body.is_empty() || body == "null" {
        return Err(CatalogError::ProductNotFound(id));
    }
    serde_json::from_str(body).map_err(|e| CatalogError::ResponseParseFailed(e.to_string()))
}

fn record_request<T>(endpoint: &'static str, result: &Result<T, CatalogError>, started: Instant) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(CatalogError::ProductNotFound(_)) => "not_found",
        Err(_) => "error",
    };

    metrics::counter!("catalog.requests.total", "endpoint" => endpoint, "outcome" => outcome)
        .increment(1);
    metrics::histogram!("catalog.request.duration_seconds", "endpoint" => endpoint)
        .record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = CatalogClient::new(DEFAULT_BASE_URL).unwrap();
        assert_eq!(client.base_url(), "https://fakestoreapi.com/");
        assert_eq!(client.endpoint("products"), "https://fakestoreapi.com/products");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = CatalogClient::new("http://localhost:8080/api").unwrap();
        assert_eq!(client.endpoint("products/1"), "http://localhost:8080/api/products/1");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            CatalogClient::new("not a url"),
            Err(CatalogError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            CatalogClient::new("ftp://example.com/"),
            Err(CatalogError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_empty_body_is_not_found() {
        let id = ProductId::new(999);
        assert_eq!(decode_product(id, ""), Err(CatalogError::ProductNotFound(id)));
        assert_eq!(decode_product(id, "null"), Err(CatalogError::ProductNotFound(id)));
    }
}
