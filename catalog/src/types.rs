//! Wire types for the product catalog

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a catalog product
///
/// One id type is used everywhere, cart lines included. Ids arriving as text
/// (route parameters, form values) go through [`FromStr`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Creates a `ProductId` from its numeric value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when text is not a product id
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid product id: {input:?}")]
pub struct ParseProductIdError {
    input: String,
}

impl FromStr for ProductId {
    type Err = ParseProductIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ParseProductIdError {
                input: s.to_string(),
            })
    }
}

/// Aggregate customer rating
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Average score
    #[serde(default)]
    pub rate: f64,
    /// Number of ratings
    #[serde(default)]
    pub count: u64,
}

/// A catalog product
///
/// Only `id` is required; every other field tolerates being absent so the
/// state layer never rejects a catalog over presentation data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Unit price
    #[serde(default)]
    pub price: f64,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Category name
    #[serde(default)]
    pub category: String,
    /// Image URL
    #[serde(default)]
    pub image: String,
    /// Customer rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

impl Product {
    /// Creates a product with only an id and title set
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id: ProductId(id),
            title: title.into(),
            price: 0.0,
            description: String::new(),
            category: String::new(),
            image: String::new(),
            rating: None,
        }
    }

    /// Sets the unit price
    #[must_use]
    pub const fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;

    #[test]
    fn product_id_parses_trimmed_text() {
        assert_eq!(" 7 ".parse::<ProductId>().unwrap(), ProductId::new(7));
        assert!("seven".parse::<ProductId>().is_err());
        assert!("-1".parse::<ProductId>().is_err());
    }

    #[test]
    fn product_id_serializes_as_number() {
        let json = serde_json::to_string(&ProductId::new(3)).unwrap();
        assert_eq!(json, "3");
    }

    #[test]
    fn product_decodes_fakestore_shape() {
        let json = r#"{
            "id": 1,
            "title": "Fjallraven - Foldsack No. 1 Backpack, Fits 15 Laptops",
            "price": 109.95,
            "description": "Your perfect pack for everyday use",
            "category": "men's clothing",
            "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();

        assert_eq!(product.id, ProductId::new(1));
        assert!((product.price - 109.95).abs() < f64::EPSILON);
        assert_eq!(product.rating.unwrap().count, 120);
    }

    #[test]
    fn product_tolerates_missing_fields() {
        let product: Product = serde_json::from_str(r#"{ "id": 42 }"#).unwrap();

        assert_eq!(product, Product::new(42, ""));
    }
}
