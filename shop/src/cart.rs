//! Cart line items and the errors cart mutations can report.

use serde::{Deserialize, Serialize};
use storefront_catalog::{Product, ProductId};
use thiserror::Error;

/// One distinct product in the cart with its own quantity
///
/// Serializes as the product's fields plus `qty`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product this line is for
    #[serde(flatten)]
    pub product: Product,
    /// Quantity, at least 1 while the line is in a cart
    pub qty: u32,
}

impl CartItem {
    /// A line for `product` with quantity 1
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self { product, qty: 1 }
    }

    /// Sets the quantity
    #[must_use]
    pub const fn with_qty(mut self, qty: u32) -> Self {
        self.qty = qty;
        self
    }

    /// Id of the product on this line
    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.product.id
    }
}

/// Why a cart mutation was refused
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartError {
    /// Increment or decrement named a product that has no line in the cart
    #[error("no cart item for product {0}")]
    ItemNotFound(ProductId),

    /// A line for this product is already in the cart
    #[error("product {0} is already in the cart")]
    DuplicateItem(ProductId),

    /// A line cannot be added with quantity 0
    #[error("cart item for product {0} has zero quantity")]
    ZeroQuantity(ProductId),
}

/// Ordered cart lines with unique product ids and quantities of at least 1
pub(crate) trait CartLines {
    fn line_mut(&mut self, id: ProductId) -> Result<&mut CartItem, CartError>;
    fn push_line(&mut self, item: CartItem) -> Result<(), CartError>;
    fn increment(&mut self, id: ProductId) -> Result<u32, CartError>;
    fn decrement(&mut self, id: ProductId) -> Result<Option<u32>, CartError>;
    fn remove_all(&mut self, id: ProductId) -> usize;
}

impl CartLines for Vec<CartItem> {
    fn line_mut(&mut self, id: ProductId) -> Result<&mut CartItem, CartError> {
        self.iter_mut()
            .find(|line| line.id() == id)
            .ok_or(CartError::ItemNotFound(id))
    }

    fn push_line(&mut self, item: CartItem) -> Result<(), CartError> {
        let id = item.id();
        if item.qty == 0 {
            return Err(CartError::ZeroQuantity(id));
        }
        if self.iter().any(|line| line.id() == id) {
            return Err(CartError::DuplicateItem(id));
        }
        self.push(item);
        Ok(())
    }

    fn increment(&mut self, id: ProductId) -> Result<u32, CartError> {
        let line = self.line_mut(id)?;
        line.qty = line.qty.saturating_add(1);
        Ok(line.qty)
    }

    /// `Ok(None)` means the line reached zero and was removed.
    fn decrement(&mut self, id: ProductId) -> Result<Option<u32>, CartError> {
        let line = self.line_mut(id)?;
        if line.qty > 1 {
            line.qty -= 1;
            return Ok(Some(line.qty));
        }
        self.retain(|line| line.id() != id);
        Ok(None)
    }

    fn remove_all(&mut self, id: ProductId) -> usize {
        let before = self.len();
        self.retain(|line| line.id() != id);
        before - self.len()
    }
}
