//! Shopping cart domain.
//!
//! [`CartStore`] is the in-memory state machine: an ordered sequence of line
//! items with quantity accumulation, either `unbound` (no signed-in identity,
//! mutations refused) or `bound` to one identity. It performs no I/O; the
//! registry in [`active`] layers identity-keyed loading and fire-and-forget
//! persistence on top of it.

pub mod active;
pub mod persistence;

pub use active::{ActiveCarts, CartContents, SubmissionPermit};
pub use persistence::{CartPersistence, PersistenceError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use wavecrest_core::{IdentityId, ProductId, line_total};

/// One product entry in a cart with an accumulated quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub title: String,
    pub image_ref: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub description: String,
}

impl LineItem {
    /// Extended price for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

/// Product details for an add-to-cart call; the quantity is passed separately
/// so repeated adds for the same product accumulate.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub title: String,
    pub image_ref: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub description: String,
}

impl NewLineItem {
    fn into_line_item(self, quantity: u32) -> LineItem {
        LineItem {
            product_id: self.product_id,
            title: self.title,
            image_ref: self.image_ref,
            unit_price: self.unit_price,
            quantity,
            description: self.description,
        }
    }
}

/// Errors from cart operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// Mutation attempted with no signed-in identity. The caller is expected
    /// to redirect to authentication, capturing the intended destination.
    #[error("cart is not bound to a signed-in identity")]
    Unbound,

    /// Add called with a zero quantity.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// Whether the cart currently belongs to a signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CartMode {
    Unbound,
    Bound(IdentityId),
}

/// The ordered, identity-scoped collection of line items.
///
/// Mutations are synchronous and atomic from the caller's perspective;
/// derived values (`subtotal`, `total_item_count`) are recomputed on every
/// read, never cached.
#[derive(Debug)]
pub struct CartStore {
    mode: CartMode,
    items: Vec<LineItem>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an empty, unbound cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: CartMode::Unbound,
            items: Vec::new(),
        }
    }

    /// Bind the cart to an identity, replacing its contents with that
    /// identity's previously persisted items (empty if none were stored).
    pub fn bind(&mut self, identity: IdentityId, items: Vec<LineItem>) {
        self.mode = CartMode::Bound(identity);
        self.items = items;
    }

    /// Unbind the cart (sign-out). The in-memory contents are destroyed.
    pub fn unbind(&mut self) {
        self.mode = CartMode::Unbound;
        self.items.clear();
    }

    /// The identity this cart is bound to, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&IdentityId> {
        match &self.mode {
            CartMode::Bound(id) => Some(id),
            CartMode::Unbound => None,
        }
    }

    /// Whether the cart is bound to an identity.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        matches!(self.mode, CartMode::Bound(_))
    }

    /// Whether the cart holds no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a product to the cart.
    ///
    /// If a line item with the same product ID already exists its quantity is
    /// increased; otherwise a new line item is appended, preserving insertion
    /// order of first-added distinct products.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Unbound`] when no identity is bound and
    /// [`CartError::ZeroQuantity`] for a zero quantity.
    pub fn add(&mut self, item: NewLineItem, quantity: u32) -> Result<(), CartError> {
        if !self.is_bound() {
            return Err(CartError::Unbound);
        }
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(item.into_line_item(quantity));
        }

        Ok(())
    }

    /// Remove the line item with the given product ID.
    ///
    /// Removing an absent product is a no-op, not an error.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.items.retain(|line| &line.product_id != product_id);
    }

    /// Empty the cart unconditionally.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// An owned copy of the current contents, for persistence or order
    /// snapshots. Later cart mutation never alters the returned value.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LineItem> {
        self.items.clone()
    }

    /// Sum of `unit_price * quantity` over all line items.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Sum of quantities over all line items (the cart badge value).
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |total, line| total.saturating_add(line.quantity))
    }
}
