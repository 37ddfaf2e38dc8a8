//! Line items and the cart that holds them.
//!
//! The cart is an ordered list: items keep the position they were first added
//! at, and adding an id that is already present bumps its quantity instead of
//! appending a duplicate row.
//!
//! A cart never holds more than a [`Decimal`] can price: any change that
//! would push the subtotal past [`Decimal::MAX`] is refused and leaves the
//! cart as it was.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ProductId;

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product identifier, unique within a cart.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price, never negative.
    pub price: Decimal,
    /// Quantity, never below 1.
    pub quantity: u32,
    /// Product image URL or relative path.
    #[serde(default)]
    pub image: String,
}

impl LineItem {
    /// Create a line item with a quantity of 1.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            quantity: 1,
            image: image.into(),
        }
    }

    /// Set the quantity (builder style), clamped to at least 1.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    /// `price * quantity`, unrounded, or `None` if it does not fit in a
    /// [`Decimal`].
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Reference to a cart line, either by position or by product id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRef {
    /// Zero-based position in the cart.
    Index(usize),
    /// Product id of the line.
    Id(ProductId),
}

impl From<usize> for LineRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<ProductId> for LineRef {
    fn from(id: ProductId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for LineRef {
    fn from(id: &str) -> Self {
        Self::Id(ProductId::new(id))
    }
}

/// An ordered sequence of line items.
///
/// Serialized as a bare JSON array. Deserialization goes through
/// [`Cart::from`], so a persisted cart is always normalized on load: each
/// line is read on its own and a line that cannot be read is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Value>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all quantities (the header badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// `Σ price * quantity`, unrounded.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        // Mutations keep the sum representable, so the fallback is never taken.
        checked_subtotal(&self.items).unwrap_or(Decimal::MAX)
    }

    /// Position of the referenced line, if it exists.
    #[must_use]
    pub fn position(&self, line: &LineRef) -> Option<usize> {
        match line {
            LineRef::Index(index) => (*index < self.items.len()).then_some(*index),
            LineRef::Id(id) => self.items.iter().position(|item| &item.id == id),
        }
    }

    /// The referenced line, if it exists.
    #[must_use]
    pub fn get(&self, line: &LineRef) -> Option<&LineItem> {
        self.position(line).and_then(|index| self.items.get(index))
    }

    fn get_mut(&mut self, line: &LineRef) -> Option<&mut LineItem> {
        self.position(line).and_then(|index| self.items.get_mut(index))
    }

    /// Add `quantity` units of `item`.
    ///
    /// If a line with the same id exists its quantity is incremented and the
    /// stored name, price and image are kept; otherwise `item` is appended.
    /// A quantity of 0 is treated as 1.
    ///
    /// Returns `false`, leaving the cart unchanged, if the subtotal would no
    /// longer fit in a [`Decimal`].
    pub fn add(&mut self, item: LineItem, quantity: u32) -> bool {
        let quantity = quantity.max(1);
        let mut next = self.items.clone();
        if let Some(existing) = next.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            next.push(item.with_quantity(quantity));
        }
        self.commit(next)
    }

    /// Remove the referenced line. Returns the removed line, or `None` if it
    /// did not exist.
    pub fn remove(&mut self, line: &LineRef) -> Option<LineItem> {
        let index = self.position(line)?;
        Some(self.items.remove(index))
    }

    /// Set the quantity of the referenced line, clamping values below 1 to 1.
    ///
    /// Returns `false` if the line does not exist or the new quantity would
    /// overflow the subtotal.
    pub fn set_quantity(&mut self, line: &LineRef, quantity: i64) -> bool {
        let clamped = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        self.update_quantity(line, |_| clamped)
    }

    /// Increase the referenced line by one unit.
    ///
    /// Returns `false` if the line does not exist or the extra unit would
    /// overflow the subtotal.
    pub fn increment(&mut self, line: &LineRef) -> bool {
        self.update_quantity(line, |current| current.saturating_add(1))
    }

    /// Decrease the referenced line by one unit, never below 1.
    ///
    /// Returns `true` only if the quantity actually changed.
    pub fn decrement(&mut self, line: &LineRef) -> bool {
        self.get_mut(line).is_some_and(|item| {
            if item.quantity > 1 {
                item.quantity -= 1;
                true
            } else {
                false
            }
        })
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn update_quantity(&mut self, line: &LineRef, quantity: impl FnOnce(u32) -> u32) -> bool {
        let Some(index) = self.position(line) else {
            return false;
        };
        let mut next = self.items.clone();
        if let Some(item) = next.get_mut(index) {
            item.quantity = quantity(item.quantity);
        }
        self.commit(next)
    }

    fn commit(&mut self, next: Vec<LineItem>) -> bool {
        if checked_subtotal(&next).is_none() {
            return false;
        }
        self.items = next;
        true
    }
}

fn checked_subtotal(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
}

impl From<Vec<LineItem>> for Cart {
    /// Build a normalized cart: quantities below 1 become 1, lines with a
    /// negative price are dropped, repeated ids are merged into the first
    /// occurrence, and a line that would overflow the subtotal is dropped.
    fn from(items: Vec<LineItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            if item.price < Decimal::ZERO {
                continue;
            }
            let quantity = item.quantity;
            cart.add(item, quantity);
        }
        cart
    }
}

impl From<Vec<Value>> for Cart {
    /// Read persisted lines one at a time, then normalize them the same way
    /// as a `Vec<LineItem>`.
    ///
    /// Numeric ids are kept as their decimal text. The quantity may be a
    /// number or numeric text; it is truncated toward zero, raised to 1 when
    /// it ends up below 1, and capped at `u32::MAX`. A line without a usable
    /// id, name or price is skipped.
    fn from(lines: Vec<Value>) -> Self {
        lines
            .into_iter()
            .filter_map(|line| serde_json::from_value::<PersistedLine>(line).ok())
            .filter_map(PersistedLine::into_line_item)
            .collect::<Vec<_>>()
            .into()
    }
}

/// A cart line as found in storage, before normalization.
#[derive(Deserialize)]
struct PersistedLine {
    id: Value,
    name: String,
    price: Decimal,
    #[serde(default)]
    quantity: Value,
    #[serde(default)]
    image: String,
}

impl PersistedLine {
    fn into_line_item(self) -> Option<LineItem> {
        let id = match self.id {
            Value::String(id) if !id.trim().is_empty() => id,
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        Some(LineItem {
            id: ProductId::new(id),
            name: self.name,
            price: self.price,
            quantity: lenient_quantity(&self.quantity),
            image: self.image,
        })
    }
}

fn lenient_quantity(raw: &Value) -> u32 {
    let parsed = match raw {
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };
    parsed.map_or(1, |quantity| {
        let whole = quantity.trunc();
        if whole < Decimal::ONE {
            1
        } else {
            whole.to_u32().unwrap_or(u32::MAX)
        }
    })
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
