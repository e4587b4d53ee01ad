//! Cart state and the item-merge mutation
//!
//! [`CartState`] is the session's mutable document body. Mutation is a pure
//! function: [`CartState::merge_item`] returns a new cart and never touches
//! the input, which lets the store client re-apply it safely when a
//! conditional write loses a race and has to be retried.

use serde::{Deserialize, Serialize};

use crate::error::{CartgateError, Result};

/// A single cart line: an item name and how many of it
///
/// The store's legacy schema names the quantity column `cantidad`; the rename
/// keeps the wire format stable while the Rust field stays idiomatic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Item name, unique within a cart
    pub item: String,

    /// Quantity of the item, always positive
    #[serde(rename = "cantidad")]
    pub quantity: u64,
}

/// The contents of one session's cart
///
/// Lines are kept in insertion order and item names are unique: merging an
/// already-present item accumulates onto its existing line instead of
/// appending a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    /// Cart lines in insertion order
    #[serde(default)]
    pub items: Vec<CartLine>,
}

impl CartState {
    /// An empty cart, used as the initial state of a new session
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge `quantity` of `item` into the cart, returning the new cart
    ///
    /// If a line for `item` exists its quantity is incremented (quantities
    /// accumulate, they are never overwritten); otherwise a new line is
    /// appended, preserving the order of existing lines.
    ///
    /// # Errors
    ///
    /// Returns [`CartgateError::InvalidQuantity`] when `quantity <= 0`, or
    /// when accumulating it would overflow the line's counter. The input cart
    /// is unchanged either way.
    pub fn merge_item(&self, item: &str, quantity: i64) -> Result<CartState> {
        if quantity <= 0 {
            return Err(CartgateError::InvalidQuantity(quantity).into());
        }
        let addend = quantity as u64;

        let mut items = self.items.clone();
        match items.iter_mut().find(|line| line.item == item) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(addend)
                    .ok_or(CartgateError::InvalidQuantity(quantity))?;
            }
            None => items.push(CartLine {
                item: item.to_string(),
                quantity: addend,
            }),
        }
        Ok(CartState { items })
    }
}
