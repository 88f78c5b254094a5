//! Order Book Replica
//!
//! Local copy of the venue's order book, rebuilt purely from positional
//! diffs. Rows have no stable identifier: every diff addresses rows by index
//! relative to the state right before it, so diffs must be applied one at a
//! time, in arrival order, by a single owner.

use thiserror::Error;

use crate::domain::market::{Order, OrderBookUpdate};

/// Typical PDAX book depth, used as the initial capacity.
pub const ORDER_BOOK_CAPACITY: usize = 800;

/// Errors raised when a diff does not fit the current book.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderBookError {
    /// The diff addressed a position outside the book.
    #[error("{kind} index {index} out of range for order book of {len} rows")]
    IndexOutOfRange {
        /// Diff kind that failed.
        kind: &'static str,
        /// Offending index.
        index: usize,
        /// Book length at the time of the diff.
        len: usize,
    },
}

/// Positional order book.
///
/// A failing [`apply`](Self::apply) leaves the book unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookReplica {
    orders: Vec<Order>,
}

impl Default for OrderBookReplica {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBookReplica {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: Vec::with_capacity(ORDER_BOOK_CAPACITY),
        }
    }

    /// Create a book from a snapshot, in row order.
    #[must_use]
    pub fn from_orders(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Current rows, in book order.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if the book has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Apply one diff.
    ///
    /// # Errors
    ///
    /// Returns [`OrderBookError::IndexOutOfRange`] when the diff addresses a
    /// row the book does not have. This is a protocol violation.
    pub fn apply(&mut self, update: OrderBookUpdate) -> Result<(), OrderBookError> {
        match update {
            OrderBookUpdate::Remove { old_index } => {
                self.check(update.kind(), old_index, self.len())?;
                self.orders.remove(old_index);
            }
            OrderBookUpdate::Insert { order, new_index } => {
                self.check(update.kind(), new_index, self.len() + 1)?;
                self.orders.insert(new_index, order);
            }
            OrderBookUpdate::Update {
                update: delta,
                old_index,
                new_index,
            } => {
                self.check(update.kind(), old_index, self.len())?;
                // after the row leaves, the book is one shorter
                self.check(update.kind(), new_index, self.len())?;

                let mut order = self.orders[old_index];
                order.quantity = delta.quantity;
                order.timestamp = delta.timestamp;

                if old_index == new_index {
                    self.orders[old_index] = order;
                } else {
                    self.orders.remove(old_index);
                    self.orders.insert(new_index, order);
                }
            }
        }

        Ok(())
    }

    fn check(&self, kind: &'static str, index: usize, bound: usize) -> Result<(), OrderBookError> {
        if index < bound {
            Ok(())
        } else {
            Err(OrderBookError::IndexOutOfRange {
                kind,
                index,
                len: self.len(),
            })
        }
    }
}
