//! Market Records
//!
//! Typed values decoded from the PDAX binary feed.
//!
//! - `Trade`: an executed trade from the time-and-sales panel
//! - `Order`: one row of the positional order book
//! - `OrderUpdate`: a partial order mutation (quantity and timestamp only)
//! - `OrderBookUpdate`: a single positional diff against the order book

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Trade
// =============================================================================

/// An executed trade.
///
/// Price and quantity are exact decimals built from the wire mantissa and
/// its decimal-place count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Currency pair label, e.g. `BTC-PHP`.
    pub currency_pair: String,
    /// Execution price.
    pub price: Decimal,
    /// Executed quantity.
    pub quantity: Decimal,
    /// Execution time.
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Order Book Records
// =============================================================================

/// Side of an order book row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy side.
    Bid,
    /// Sell side.
    Ask,
}

impl Side {
    /// Map the wire side byte (1 = bid, anything else = ask).
    #[must_use]
    pub const fn from_wire(value: u8) -> Self {
        if value == 1 { Self::Bid } else { Self::Ask }
    }

    /// Get the side name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bid => "bid",
            Self::Ask => "ask",
        }
    }
}

/// One row of the order book.
///
/// Values are kept as they arrive on the wire: the mantissas are floats and
/// the timestamp is still encoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Price mantissa.
    pub price: f64,
    /// Decimal places of `price`.
    pub price_decimals: u8,
    /// Visible quantity mantissa.
    pub quantity: f64,
    /// Decimal places of `quantity`.
    pub quantity_decimals: u8,
    /// Encoded venue timestamp.
    pub timestamp: f64,
    /// Book side.
    pub side: Side,
}

/// Partial order mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// New visible quantity mantissa.
    pub quantity: f64,
    /// New encoded timestamp.
    pub timestamp: f64,
}

/// A single positional diff against the order book.
///
/// Indices are only meaningful relative to the book state immediately
/// before the diff is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderBookUpdate {
    /// Insert `order` at `new_index`.
    Insert {
        /// Order to insert.
        order: Order,
        /// Target position.
        new_index: usize,
    },
    /// Apply `update` to the order at `old_index` and move it to `new_index`.
    Update {
        /// Quantity/timestamp delta.
        update: OrderUpdate,
        /// Current position.
        old_index: usize,
        /// Position after the update.
        new_index: usize,
    },
    /// Remove the order at `old_index`.
    Remove {
        /// Position to remove.
        old_index: usize,
    },
}

impl OrderBookUpdate {
    /// Get the diff kind name for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
        }
    }
}
