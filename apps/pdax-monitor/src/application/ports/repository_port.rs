//! Repository Ports (Driven Ports)
//!
//! Storage for decoded records. Failures are reported to the caller, which
//! logs them; nothing here is retried.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::market::{Order, Trade};

/// Storage failure.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded.
    #[error("record encoding error: {0}")]
    Encode(String),
}

/// Storage for trades.
#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// Store one trade.
    async fn insert(&self, trade: &Trade) -> Result<(), RepositoryError>;
}

/// Storage for order book snapshots.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Store the full current book.
    async fn insert(&self, orders: &[Order]) -> Result<(), RepositoryError>;
}

/// In-memory trade storage for testing.
#[derive(Debug, Default)]
pub struct InMemoryTradeRepository {
    trades: Mutex<Vec<Trade>>,
}

impl InMemoryTradeRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all stored trades, in insertion order.
    #[must_use]
    pub fn trades(&self) -> Vec<Trade> {
        self.trades.lock().clone()
    }
}

#[async_trait]
impl TradeRepository for InMemoryTradeRepository {
    async fn insert(&self, trade: &Trade) -> Result<(), RepositoryError> {
        self.trades.lock().push(trade.clone());
        Ok(())
    }
}

/// In-memory snapshot storage for testing.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    snapshots: Mutex<Vec<Vec<Order>>>,
}

impl InMemoryOrderRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all stored snapshots, in insertion order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<Vec<Order>> {
        self.snapshots.lock().clone()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, orders: &[Order]) -> Result<(), RepositoryError> {
        self.snapshots.lock().push(orders.to_vec());
        Ok(())
    }
}
