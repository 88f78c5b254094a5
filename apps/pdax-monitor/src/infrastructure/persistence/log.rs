//! Log-only repositories.

use async_trait::async_trait;

use crate::application::ports::{OrderRepository, RepositoryError, TradeRepository};
use crate::domain::market::{Order, Side, Trade};

/// Emits one structured log line per trade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTradeRepository;

#[async_trait]
impl TradeRepository for LogTradeRepository {
    async fn insert(&self, trade: &Trade) -> Result<(), RepositoryError> {
        tracing::info!(
            pair = %trade.currency_pair,
            price = %trade.price,
            quantity = %trade.quantity,
            timestamp = %trade.timestamp,
            "Trade"
        );
        Ok(())
    }
}

/// Emits a summary line per order book snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOrderRepository;

#[async_trait]
impl OrderRepository for LogOrderRepository {
    async fn insert(&self, orders: &[Order]) -> Result<(), RepositoryError> {
        let bids = orders.iter().filter(|o| o.side == Side::Bid).count();
        tracing::info!(
            orders = orders.len(),
            bids,
            asks = orders.len() - bids,
            "Order book snapshot"
        );
        Ok(())
    }
}
