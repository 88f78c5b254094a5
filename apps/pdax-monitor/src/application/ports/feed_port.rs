//! Feed Port (Driven Port)
//!
//! Interface to a live venue feed. A `FeedSource` produces one ready
//! `FeedStream` per session attempt: logged in, connected and bootstrapped.

use async_trait::async_trait;

use crate::domain::market::{Order, OrderBookUpdate, Trade};
use crate::domain::order_book::OrderBookError;

/// Errors that end a session attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeedError {
    /// Login or captcha solving failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Connecting, reading or writing failed.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The bootstrap handshake failed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    /// A frame could not be decoded.
    #[error("decode failure: {0}")]
    Decode(String),

    /// An order book diff did not fit the replica.
    #[error("order book fault: {0}")]
    OrderBook(#[from] OrderBookError),
}

/// One inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Binary payload.
    Data(Vec<u8>),
    /// The venue closed the connection.
    Closed,
}

/// Records decoded from one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Trades from the time-and-sales view.
    Trades(Vec<Trade>),
    /// Full order book, replacing any previous state.
    OrderBookSnapshot(Vec<Order>),
    /// Positional diffs, to be applied in order.
    OrderBookUpdates(Vec<OrderBookUpdate>),
}

/// An open, bootstrapped feed.
#[async_trait]
pub trait FeedStream: Send {
    /// Wait for the next inbound frame.
    async fn read_frame(&mut self) -> Result<Frame, FeedError>;

    /// Close the underlying connection.
    async fn close(&mut self);
}

/// Factory for feed sessions.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Log in, connect and bootstrap a new session.
    async fn open(&self) -> Result<Box<dyn FeedStream>, FeedError>;
}

/// Frame grammar of the venue.
pub trait FrameDecoder: Send + Sync {
    /// Decode one frame. Frames that carry nothing of interest yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Decode`] when the frame is truncated or malformed.
    fn decode(&self, frame: &[u8]) -> Result<Option<FeedEvent>, FeedError>;
}
