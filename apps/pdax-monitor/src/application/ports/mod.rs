//! Port Interfaces
//!
//! Contracts between the supervisor and the outside world.
//!
//! ## Driven Ports (Outbound)
//!
//! - `FeedSource` / `FeedStream`: an authenticated, bootstrapped venue feed
//! - `FrameDecoder`: turns raw frames into feed events
//! - `TradeRepository` / `OrderRepository`: storage for decoded records
//! - `Clock`: wall-clock time for maintenance-window decisions

mod clock_port;
mod feed_port;
mod repository_port;

pub use clock_port::{Clock, SystemClock};
pub use feed_port::{FeedError, FeedEvent, FeedSource, FeedStream, Frame, FrameDecoder};
pub use repository_port::{
    InMemoryOrderRepository, InMemoryTradeRepository, OrderRepository, RepositoryError,
    TradeRepository,
};
