#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::cast_possible_truncation,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! PDAX Monitor - Market Data Feed Ingestion
//!
//! Logs in to PDAX through its captcha-guarded web flow, replays the
//! recorded WebSocket handshake, and decodes the venue's big-endian binary
//! feed into trades and order book diffs.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Market records and the positional order book replica
//!   - `market`: trades, orders, order book diffs
//!   - `order_book`: replica rebuilt from positional diffs
//!
//! - **Application**: Port definitions and the supervisor
//!   - `ports`: feed, decoder, repository and clock interfaces
//!   - `services`: restart loop and maintenance-aware recovery policy
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `pdax`: captcha, login, session, heartbeat, binary codec
//!   - `persistence`: CSV and log repositories
//!   - `config`: environment configuration, currency code table
//!   - `telemetry`: tracing subscriber, optional OTLP export
//!
//! # Data Flow
//!
//! ```text
//! 2captcha -> login -> token
//!                        |
//! PDAX WS <- bootstrap <-+
//!    |
//!    +-> frames -> PdaxFrameDecoder -> trades  -> TradeRepository
//!                                   -> books   -> OrderBookReplica -> OrderRepository
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Market types with no I/O.
pub mod domain;

/// Application layer - Ports and the feed supervisor.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::market::{Order, OrderBookUpdate, OrderUpdate, Side, Trade};
pub use domain::order_book::{OrderBookError, OrderBookReplica};

// Ports and services
pub use application::ports::{
    Clock, FeedError, FeedEvent, FeedSource, FeedStream, Frame, FrameDecoder,
    InMemoryOrderRepository, InMemoryTradeRepository, OrderRepository, RepositoryError,
    SystemClock, TradeRepository,
};
pub use application::services::{
    FeedSupervisor, RecoveryConfig, RecoveryPolicy, RecoveryReason, SupervisorStats,
};

// Infrastructure config
pub use infrastructure::config::{ConfigError, MonitorConfig, load_currency_codes};

// PDAX adapters
pub use infrastructure::pdax::codec::TradeReader;
pub use infrastructure::pdax::{
    AuthSession, BootstrapScript, CaptchaSolver, FeedSession, PdaxFeedSource, PdaxFrameDecoder,
};

// Persistence
pub use infrastructure::persistence::{CsvTradeRepository, LogOrderRepository, LogTradeRepository};

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
