//! Application Layer - Ports and the feed supervisor.
//!
//! This layer defines how the supervisor talks to the venue feed and to
//! storage, and owns the per-session order book state.

/// Port interfaces for the feed, storage and clock.
pub mod ports;

/// Feed supervision and recovery.
pub mod services;
