//! Domain Layer - Market records and order book state.
//!
//! This layer contains the decoded market data types and the positional
//! order book replica. Nothing here performs I/O.

/// Trade and order book record types.
pub mod market;

/// Positional order book replica.
pub mod order_book;
