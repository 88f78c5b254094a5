//! Persistence Adapters
//!
//! Implementations of the repository ports used by the binaries.

mod csv_trades;
mod log;

pub use csv_trades::{CSV_HEADER, CsvTradeRepository, format_trade_row};
pub use log::{LogOrderRepository, LogTradeRepository};
