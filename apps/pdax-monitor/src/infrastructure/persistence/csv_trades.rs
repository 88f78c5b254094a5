//! CSV trade export.
//!
//! Rows are appended and flushed one at a time. The header is written only
//! when the file is empty, so repeated runs extend the same file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;

use crate::application::ports::{RepositoryError, TradeRepository};
use crate::domain::market::Trade;

/// Column names.
pub const CSV_HEADER: [&str; 5] = ["CurrencyPair", "Price", "Quantity", "TimeGMT+3", "Timestamp"];

/// Appends trades to a CSV file.
pub struct CsvTradeRepository {
    path: PathBuf,
    writer: Mutex<csv::Writer<File>>,
}

impl CsvTradeRepository {
    /// Open `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the file cannot be opened or the header
    /// cannot be written.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if empty {
            writer.write_record(CSV_HEADER).map_err(encode_error)?;
            writer.flush()?;
        }

        tracing::info!(path = %path.display(), new_file = empty, "Trade CSV opened");
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(writer),
        })
    }

    /// Output file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one trade and flush.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the row cannot be written.
    pub fn append(&self, trade: &Trade) -> Result<(), RepositoryError> {
        let mut writer = self.writer.lock();
        writer
            .write_record(format_trade_row(trade))
            .map_err(encode_error)?;
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for CsvTradeRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvTradeRepository")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TradeRepository for CsvTradeRepository {
    async fn insert(&self, trade: &Trade) -> Result<(), RepositoryError> {
        self.append(trade)
    }
}

/// Render a trade as CSV fields: pair, price and quantity with six decimals,
/// the time shifted to GMT+3, and unix seconds.
#[must_use]
pub fn format_trade_row(trade: &Trade) -> [String; 5] {
    let local = trade.timestamp + Duration::hours(3);
    [
        trade.currency_pair.clone(),
        format!("{:.6}", trade.price),
        format!("{:.6}", trade.quantity),
        local.format("%Y-%m-%d %H:%M:%S").to_string(),
        trade.timestamp.timestamp().to_string(),
    ]
}

fn encode_error(e: csv::Error) -> RepositoryError {
    RepositoryError::Encode(e.to_string())
}
