//! Time-and-sales records.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::{CodecError, TIME_SALES_TABLE, decode_timestamp, read_nullable};
use crate::domain::market::Trade;
use crate::infrastructure::pdax::cursor::ReadCursor;

/// Quote currency appended to every pair label.
pub const QUOTE_SUFFIX: &str = "-PHP";

/// Decodes trades, resolving instrument codes through a currency table.
#[derive(Debug, Clone, Default)]
pub struct TradeReader {
    currency_codes: Arc<HashMap<i64, String>>,
}

impl TradeReader {
    /// Create a reader over a currency table.
    #[must_use]
    pub fn new(currency_codes: HashMap<i64, String>) -> Self {
        Self {
            currency_codes: Arc::new(currency_codes),
        }
    }

    /// Label for an instrument code. Unknown codes keep only the suffix.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn label(&self, code: Option<f64>) -> String {
        let symbol = code
            .and_then(|code| self.currency_codes.get(&(code as i64)))
            .map_or("", String::as_str);
        format!("{symbol}{QUOTE_SUFFIX}")
    }

    /// Read one trade record in the history layout.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the frame is truncated, a decimal scale is
    /// out of range or the timestamp does not decode.
    pub fn read_trade(&self, cursor: &mut ReadCursor<'_>) -> Result<Trade, CodecError> {
        cursor.read_f64()?; // index
        cursor.read_f64()?; // id
        let timestamp = cursor.read_f64()?;
        cursor.read_u32()?; // timestamp tail
        let currency = read_nullable(cursor, ReadCursor::read_f64)?;

        let price = cursor.read_f64()?;
        let quantity = cursor.read_f64()?;

        // value and increment, order depends on the feed
        cursor.read_f64()?;
        cursor.read_f64()?;

        cursor.read_u8()?; // aggressor
        cursor.read_f64()?; // swing

        let price_decimals = cursor.read_u8()?;
        let quantity_decimals = cursor.read_u8()?;
        cursor.read_u8()?; // value decimals
        cursor.read_u8()?; // leverage event
        cursor.read_u32()?; // permissions

        Ok(Trade {
            currency_pair: self.label(currency.into_option()),
            price: to_decimal("price", price, price_decimals)?,
            quantity: to_decimal("quantity", quantity, quantity_decimals)?,
            timestamp: decode_timestamp(timestamp)?,
        })
    }

    /// Read one trade in the live layout: the history record followed by a
    /// fixed trailer of row-change fields, which is consumed and dropped.
    ///
    /// # Errors
    ///
    /// Same as [`read_trade`](Self::read_trade).
    pub fn read_live_trade(&self, cursor: &mut ReadCursor<'_>) -> Result<Trade, CodecError> {
        let trade = self.read_trade(cursor)?;

        cursor.read_u8()?; // update presence
        cursor.read_u8()?; // remove presence
        cursor.read_u8()?; // old index presence
        cursor.read_u8()?; // new index presence
        cursor.read_f64()?; // new index
        cursor.read_u8()?; // animate

        cursor.read_u8()?; // insert presence
        cursor.read_u8()?; // update presence
        cursor.read_u8()?; // remove presence
        cursor.read_f64()?; // remove
        cursor.read_u8()?; // old index presence
        cursor.read_f64()?; // old index
        cursor.read_u8()?; // new index presence
        cursor.read_u8()?; // animate

        Ok(trade)
    }

    /// Read the trades of a time-and-sales page payload.
    ///
    /// Entries come in pairs; each pair carries at most one trade, tagged
    /// with the time-and-sales table.
    ///
    /// # Errors
    ///
    /// Returns the first [`CodecError`] hit; no trades of the frame are
    /// returned in that case.
    pub fn read_live_trades(&self, cursor: &mut ReadCursor<'_>) -> Result<Vec<Trade>, CodecError> {
        cursor.read_f64()?; // page id
        cursor.read_u8()?; // first index presence, never followed by a value
        let count = cursor.read_u16()?;

        let mut trades = Vec::with_capacity(usize::from(count / 2));
        for _ in (0..count).step_by(2) {
            cursor.read_u8()?; // insert presence
            if cursor.read_u16()? == TIME_SALES_TABLE {
                cursor.read_u16()?; // row count
                trades.push(self.read_live_trade(cursor)?);
            }
        }

        Ok(trades)
    }
}

/// Build an exact decimal from a wire mantissa and its decimal places.
///
/// The mantissa is truncated toward zero first.
#[allow(clippy::cast_possible_truncation)]
fn to_decimal(field: &'static str, mantissa: f64, scale: u8) -> Result<Decimal, CodecError> {
    Decimal::try_new(mantissa.trunc() as i64, u32::from(scale))
        .map_err(|_| CodecError::InvalidScale { field, scale })
}
