//! PDAX Frame Codec
//!
//! Decoders for the record shapes PDAX pushes over its trading WebSocket.
//!
//! # Frame layout
//!
//! ```text
//! u8   message type        35 = page update, 36 = page reset
//! u32  message id          (page messages only)
//! u16  sequence number     (page messages only)
//! f64  view id             4 = time and sales, 16/21 = order books
//! ...  view payload
//! ```
//!
//! Optional fields are preceded by a presence byte: 0 means the field is
//! absent and not on the wire, anything else means it follows at its fixed
//! width. Presence is decoded once into [`Nullable`].

pub mod history;
pub mod message;
pub mod order_book;
pub mod timestamp;
pub mod trade;

pub use history::{HISTORY_FRAME_MIN_LEN, HISTORY_PAGE_SIZE, decode_history_frame, history_request};
pub use message::{MessageHeader, PageHeader, decode_header};
pub use order_book::{
    read_insert_batch, read_order, read_order_book_snapshot, read_order_book_updates,
    read_order_update,
};
pub use timestamp::decode_timestamp;
pub use trade::{QUOTE_SUFFIX, TradeReader};

use super::cursor::{CursorError, ReadCursor};

/// Message type of incremental page messages.
pub const PAGE_UPDATE: u8 = 35;

/// Message type of full page messages.
pub const PAGE_RESET: u8 = 36;

/// View id of the time-and-sales panel.
pub const TRADE_VIEW_ID: f64 = 4.0;

/// View ids of the order book panels (BTC, ETH).
pub const ORDER_BOOK_VIEW_IDS: [f64; 2] = [16.0, 21.0];

/// Table kind of order book rows.
pub const ORDER_BOOK_TABLE: u16 = 27;

/// Table kind of time-and-sales rows.
pub const TIME_SALES_TABLE: u16 = 128;

/// Errors raised while decoding a frame.
///
/// Any of these aborts the frame; nothing decoded from it is surfaced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Frame ended before the record did.
    #[error("truncated frame: {0}")]
    Truncated(#[from] CursorError),

    /// A position field is not a usable index.
    #[error("invalid {field} index: {value}")]
    InvalidIndex {
        /// Field name.
        field: &'static str,
        /// Raw wire value.
        value: f64,
    },

    /// A decimal-place count exceeds what a decimal can carry.
    #[error("invalid {field} scale: {scale}")]
    InvalidScale {
        /// Field name.
        field: &'static str,
        /// Raw decimal-place count.
        scale: u8,
    },

    /// A timestamp does not map to a calendar instant.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(f64),
}

/// A presence-prefixed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullable<T> {
    /// Presence byte was 0; the field is not on the wire.
    Absent,
    /// Presence byte was non-zero; the field followed.
    Present(T),
}

impl<T> Nullable<T> {
    /// Check if the field was present.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// Convert into an `Option`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Absent => None,
            Self::Present(value) => Some(value),
        }
    }
}

/// Read a presence byte and, when set, the field behind it.
///
/// # Errors
///
/// Propagates the error of the presence byte or the field reader.
pub fn read_nullable<'a, T, E>(
    cursor: &mut ReadCursor<'a>,
    read: impl FnOnce(&mut ReadCursor<'a>) -> Result<T, E>,
) -> Result<Nullable<T>, E>
where
    E: From<CursorError>,
{
    if cursor.read_u8()? == 0 {
        Ok(Nullable::Absent)
    } else {
        read(cursor).map(Nullable::Present)
    }
}

/// Convert a wire index (sent as `f64`) into a position.
///
/// # Errors
///
/// Returns [`CodecError::InvalidIndex`] for negative or non-finite values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_index(field: &'static str, value: f64) -> Result<usize, CodecError> {
    if !value.is_finite() || value < 0.0 || value >= 4_294_967_296.0 {
        return Err(CodecError::InvalidIndex { field, value });
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_field_is_not_read() {
        let data = [0u8, 0xFF];
        let mut cursor = ReadCursor::new(&data);
        let field = read_nullable(&mut cursor, ReadCursor::read_u8).unwrap();
        assert_eq!(field, Nullable::Absent);
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn present_field_is_read_at_width() {
        let data = [2u8, 0x00, 0x2A];
        let mut cursor = ReadCursor::new(&data);
        let field = read_nullable(&mut cursor, ReadCursor::read_u16).unwrap();
        assert_eq!(field, Nullable::Present(42));
        assert!(field.is_present());
        assert_eq!(field.into_option(), Some(42));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn index_conversion() {
        assert_eq!(to_index("new", 7.0).unwrap(), 7);
        assert!(to_index("new", -1.0).is_err());
        assert!(to_index("new", f64::NAN).is_err());
        assert!(to_index("old", f64::INFINITY).is_err());
    }
}
