//! Frame Dispatch
//!
//! Routes page messages to the record decoders by view id. Trades are always
//! decoded; order book views only when the order book pipeline is enabled.

use super::codec::{
    CodecError, ORDER_BOOK_VIEW_IDS, TRADE_VIEW_ID, TradeReader, decode_header,
    read_order_book_snapshot, read_order_book_updates,
};
use super::cursor::ReadCursor;
use crate::application::ports::{FeedError, FeedEvent, FrameDecoder};

/// Decoder for PDAX trading UI frames.
#[derive(Debug, Clone, Default)]
pub struct PdaxFrameDecoder {
    trades: TradeReader,
    order_book_enabled: bool,
}

impl PdaxFrameDecoder {
    /// Create a decoder that surfaces trades only.
    #[must_use]
    pub const fn new(trades: TradeReader) -> Self {
        Self {
            trades,
            order_book_enabled: false,
        }
    }

    /// Enable or disable order book decoding.
    #[must_use]
    pub const fn with_order_book(mut self, enabled: bool) -> Self {
        self.order_book_enabled = enabled;
        self
    }

    #[allow(clippy::float_cmp)]
    fn decode_frame(&self, frame: &[u8]) -> Result<Option<FeedEvent>, CodecError> {
        let mut cursor = ReadCursor::new(frame);
        let header = decode_header(&mut cursor)?;
        let Some(view_id) = header.view_id() else {
            return Ok(None);
        };

        if view_id == TRADE_VIEW_ID {
            let trades = self.trades.read_live_trades(&mut cursor)?;
            return Ok((!trades.is_empty()).then_some(FeedEvent::Trades(trades)));
        }

        if self.order_book_enabled && ORDER_BOOK_VIEW_IDS.contains(&view_id) {
            let event = if header.is_reset() {
                FeedEvent::OrderBookSnapshot(read_order_book_snapshot(&mut cursor)?)
            } else {
                FeedEvent::OrderBookUpdates(read_order_book_updates(&mut cursor)?)
            };
            return Ok(Some(event));
        }

        Ok(None)
    }
}

impl FrameDecoder for PdaxFrameDecoder {
    fn decode(&self, frame: &[u8]) -> Result<Option<FeedEvent>, FeedError> {
        self.decode_frame(frame).map_err(|e| {
            tracing::warn!(error = %e, len = frame.len(), "Failed to decode PDAX frame");
            FeedError::Decode(e.to_string())
        })
    }
}
