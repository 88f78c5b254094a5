//! Trade history page.
//!
//! A history fetch is a single request frame; the venue answers with a page
//! reset on the time-and-sales view holding the newest trades first.

use super::{
    CodecError, PAGE_RESET, TIME_SALES_TABLE, TRADE_VIEW_ID, TradeReader, decode_header,
};
use crate::domain::market::Trade;
use crate::infrastructure::pdax::cursor::{ReadCursor, WriteCursor};

/// Recorded request header asking for the time-and-sales page.
const HISTORY_REQUEST_PREFIX: [u8; 29] = [
    0x1C, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x09, b'T', b'i', b'm', b'e', b's', b't', b'a', b'm', b'p', 0xFF,
];

/// Width of the request parameters: since-id f64, flag u8, page size u16.
const HISTORY_PARAMETERS_LEN: usize = 11;

/// History pages are always larger than this; smaller frames are skipped.
pub const HISTORY_FRAME_MIN_LEN: usize = 50_000;

/// Trades per history request. Covers everything the venue keeps.
pub const HISTORY_PAGE_SIZE: u16 = 10_000;

/// Build a history request frame.
///
/// `since_id` of `-1.0` asks for the newest page.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the parameters overrun their block.
pub fn history_request(since_id: f64, page_size: u16) -> Result<Vec<u8>, CodecError> {
    let mut parameters = [0u8; HISTORY_PARAMETERS_LEN];
    let mut cursor = WriteCursor::new(&mut parameters);
    cursor.write_f64(since_id)?;
    cursor.write_u8(0x01)?;
    cursor.write_u16(page_size)?;

    let mut frame = Vec::with_capacity(HISTORY_REQUEST_PREFIX.len() + HISTORY_PARAMETERS_LEN);
    frame.extend_from_slice(&HISTORY_REQUEST_PREFIX);
    frame.extend_from_slice(&parameters);
    Ok(frame)
}

/// Decode a history page.
///
/// Returns `Ok(None)` for any frame that is not a history page: too short,
/// not a page reset, another view or another table.
///
/// # Errors
///
/// Returns [`CodecError`] if a history page fails to decode.
pub fn decode_history_frame(
    reader: &TradeReader,
    frame: &[u8],
) -> Result<Option<Vec<Trade>>, CodecError> {
    if frame.len() <= HISTORY_FRAME_MIN_LEN {
        return Ok(None);
    }

    let mut cursor = ReadCursor::new(frame);
    let header = decode_header(&mut cursor)?;
    if !header.is_reset() || header.view_id() != Some(TRADE_VIEW_ID) {
        return Ok(None);
    }

    cursor.read_f64()?; // page id
    cursor.read_f64()?; // first index
    cursor.read_u8()?; // animate
    if cursor.read_u16()? != TIME_SALES_TABLE {
        return Ok(None);
    }

    let count = cursor.read_u16()?;
    let trades = (0..count)
        .map(|_| reader.read_trade(&mut cursor))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(trades))
}
