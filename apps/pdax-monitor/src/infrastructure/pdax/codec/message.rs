//! Top-level message header.

use super::{CodecError, PAGE_RESET, PAGE_UPDATE};
use crate::infrastructure::pdax::cursor::ReadCursor;

/// Routing fields of a page message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageHeader {
    /// Message id.
    pub message_id: u32,
    /// Sequence number.
    pub sequence: u16,
    /// View the payload belongs to.
    pub view_id: f64,
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageHeader {
    /// Message type tag.
    pub kind: u8,
    /// Routing fields, present for page update and page reset messages.
    pub page: Option<PageHeader>,
}

impl MessageHeader {
    /// Check if this is a page reset message.
    #[must_use]
    pub const fn is_reset(&self) -> bool {
        self.kind == PAGE_RESET
    }

    /// View id of page messages.
    #[must_use]
    pub fn view_id(&self) -> Option<f64> {
        self.page.map(|page| page.view_id)
    }
}

/// Decode the message type and, for page messages, the routing fields.
///
/// Leaves the cursor at the start of the view payload.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the frame is shorter than its header.
pub fn decode_header(cursor: &mut ReadCursor<'_>) -> Result<MessageHeader, CodecError> {
    let kind = cursor.read_u8()?;
    let page = if kind == PAGE_UPDATE || kind == PAGE_RESET {
        Some(PageHeader {
            message_id: cursor.read_u32()?,
            sequence: cursor.read_u16()?,
            view_id: cursor.read_f64()?,
        })
    } else {
        None
    };

    Ok(MessageHeader { kind, page })
}
