//! Order book records.
//!
//! Snapshots arrive as page resets on an order book view; afterwards page
//! updates carry positional diffs. Indices in a diff are relative to the
//! book state right before that diff.

use super::{CodecError, ORDER_BOOK_TABLE, read_nullable, to_index};
use crate::domain::market::{Order, OrderBookUpdate, OrderUpdate, Side};
use crate::infrastructure::pdax::cursor::ReadCursor;

/// Read one order book row.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the frame ends inside the row.
pub fn read_order(cursor: &mut ReadCursor<'_>) -> Result<Order, CodecError> {
    cursor.read_f64()?; // index
    cursor.read_f64()?; // id
    let timestamp = cursor.read_f64()?;
    cursor.read_u32()?; // timestamp tail
    read_nullable(cursor, ReadCursor::read_f64)?; // instrument
    let side = Side::from_wire(cursor.read_u8()?);
    let price = cursor.read_f64()?;
    let price_decimals = cursor.read_u8()?;
    let quantity = cursor.read_f64()?;
    let quantity_decimals = cursor.read_u8()?;
    cursor.read_u8()?; // flags
    cursor.read_f64()?; // orders
    cursor.read_f64()?; // general interest

    // tag and info are always empty; only their length words are on the wire
    cursor.advance(2)?;
    cursor.advance(2)?;

    cursor.read_f64()?; // currency
    cursor.read_f64()?; // transaction count
    cursor.read_u32()?; // permissions

    Ok(Order {
        price,
        price_decimals,
        quantity,
        quantity_decimals,
        timestamp,
        side,
    })
}

/// Read a table-tagged batch of rows.
///
/// Only the order book table carries rows; any other table yields an empty
/// batch.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the frame ends inside the batch.
pub fn read_insert_batch(cursor: &mut ReadCursor<'_>) -> Result<Vec<Order>, CodecError> {
    if cursor.read_u16()? != ORDER_BOOK_TABLE {
        return Ok(Vec::new());
    }

    let count = cursor.read_u16()?;
    (0..count).map(|_| read_order(cursor)).collect()
}

/// Read a partial row change (quantity and timestamp).
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the frame ends inside the change.
pub fn read_order_update(cursor: &mut ReadCursor<'_>) -> Result<OrderUpdate, CodecError> {
    cursor.read_u16()?; // table
    cursor.read_u16()?; // column list table
    let columns = cursor.read_u16()?;
    cursor.advance(usize::from(columns))?; // one index byte per column

    cursor.read_f64()?; // id
    let timestamp = cursor.read_f64()?;
    cursor.read_u32()?; // timestamp tail
    let quantity = cursor.read_f64()?;
    cursor.read_f64()?; // orders

    Ok(OrderUpdate {
        quantity,
        timestamp,
    })
}

/// Read the diffs of an order book page update, in application order.
///
/// Per entry: one insert per row of the insert batch (all at the entry's new
/// index), then a remove if a remove id was present, then an update if an
/// update was present. Absent indices read as 0.
///
/// # Errors
///
/// Returns [`CodecError`] if the frame is truncated or an index is not a
/// valid position.
pub fn read_order_book_updates(
    cursor: &mut ReadCursor<'_>,
) -> Result<Vec<OrderBookUpdate>, CodecError> {
    cursor.read_f64()?; // page id
    cursor.read_u8()?; // first index presence, never followed by a value
    let count = cursor.read_u16()?;

    let mut updates = Vec::new();
    for _ in 0..count {
        let inserts = read_nullable(cursor, read_insert_batch)?
            .into_option()
            .unwrap_or_default();
        let update = read_nullable(cursor, read_order_update)?.into_option();
        let remove = read_nullable(cursor, ReadCursor::read_f64)?;
        let old_index = read_nullable(cursor, ReadCursor::read_f64)?
            .into_option()
            .unwrap_or_default();
        let new_index = read_nullable(cursor, ReadCursor::read_f64)?
            .into_option()
            .unwrap_or_default();
        cursor.read_u8()?; // animate

        let old_index = to_index("old", old_index)?;
        let new_index = to_index("new", new_index)?;

        updates.extend(
            inserts
                .into_iter()
                .map(|order| OrderBookUpdate::Insert { order, new_index }),
        );
        if remove.is_present() {
            updates.push(OrderBookUpdate::Remove { old_index });
        }
        if let Some(update) = update {
            updates.push(OrderBookUpdate::Update {
                update,
                old_index,
                new_index,
            });
        }
    }

    Ok(updates)
}

/// Read an order book page reset. Rows are returned in book order.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] if the frame ends inside the snapshot.
pub fn read_order_book_snapshot(cursor: &mut ReadCursor<'_>) -> Result<Vec<Order>, CodecError> {
    cursor.read_f64()?; // page id
    cursor.read_f64()?; // first index
    cursor.read_u8()?; // animate
    read_insert_batch(cursor)
}
