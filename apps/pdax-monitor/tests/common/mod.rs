//! Frame builders shared by the integration tests.
//!
//! Encodes the PDAX record shapes the way the venue sends them: big-endian,
//! presence bytes in front of optional fields.

#![allow(dead_code)]

pub const PAGE_UPDATE: u8 = 35;
pub const PAGE_RESET: u8 = 36;
pub const TRADE_VIEW: f64 = 4.0;
pub const BTC_BOOK_VIEW: f64 = 16.0;
pub const TIME_SALES_TABLE: u16 = 128;
pub const ORDER_BOOK_TABLE: u16 = 27;

/// 2021-03-15T12:00:00Z in venue seconds.
pub const TRADE_TIME: f64 = 669_124_800.0;

/// One trade as it appears on the wire.
#[derive(Debug, Clone, Copy)]
pub struct WireTrade {
    pub currency: f64,
    pub price: f64,
    pub price_decimals: u8,
    pub quantity: f64,
    pub quantity_decimals: u8,
}

impl WireTrade {
    pub const fn new(currency: f64, price: f64, price_decimals: u8) -> Self {
        Self {
            currency,
            price,
            price_decimals,
            quantity: 15.0,
            quantity_decimals: 1,
        }
    }

    fn encode_core(&self, out: &mut Vec<u8>) {
        put_f64(out, 0.0); // index
        put_f64(out, 1.0); // id
        put_f64(out, TRADE_TIME);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.push(1);
        put_f64(out, self.currency);
        put_f64(out, self.price);
        put_f64(out, self.quantity);
        put_f64(out, 0.0); // value
        put_f64(out, 0.0); // increment
        out.push(0); // aggressor
        put_f64(out, 0.0); // swing
        out.push(self.price_decimals);
        out.push(self.quantity_decimals);
        out.push(2); // value decimals
        out.push(0); // leverage event
        out.extend_from_slice(&0u32.to_be_bytes());
    }

    fn encode_live(&self, out: &mut Vec<u8>) {
        self.encode_core(out);
        out.extend_from_slice(&[0, 0, 0, 1]);
        put_f64(out, 0.0); // new index
        out.extend_from_slice(&[0, 1, 0, 1]); // animate, insert, update, remove
        put_f64(out, 0.0); // remove id
        out.push(1);
        put_f64(out, 0.0); // old index
        out.extend_from_slice(&[0, 0]); // new index presence, animate
    }
}

pub fn put_f64(out: &mut Vec<u8>, value: f64) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Message header of a page message.
pub fn page(kind: u8, view_id: f64) -> Vec<u8> {
    let mut frame = vec![kind];
    frame.extend_from_slice(&42u32.to_be_bytes());
    frame.extend_from_slice(&1u16.to_be_bytes());
    put_f64(&mut frame, view_id);
    frame
}

/// A time-and-sales page carrying `trades`.
pub fn trade_page(kind: u8, trades: &[WireTrade]) -> Vec<u8> {
    let mut frame = page(kind, TRADE_VIEW);
    put_f64(&mut frame, 3.0); // page id
    frame.push(0);
    let count = u16::try_from(trades.len() * 2).unwrap();
    frame.extend_from_slice(&count.to_be_bytes());
    for trade in trades {
        frame.push(1);
        frame.extend_from_slice(&TIME_SALES_TABLE.to_be_bytes());
        frame.extend_from_slice(&1u16.to_be_bytes());
        trade.encode_live(&mut frame);
    }
    frame
}

/// One order book row. `side` 1 is a bid.
pub fn order_row(out: &mut Vec<u8>, price: f64, quantity: f64, side: u8) {
    put_f64(out, 0.0); // index
    put_f64(out, 9.0); // id
    put_f64(out, TRADE_TIME);
    out.extend_from_slice(&0u32.to_be_bytes());
    out.push(1);
    put_f64(out, 1.0); // instrument
    out.push(side);
    put_f64(out, price);
    out.push(2);
    put_f64(out, quantity);
    out.push(4);
    out.push(0); // flags
    put_f64(out, 1.0); // orders
    put_f64(out, 0.0); // general interest
    out.extend_from_slice(&[0, 0, 0, 0]); // tag, info
    put_f64(out, 1.0); // currency
    put_f64(out, 1.0); // transactions
    out.extend_from_slice(&0u32.to_be_bytes());
}

/// Insert batch of bid rows.
pub fn order_batch(out: &mut Vec<u8>, prices: &[f64]) {
    out.extend_from_slice(&ORDER_BOOK_TABLE.to_be_bytes());
    out.extend_from_slice(&u16::try_from(prices.len()).unwrap().to_be_bytes());
    for &price in prices {
        order_row(out, price, 1.0, 1);
    }
}

/// Order book page reset.
pub fn book_snapshot(prices: &[f64]) -> Vec<u8> {
    let mut frame = page(PAGE_RESET, BTC_BOOK_VIEW);
    put_f64(&mut frame, 3.0); // page id
    put_f64(&mut frame, 0.0); // first index
    frame.push(0);
    order_batch(&mut frame, prices);
    frame
}

/// One entry of an order book page update.
#[derive(Debug, Clone, Default)]
pub struct BookEntry {
    pub inserts: Vec<f64>,
    pub update: Option<(f64, f64)>,
    pub remove: bool,
    pub old_index: Option<f64>,
    pub new_index: Option<f64>,
}

/// Order book page update.
pub fn book_update(entries: &[BookEntry]) -> Vec<u8> {
    let mut frame = page(PAGE_UPDATE, BTC_BOOK_VIEW);
    put_f64(&mut frame, 3.0); // page id
    frame.push(0);
    frame.extend_from_slice(&u16::try_from(entries.len()).unwrap().to_be_bytes());

    for entry in entries {
        if entry.inserts.is_empty() {
            frame.push(0);
        } else {
            frame.push(1);
            order_batch(&mut frame, &entry.inserts);
        }

        match entry.update {
            Some((quantity, timestamp)) => {
                frame.push(1);
                frame.extend_from_slice(&ORDER_BOOK_TABLE.to_be_bytes());
                frame.extend_from_slice(&ORDER_BOOK_TABLE.to_be_bytes());
                frame.extend_from_slice(&1u16.to_be_bytes());
                frame.push(7);
                put_f64(&mut frame, 9.0); // id
                put_f64(&mut frame, timestamp);
                frame.extend_from_slice(&0u32.to_be_bytes());
                put_f64(&mut frame, quantity);
                put_f64(&mut frame, 1.0); // orders
            }
            None => frame.push(0),
        }

        if entry.remove {
            frame.push(1);
            put_f64(&mut frame, 9.0);
        } else {
            frame.push(0);
        }

        for index in [entry.old_index, entry.new_index] {
            match index {
                Some(value) => {
                    frame.push(1);
                    put_f64(&mut frame, value);
                }
                None => frame.push(0),
            }
        }
        frame.push(0); // animate
    }
    frame
}
