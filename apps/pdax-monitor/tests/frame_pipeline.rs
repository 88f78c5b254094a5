//! Frame Pipeline Integration Tests
//!
//! Feeds venue-shaped binary frames through the real decoder and the
//! supervisor, and checks what lands in the repositories.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

mod common;

use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use common::{PAGE_RESET, PAGE_UPDATE, WireTrade, page, trade_page};
use parking_lot::Mutex;
use pdax_monitor::{
    Clock, FeedError, FeedEvent, FeedSource, FeedStream, FeedSupervisor, Frame, FrameDecoder,
    InMemoryOrderRepository, InMemoryTradeRepository, PdaxFrameDecoder, RecoveryConfig,
    RecoveryPolicy, TradeReader,
};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Helpers
// =============================================================================

fn reader() -> TradeReader {
    TradeReader::new(HashMap::from([
        (1, "BTC".to_string()),
        (2, "ETH".to_string()),
    ]))
}

fn two_trades() -> Vec<u8> {
    trade_page(
        PAGE_RESET,
        &[WireTrade::new(1.0, 12_345.0, 2), WireTrade::new(2.0, 9_876.0, 1)],
    )
}

/// One session per `open`, serving its frames in order.
struct ReplaySource {
    sessions: Mutex<VecDeque<Vec<Vec<u8>>>>,
}

struct ReplayStream {
    frames: VecDeque<Vec<u8>>,
}

#[async_trait]
impl FeedStream for ReplayStream {
    async fn read_frame(&mut self) -> Result<Frame, FeedError> {
        match self.frames.pop_front() {
            Some(frame) => Ok(Frame::Data(frame)),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {}
}

#[async_trait]
impl FeedSource for ReplaySource {
    async fn open(&self) -> Result<Box<dyn FeedStream>, FeedError> {
        let next = self.sessions.lock().pop_front();
        match next {
            Some(frames) => Ok(Box::new(ReplayStream {
                frames: frames.into(),
            })),
            None => std::future::pending().await,
        }
    }
}

struct NoonClock;

impl Clock for NoonClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }
}

struct Pipeline {
    supervisor: Arc<FeedSupervisor>,
    trades: Arc<InMemoryTradeRepository>,
    cancel: CancellationToken,
}

fn pipeline(sessions: Vec<Vec<Vec<u8>>>) -> Pipeline {
    let trades = Arc::new(InMemoryTradeRepository::new());
    let cancel = CancellationToken::new();
    let supervisor = Arc::new(FeedSupervisor::new(
        Arc::new(ReplaySource {
            sessions: Mutex::new(sessions.into()),
        }),
        Arc::new(PdaxFrameDecoder::new(reader())),
        trades.clone(),
        Arc::new(InMemoryOrderRepository::new()),
        Arc::new(NoonClock),
        RecoveryPolicy::new(RecoveryConfig::default()),
        cancel.clone(),
    ));
    Pipeline {
        supervisor,
        trades,
        cancel,
    }
}

// =============================================================================
// Decoder
// =============================================================================

#[test]
fn page_reset_yields_labelled_trades() {
    let decoder = PdaxFrameDecoder::new(reader());

    let Some(FeedEvent::Trades(trades)) = decoder.decode(&two_trades()).unwrap() else {
        panic!("expected trades");
    };

    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].currency_pair, "BTC-PHP");
    assert_eq!(trades[0].price, Decimal::from_str("123.45").unwrap());
    assert_eq!(trades[0].quantity, Decimal::from_str("1.5").unwrap());
    assert_eq!(
        trades[0].timestamp,
        Utc.with_ymd_and_hms(2021, 3, 15, 12, 0, 0).unwrap()
    );
    assert_eq!(trades[1].currency_pair, "ETH-PHP");
    assert_eq!(trades[1].price, Decimal::from_str("987.6").unwrap());
}

#[test]
fn page_update_decodes_the_same_way() {
    let decoder = PdaxFrameDecoder::new(reader());
    let frame = trade_page(PAGE_UPDATE, &[WireTrade::new(1.0, 100.0, 0)]);

    let Some(FeedEvent::Trades(trades)) = decoder.decode(&frame).unwrap() else {
        panic!("expected trades");
    };
    assert_eq!(trades[0].price, Decimal::from(100));
}

#[test]
fn unknown_currency_code_keeps_the_quote_suffix() {
    let decoder = PdaxFrameDecoder::new(reader());
    let frame = trade_page(PAGE_RESET, &[WireTrade::new(99.0, 100.0, 0)]);

    let Some(FeedEvent::Trades(trades)) = decoder.decode(&frame).unwrap() else {
        panic!("expected trades");
    };
    assert_eq!(trades[0].currency_pair, "-PHP");
}

#[test]
fn frames_outside_the_trade_view_are_ignored() {
    let decoder = PdaxFrameDecoder::new(reader());

    assert!(decoder.decode(&[9, 0, 0, 0, 0, 0, 0]).unwrap().is_none());
    assert!(decoder.decode(&page(PAGE_UPDATE, 7.0)).unwrap().is_none());
    assert!(decoder.decode(&trade_page(PAGE_RESET, &[])).unwrap().is_none());
}

#[test]
fn truncated_trade_frame_is_a_decode_error() {
    let decoder = PdaxFrameDecoder::new(reader());
    let mut frame = two_trades();
    frame.truncate(frame.len() - 3);

    assert!(matches!(decoder.decode(&frame), Err(FeedError::Decode(_))));
}

// =============================================================================
// Supervisor
// =============================================================================

#[tokio::test(start_paused = true)]
async fn supervisor_stores_every_decoded_trade() {
    let p = pipeline(vec![vec![
        two_trades(),
        vec![9, 0, 0, 0, 0, 0, 0],
        trade_page(PAGE_UPDATE, &[WireTrade::new(1.0, 12_400.0, 2)]),
    ]]);
    let handle = tokio::spawn({
        let supervisor = Arc::clone(&p.supervisor);
        async move { supervisor.run().await }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    let stored = p.trades.trades();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[2].price, Decimal::from_str("124.00").unwrap());

    p.cancel.cancel();
    handle.await.unwrap();

    let stats = p.supervisor.stats();
    assert_eq!(stats.frames, 3);
    assert_eq!(stats.trades, 3);
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_drops_the_session_not_the_stored_trades() {
    let mut broken = two_trades();
    broken.truncate(20);
    let p = pipeline(vec![
        vec![two_trades(), broken, two_trades()],
        vec![two_trades()],
    ]);
    let handle = tokio::spawn({
        let supervisor = Arc::clone(&p.supervisor);
        async move { supervisor.run().await }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(p.trades.trades().len(), 2);

    tokio::time::sleep(Duration::from_secs(15 * 60)).await;
    assert_eq!(p.trades.trades().len(), 4);

    p.cancel.cancel();
    handle.await.unwrap();
    assert_eq!(p.supervisor.stats().failures, 1);
    assert_eq!(p.supervisor.stats().attempts, 2);
}
