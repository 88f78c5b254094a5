//! Feed Supervisor
//!
//! Owns the session loop: open a feed, pump frames through the decoder into
//! the repositories, and restart after any failure.
//!
//! # Session Attempt
//!
//! ```text
//! open (login, connect, bootstrap)
//!   -> loop { cancelled? -> read frame -> decode -> store / apply }
//!   -> close
//! ```
//!
//! Any error ends the attempt, as does a close frame from the venue. The
//! supervisor then waits for the delay chosen by [`RecoveryPolicy`] and starts
//! over. Only cancellation ends the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

use super::recovery::RecoveryPolicy;
use crate::application::ports::{
    Clock, FeedError, FeedEvent, FeedSource, FeedStream, Frame, FrameDecoder, OrderRepository,
    TradeRepository,
};
use crate::domain::order_book::OrderBookReplica;

/// How a session attempt ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptEnd {
    Cancelled,
    Closed,
}

/// Counters across all session attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    /// Sessions opened or attempted.
    pub attempts: u64,
    /// Attempts that ended with an error.
    pub failures: u64,
    /// Frames read.
    pub frames: u64,
    /// Trades handed to the trade repository.
    pub trades: u64,
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    failures: AtomicU64,
    frames: AtomicU64,
    trades: AtomicU64,
}

/// Restarting feed session loop.
pub struct FeedSupervisor {
    source: Arc<dyn FeedSource>,
    decoder: Arc<dyn FrameDecoder>,
    trades: Arc<dyn TradeRepository>,
    orders: Arc<dyn OrderRepository>,
    clock: Arc<dyn Clock>,
    recovery: RecoveryPolicy,
    cancel: CancellationToken,
    counters: Counters,
}

impl FeedSupervisor {
    /// Create a supervisor.
    #[must_use]
    pub fn new(
        source: Arc<dyn FeedSource>,
        decoder: Arc<dyn FrameDecoder>,
        trades: Arc<dyn TradeRepository>,
        orders: Arc<dyn OrderRepository>,
        clock: Arc<dyn Clock>,
        recovery: RecoveryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            decoder,
            trades,
            orders,
            clock,
            recovery,
            cancel,
            counters: Counters::default(),
        }
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> SupervisorStats {
        SupervisorStats {
            attempts: self.counters.attempts.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            frames: self.counters.frames.load(Ordering::Relaxed),
            trades: self.counters.trades.load(Ordering::Relaxed),
        }
    }

    /// Run sessions until cancelled.
    pub async fn run(&self) {
        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Feed supervisor cancelled");
                return;
            }

            let attempt = self.counters.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            match self.run_attempt().await {
                Ok(AttemptEnd::Cancelled) => {
                    tracing::info!(attempt, "Feed supervisor cancelled");
                    return;
                }
                Ok(AttemptEnd::Closed) => {
                    tracing::warn!(attempt, "PDAX closed the feed");
                }
                Err(e) => {
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(attempt, error = %e, "PDAX trade monitoring interrupted");
                }
            }

            let decision = self.recovery.decide(self.clock.now());
            tracing::info!(
                attempt,
                reason = decision.reason.as_str(),
                delay_secs = decision.delay.as_secs(),
                "Waiting before restarting the feed"
            );

            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("Feed supervisor cancelled during recovery delay");
                    return;
                }
                () = tokio::time::sleep(decision.delay) => {}
            }
        }
    }

    async fn run_attempt(&self) -> Result<AttemptEnd, FeedError> {
        let mut stream = tokio::select! {
            () = self.cancel.cancelled() => return Ok(AttemptEnd::Cancelled),
            opened = self.source.open() => opened?,
        };
        tracing::info!("PDAX feed streaming");

        let result = self.pump(stream.as_mut()).await;
        stream.close().await;
        result
    }

    async fn pump(&self, stream: &mut dyn FeedStream) -> Result<AttemptEnd, FeedError> {
        let mut replica = OrderBookReplica::new();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(AttemptEnd::Cancelled);
            }

            let frame = tokio::select! {
                () = self.cancel.cancelled() => return Ok(AttemptEnd::Cancelled),
                frame = stream.read_frame() => frame?,
            };

            match frame {
                Frame::Closed => return Ok(AttemptEnd::Closed),
                Frame::Data(data) => {
                    self.counters.frames.fetch_add(1, Ordering::Relaxed);
                    if let Some(event) = self.decoder.decode(&data)? {
                        self.dispatch(event, &mut replica).await?;
                    }
                }
            }
        }
    }

    async fn dispatch(
        &self,
        event: FeedEvent,
        replica: &mut OrderBookReplica,
    ) -> Result<(), FeedError> {
        match event {
            FeedEvent::Trades(trades) => {
                for trade in &trades {
                    if let Err(e) = self.trades.insert(trade).await {
                        tracing::error!(error = %e, pair = %trade.currency_pair, "Failed to store trade");
                    }
                }
                self.counters
                    .trades
                    .fetch_add(trades.len() as u64, Ordering::Relaxed);
            }
            FeedEvent::OrderBookSnapshot(orders) => {
                *replica = OrderBookReplica::from_orders(orders);
                tracing::debug!(orders = replica.len(), "Order book reset");
                if let Err(e) = self.orders.insert(replica.orders()).await {
                    tracing::error!(error = %e, "Failed to store order book");
                }
            }
            FeedEvent::OrderBookUpdates(updates) => {
                for update in updates {
                    replica.apply(update)?;
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for FeedSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSupervisor")
            .field("recovery", &self.recovery)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{InMemoryOrderRepository, InMemoryTradeRepository};
    use crate::application::services::RecoveryConfig;
    use crate::domain::market::{Order, OrderBookUpdate, Side, Trade};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Each frame byte selects a canned event: 1 = trade, 2 = snapshot,
    /// 3 = insert at 0, 4 = remove at 9, anything else = nothing.
    struct ByteDecoder;

    impl FrameDecoder for ByteDecoder {
        fn decode(&self, frame: &[u8]) -> Result<Option<FeedEvent>, FeedError> {
            Ok(match frame.first() {
                Some(1) => Some(FeedEvent::Trades(vec![trade()])),
                Some(2) => Some(FeedEvent::OrderBookSnapshot(vec![order(), order()])),
                Some(3) => Some(FeedEvent::OrderBookUpdates(vec![OrderBookUpdate::Insert {
                    order: order(),
                    new_index: 0,
                }])),
                Some(4) => Some(FeedEvent::OrderBookUpdates(vec![OrderBookUpdate::Remove {
                    old_index: 9,
                }])),
                Some(0xFF) => return Err(FeedError::Decode("bad frame".to_string())),
                _ => None,
            })
        }
    }

    fn trade() -> Trade {
        Trade {
            currency_pair: "BTC-PHP".to_string(),
            price: Decimal::new(12_345, 2),
            quantity: Decimal::ONE,
            timestamp: Utc.with_ymd_and_hms(2021, 3, 15, 12, 0, 0).unwrap(),
        }
    }

    fn order() -> Order {
        Order {
            price: 1.0,
            price_decimals: 2,
            quantity: 1.0,
            quantity_decimals: 4,
            timestamp: 0.0,
            side: Side::Bid,
        }
    }

    struct ScriptedStream {
        frames: VecDeque<Result<Frame, FeedError>>,
        closed: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl FeedStream for ScriptedStream {
        async fn read_frame(&mut self) -> Result<Frame, FeedError> {
            match self.frames.pop_front() {
                Some(frame) => frame,
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) {
            *self.closed.lock() += 1;
        }
    }

    /// Serves one scripted session per `open`, then pends forever.
    struct ScriptedSource {
        sessions: Mutex<VecDeque<Result<Vec<Result<Frame, FeedError>>, FeedError>>>,
        opened: Mutex<u32>,
        closed: Arc<Mutex<u32>>,
    }

    impl ScriptedSource {
        fn new(sessions: Vec<Result<Vec<Result<Frame, FeedError>>, FeedError>>) -> Arc<Self> {
            Arc::new(Self {
                sessions: Mutex::new(sessions.into()),
                opened: Mutex::new(0),
                closed: Arc::new(Mutex::new(0)),
            })
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedSource {
        async fn open(&self) -> Result<Box<dyn FeedStream>, FeedError> {
            let next = self.sessions.lock().pop_front();
            let Some(session) = next else {
                return std::future::pending().await;
            };
            let frames = session?;
            *self.opened.lock() += 1;
            Ok(Box::new(ScriptedStream {
                frames: frames.into(),
                closed: Arc::clone(&self.closed),
            }))
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct Harness {
        supervisor: Arc<FeedSupervisor>,
        trades: Arc<InMemoryTradeRepository>,
        orders: Arc<InMemoryOrderRepository>,
        cancel: CancellationToken,
    }

    fn harness(source: Arc<ScriptedSource>, hour: u32, minute: u32) -> Harness {
        let trades = Arc::new(InMemoryTradeRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let cancel = CancellationToken::new();
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap());
        let supervisor = Arc::new(FeedSupervisor::new(
            source,
            Arc::new(ByteDecoder),
            trades.clone(),
            orders.clone(),
            Arc::new(clock),
            RecoveryPolicy::new(RecoveryConfig::default()),
            cancel.clone(),
        ));
        Harness {
            supervisor,
            trades,
            orders,
            cancel,
        }
    }

    fn data(byte: u8) -> Result<Frame, FeedError> {
        Ok(Frame::Data(vec![byte]))
    }

    #[tokio::test(start_paused = true)]
    async fn stores_trades_and_snapshots() {
        let source = ScriptedSource::new(vec![Ok(vec![data(1), data(0), data(2), data(1)])]);
        let h = harness(source, 12, 0);
        let handle = tokio::spawn({
            let supervisor = Arc::clone(&h.supervisor);
            async move { supervisor.run().await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(h.trades.trades().len(), 2);
        assert_eq!(h.orders.snapshots().len(), 1);
        assert_eq!(h.orders.snapshots()[0].len(), 2);

        h.cancel.cancel();
        handle.await.unwrap();

        let stats = h.supervisor.stats();
        assert_eq!(stats.attempts, 1);
        assert_eq!(stats.frames, 4);
        assert_eq!(stats.trades, 2);
        assert_eq!(stats.failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn decode_error_restarts_after_retry_delay() {
        let source = ScriptedSource::new(vec![
            Ok(vec![data(1), data(0xFF), data(1)]),
            Ok(vec![data(1)]),
        ]);
        let h = harness(source.clone(), 12, 0);
        let handle = tokio::spawn({
            let supervisor = Arc::clone(&h.supervisor);
            async move { supervisor.run().await }
        });

        tokio::time::sleep(Duration::from_secs(14 * 60)).await;
        assert_eq!(*source.opened.lock(), 1);
        assert_eq!(*source.closed.lock(), 1);
        assert_eq!(h.trades.trades().len(), 1);

        tokio::time::sleep(Duration::from_secs(2 * 60)).await;
        assert_eq!(*source.opened.lock(), 2);
        assert_eq!(h.trades.trades().len(), 2);

        h.cancel.cancel();
        handle.await.unwrap();
        assert_eq!(h.supervisor.stats().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn maintenance_failure_waits_for_the_outage() {
        let source = ScriptedSource::new(vec![
            Err(FeedError::Transport("connection refused".to_string())),
            Ok(vec![]),
        ]);
        let h = harness(source.clone(), 23, 0);
        let handle = tokio::spawn({
            let supervisor = Arc::clone(&h.supervisor);
            async move { supervisor.run().await }
        });

        tokio::time::sleep(Duration::from_secs(34 * 60)).await;
        assert_eq!(*source.opened.lock(), 0);

        tokio::time::sleep(Duration::from_secs(2 * 60)).await;
        assert_eq!(*source.opened.lock(), 1);

        h.cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn venue_close_restarts() {
        let source = ScriptedSource::new(vec![Ok(vec![Ok(Frame::Closed)]), Ok(vec![])]);
        let h = harness(source.clone(), 12, 0);
        let handle = tokio::spawn({
            let supervisor = Arc::clone(&h.supervisor);
            async move { supervisor.run().await }
        });

        tokio::time::sleep(Duration::from_secs(16 * 60)).await;
        assert_eq!(*source.opened.lock(), 2);
        assert_eq!(h.supervisor.stats().failures, 0);

        h.cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn order_book_fault_ends_the_attempt() {
        let source = ScriptedSource::new(vec![Ok(vec![data(3), data(4), data(1)])]);
        let h = harness(source.clone(), 12, 0);
        let handle = tokio::spawn({
            let supervisor = Arc::clone(&h.supervisor);
            async move { supervisor.run().await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.trades.trades().is_empty());
        assert_eq!(*source.closed.lock(), 1);
        assert_eq!(h.supervisor.stats().failures, 1);

        h.cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_before_start_returns_immediately() {
        let source = ScriptedSource::new(vec![Ok(vec![data(1)])]);
        let h = harness(source.clone(), 12, 0);
        h.cancel.cancel();

        h.supervisor.run().await;
        assert_eq!(*source.opened.lock(), 0);
        assert_eq!(h.supervisor.stats().attempts, 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_blocked_read() {
        let source = ScriptedSource::new(vec![Ok(vec![])]);
        let h = harness(source.clone(), 12, 0);
        let handle = tokio::spawn({
            let supervisor = Arc::clone(&h.supervisor);
            async move { supervisor.run().await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        h.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*source.closed.lock(), 1);
    }
}
