//! PDAX Trade History Export
//!
//! Fetches the venue's recent trade history once and appends the trades of
//! the last `PDAX_HISTORY_HOURS` hours to `PDAX_HISTORY_OUTPUT`.
//!
//! # Usage
//!
//! ```bash
//! PDAX_HISTORY_HOURS=48 cargo run --bin pdax-history
//! ```
//!
//! Uses the same login and bootstrap variables as `pdax-monitor`.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use pdax_monitor::infrastructure::config::{MonitorConfig, load_currency_codes};
use pdax_monitor::infrastructure::pdax::codec::{
    HISTORY_PAGE_SIZE, TradeReader, decode_history_frame, history_request,
};
use pdax_monitor::infrastructure::pdax::{
    AuthSession, BootstrapScript, CaptchaSolver, PdaxFeedSource,
};
use pdax_monitor::infrastructure::persistence::CsvTradeRepository;
use pdax_monitor::infrastructure::telemetry;
use pdax_monitor::{Frame, Trade};

/// Since-id asking for the newest page.
const NEWEST_PAGE: f64 = -1.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let _ = dotenvy::dotenv();
    let _telemetry_guard = telemetry::init();

    let config = MonitorConfig::from_env().context("invalid configuration")?;
    let script = BootstrapScript::load(&config.feed.bootstrap_path)?;
    let reader = TradeReader::new(load_currency_codes(&config.feed.currency_codes_path)?);

    let since = Utc::now() - chrono::Duration::from_std(config.history.lookback)?;
    let output = CsvTradeRepository::open(&config.history.output)
        .with_context(|| format!("cannot open {}", config.history.output.display()))?;

    let source = PdaxFeedSource::new(
        AuthSession::new(config.auth.clone(), CaptchaSolver::new(config.captcha.clone())),
        config.session.clone(),
        Arc::new(script),
    );
    let mut session = source.open_session().await?;
    tracing::info!(%since, "Signed in, requesting trade history");

    session
        .write_frame(history_request(NEWEST_PAGE, HISTORY_PAGE_SIZE)?)
        .await?;

    let written = loop {
        match session.read_frame().await? {
            Frame::Closed => {
                tracing::warn!("Connection closed before the history page arrived");
                break 0;
            }
            Frame::Data(data) => {
                if let Some(trades) = decode_history_frame(&reader, &data)? {
                    tracing::info!(received = trades.len(), "History page received");
                    break append_since(&output, &trades, since)?;
                }
            }
        }
    };

    session.close().await;
    tracing::info!(written, path = %output.path().display(), "Finished fetching trade history");
    Ok(())
}

/// Append trades, newest first, until the first one older than `since`.
fn append_since(
    output: &CsvTradeRepository,
    trades: &[Trade],
    since: DateTime<Utc>,
) -> anyhow::Result<usize> {
    let mut written = 0;
    for trade in trades.iter().take_while(|t| t.timestamp >= since) {
        output.append(trade)?;
        written += 1;
    }
    Ok(written)
}
