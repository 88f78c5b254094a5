//! PDAX Monitor Binary
//!
//! Streams PDAX trades into the configured repository until interrupted.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin pdax-monitor
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `PDAX_USERNAME`, `PDAX_PASSWORD`: PDAX account
//! - `CAPTCHA_SOLVER_KEY`: 2captcha account key
//!
//! ## Optional
//! - `PDAX_WS_BOOK_PATH`: Bootstrap script (default: ./auxiliary/wsbook.json)
//! - `PDAX_CURRENCY_CODES_PATH`: Currency codes (default: ./auxiliary/currencyCodes.json)
//! - `PDAX_TRADES_CSV`: Append trades to this CSV file (default: log only)
//! - `PDAX_ORDER_BOOK_ENABLED`: Decode order book views (default: false)
//! - `PDAX_SHUTDOWN_DELAY_SECS`: Delay between signal and shutdown (default: 5)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use pdax_monitor::infrastructure::config::{MonitorConfig, load_currency_codes};
use pdax_monitor::infrastructure::pdax::{
    AuthSession, BootstrapScript, CaptchaSolver, PdaxFeedSource, PdaxFrameDecoder,
};
use pdax_monitor::infrastructure::persistence::{
    CsvTradeRepository, LogOrderRepository, LogTradeRepository,
};
use pdax_monitor::infrastructure::telemetry;
use pdax_monitor::{
    FeedSupervisor, OrderRepository, RecoveryPolicy, SystemClock, TradeReader, TradeRepository,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Upper bound on waiting for the supervisor after cancellation.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Err only if a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting PDAX monitor");

    let config = MonitorConfig::from_env()?;
    log_config(&config);

    let script = Arc::new(BootstrapScript::load(&config.feed.bootstrap_path)?);
    let currency_codes = load_currency_codes(&config.feed.currency_codes_path)?;
    tracing::info!(
        replay_frames = script.messages.len(),
        currency_codes = currency_codes.len(),
        "Auxiliary files loaded"
    );

    let trades: Arc<dyn TradeRepository> = match &config.feed.trades_csv {
        Some(path) => Arc::new(CsvTradeRepository::open(path)?),
        None => Arc::new(LogTradeRepository),
    };
    let orders: Arc<dyn OrderRepository> = Arc::new(LogOrderRepository);

    let source = PdaxFeedSource::new(
        AuthSession::new(config.auth.clone(), CaptchaSolver::new(config.captcha.clone())),
        config.session.clone(),
        script,
    );
    let decoder = PdaxFrameDecoder::new(TradeReader::new(currency_codes))
        .with_order_book(config.feed.order_book_enabled);

    let shutdown_token = CancellationToken::new();
    let supervisor = Arc::new(FeedSupervisor::new(
        Arc::new(source),
        Arc::new(decoder),
        trades,
        orders,
        Arc::new(SystemClock),
        RecoveryPolicy::new(config.recovery),
        shutdown_token.clone(),
    ));

    let supervisor_task = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move {
            tracing::info!("Trade monitoring is starting");
            supervisor.run().await;
            tracing::info!("Trade monitoring stopped");
        }
    });

    await_shutdown(shutdown_token, config.shutdown_delay).await;

    if tokio::time::timeout(SHUTDOWN_TIMEOUT, supervisor_task).await.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Supervisor did not stop in time"
        );
    }

    let stats = supervisor.stats();
    tracing::info!(
        attempts = stats.attempts,
        failures = stats.failures,
        frames = stats.frames,
        trades = stats.trades,
        "PDAX monitor stopped"
    );
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &MonitorConfig) {
    tracing::info!(
        username = config.auth.credentials.username(),
        trade_url = %config.session.url,
        order_book = config.feed.order_book_enabled,
        trades_csv = ?config.feed.trades_csv,
        "Configuration loaded"
    );
    tracing::debug!(
        login_url = %config.auth.login_url,
        refresh_url = %config.auth.refresh_url,
        captcha_service = %config.captcha.service_url,
        retry_delay_secs = config.recovery.retry_delay.as_secs(),
        maintenance_delay_secs = config.recovery.maintenance_delay.as_secs(),
        "Endpoints and recovery"
    );
}

/// Wait for SIGTERM or SIGINT, hold for `delay`, then cancel.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken, delay: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!(delay_secs = delay.as_secs(), "Received Ctrl+C, waiting before shutdown");
        }
        () = terminate => {
            tracing::info!(delay_secs = delay.as_secs(), "Received SIGTERM, waiting before shutdown");
        }
    }

    tokio::time::sleep(delay).await;
    shutdown_token.cancel();

    tracing::info!("Graceful shutdown started");
}
