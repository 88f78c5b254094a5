//! Monitor Configuration Settings
//!
//! Configuration types for the monitor, loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::application::services::RecoveryConfig;
use crate::infrastructure::pdax::auth::{DEFAULT_AUTH_REFRESH_URL, DEFAULT_AUTH_URL};
use crate::infrastructure::pdax::captcha::DEFAULT_SERVICE_URL;
use crate::infrastructure::pdax::session::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_TRADE_URL};
use crate::infrastructure::pdax::{
    AuthConfig, CaptchaConfig, Credentials, HeartbeatConfig, SessionConfig,
};

/// Default sign-in page the captcha is solved for.
pub const DEFAULT_CAPTCHA_TASK_URL: &str = "https://trade.pdax.ph/signin";

/// Default reCAPTCHA site key of the sign-in page.
pub const DEFAULT_CAPTCHA_TASK_KEY: &str = "6Lcj_WQUAAAAAH7U8sEordiEHPEJDdVzoKQiH7Oa";

/// Feed input and output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSettings {
    /// Bootstrap script file.
    pub bootstrap_path: PathBuf,
    /// Currency code table file.
    pub currency_codes_path: PathBuf,
    /// CSV file trades are appended to; trades are only logged when unset.
    pub trades_csv: Option<PathBuf>,
    /// Decode order book views.
    pub order_book_enabled: bool,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            bootstrap_path: PathBuf::from("./auxiliary/wsbook.json"),
            currency_codes_path: PathBuf::from("./auxiliary/currencyCodes.json"),
            trades_csv: None,
            order_book_enabled: false,
        }
    }
}

/// Trade history export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySettings {
    /// How far back to export.
    pub lookback: Duration,
    /// Output CSV file.
    pub output: PathBuf,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            lookback: Duration::from_secs(24 * 3600),
            output: PathBuf::from("volume-pdax-history.csv"),
        }
    }
}

/// Complete monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Login endpoints and account.
    pub auth: AuthConfig,
    /// Captcha solver.
    pub captcha: CaptchaConfig,
    /// WebSocket session.
    pub session: SessionConfig,
    /// Feed files and switches.
    pub feed: FeedSettings,
    /// Restart delays.
    pub recovery: RecoveryConfig,
    /// History export.
    pub history: HistorySettings,
    /// Grace period between a shutdown signal and cancellation.
    pub shutdown_delay: Duration,
}

impl MonitorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let credentials = Credentials::new(env.required("PDAX_USERNAME")?, env.required("PDAX_PASSWORD")?);
        let solver_key = env.required("CAPTCHA_SOLVER_KEY")?;

        let auth = AuthConfig {
            login_url: env.string_or("PDAX_AUTH_URL", DEFAULT_AUTH_URL),
            refresh_url: env.string_or("PDAX_AUTH_REFRESH_URL", DEFAULT_AUTH_REFRESH_URL),
            credentials,
        };

        let captcha = CaptchaConfig::new(
            env.string_or("CAPTCHA_SERVICE_URL", DEFAULT_SERVICE_URL),
            solver_key,
            env.string_or("CAPTCHA_TASK_KEY", DEFAULT_CAPTCHA_TASK_KEY),
            env.string_or("CAPTCHA_TASK_URL", DEFAULT_CAPTCHA_TASK_URL),
        );

        let heartbeat = HeartbeatConfig::default();
        let session = SessionConfig {
            url: env.string_or("PDAX_TRADE_URL", DEFAULT_TRADE_URL),
            connect_timeout: env.secs_or("PDAX_SESSION_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT),
            heartbeat: HeartbeatConfig::new(
                env.secs_or("PDAX_HEARTBEAT_INITIAL_DELAY_SECS", heartbeat.initial_delay),
                env.secs_or("PDAX_HEARTBEAT_INTERVAL_SECS", heartbeat.interval),
            ),
        };

        let defaults = FeedSettings::default();
        let feed = FeedSettings {
            bootstrap_path: env.path_or("PDAX_WS_BOOK_PATH", defaults.bootstrap_path),
            currency_codes_path: env.path_or("PDAX_CURRENCY_CODES_PATH", defaults.currency_codes_path),
            trades_csv: env.non_empty("PDAX_TRADES_CSV").map(PathBuf::from),
            order_book_enabled: env.flag_or("PDAX_ORDER_BOOK_ENABLED", defaults.order_book_enabled),
        };

        let defaults = RecoveryConfig::default();
        let recovery = RecoveryConfig {
            retry_delay: env.mins_or("PDAX_RETRY_DELAY_MINS", defaults.retry_delay),
            maintenance_delay: env.mins_or("PDAX_MAINTENANCE_DELAY_MINS", defaults.maintenance_delay),
        };

        let defaults = HistorySettings::default();
        let history = HistorySettings {
            lookback: env
                .parse::<u64>("PDAX_HISTORY_HOURS")
                .map_or(defaults.lookback, |hours| Duration::from_secs(hours * 3600)),
            output: env.path_or("PDAX_HISTORY_OUTPUT", defaults.output),
        };

        Ok(Self {
            auth,
            captcha,
            session,
            feed,
            recovery,
            history,
            shutdown_delay: env.secs_or("PDAX_SHUTDOWN_DELAY_SECS", Duration::from_secs(5)),
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// A configuration file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File path.
        path: PathBuf,
        /// I/O error.
        source: std::io::Error,
    },
    /// The currency code table is not valid JSON.
    #[error("invalid currency code table {}: {source}", path.display())]
    CurrencyCodes {
        /// File path.
        path: PathBuf,
        /// Parse error.
        source: serde_json::Error,
    },
    /// A currency code key is not an integer.
    #[error("invalid currency code {0:?}")]
    InvalidCurrencyCode(String),
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        let value = (self.0)(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
        if value.is_empty() {
            return Err(ConfigError::EmptyValue(key.to_string()));
        }
        Ok(value)
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.non_empty(key).unwrap_or_else(|| default.to_string())
    }

    fn path_or(&self, key: &str, default: PathBuf) -> PathBuf {
        self.non_empty(key).map_or(default, PathBuf::from)
    }

    fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        (self.0)(key).and_then(|v| v.trim().parse().ok())
    }

    fn flag_or(&self, key: &str, default: bool) -> bool {
        (self.0)(key).map_or(default, |v| {
            matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
        })
    }

    fn secs_or(&self, key: &str, default: Duration) -> Duration {
        self.parse::<u64>(key).map_or(default, Duration::from_secs)
    }

    fn mins_or(&self, key: &str, default: Duration) -> Duration {
        self.parse::<u64>(key)
            .map_or(default, |mins| Duration::from_secs(mins * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<MonitorConfig, ConfigError> {
        let mut env: HashMap<String, String> = HashMap::from([
            ("PDAX_USERNAME".to_string(), "trader".to_string()),
            ("PDAX_PASSWORD".to_string(), "hunter2".to_string()),
            ("CAPTCHA_SOLVER_KEY".to_string(), "solver".to_string()),
        ]);
        for (key, value) in vars {
            env.insert((*key).to_string(), (*value).to_string());
        }
        MonitorConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.auth.login_url, DEFAULT_AUTH_URL);
        assert_eq!(config.auth.refresh_url, DEFAULT_AUTH_REFRESH_URL);
        assert_eq!(config.auth.credentials.username(), "trader");
        assert_eq!(config.captcha.service_url, "https://2captcha.com");
        assert_eq!(config.captcha.solver_key, "solver");
        assert_eq!(config.captcha.task_key, DEFAULT_CAPTCHA_TASK_KEY);
        assert_eq!(config.captcha.task_page_url, DEFAULT_CAPTCHA_TASK_URL);
        assert_eq!(config.session.url, DEFAULT_TRADE_URL);
        assert_eq!(config.session.connect_timeout, Duration::from_secs(120));
        assert_eq!(config.session.heartbeat.interval, Duration::from_secs(15));
        assert_eq!(config.feed, FeedSettings::default());
        assert_eq!(config.recovery.retry_delay, Duration::from_secs(900));
        assert_eq!(config.recovery.maintenance_delay, Duration::from_secs(2100));
        assert_eq!(config.history.lookback, Duration::from_secs(86_400));
        assert_eq!(config.shutdown_delay, Duration::from_secs(5));
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("PDAX_TRADE_URL", "ws://127.0.0.1:9000"),
            ("PDAX_TRADES_CSV", "trades.csv"),
            ("PDAX_ORDER_BOOK_ENABLED", "TRUE"),
            ("PDAX_HEARTBEAT_INTERVAL_SECS", "30"),
            ("PDAX_RETRY_DELAY_MINS", "1"),
            ("PDAX_HISTORY_HOURS", "2"),
            ("PDAX_SHUTDOWN_DELAY_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(config.session.url, "ws://127.0.0.1:9000");
        assert_eq!(config.session.heartbeat.interval, Duration::from_secs(30));
        assert_eq!(config.feed.trades_csv, Some(PathBuf::from("trades.csv")));
        assert!(config.feed.order_book_enabled);
        assert_eq!(config.recovery.retry_delay, Duration::from_secs(60));
        assert_eq!(config.history.lookback, Duration::from_secs(7200));
        assert_eq!(config.shutdown_delay, Duration::ZERO);
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let config = config(&[("PDAX_SESSION_CONNECT_TIMEOUT_SECS", "soon")]).unwrap();
        assert_eq!(config.session.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn missing_credentials() {
        let err = MonitorConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "PDAX_USERNAME"));
    }

    #[test]
    fn empty_solver_key() {
        let err = config(&[("CAPTCHA_SOLVER_KEY", "")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(ref key) if key == "CAPTCHA_SOLVER_KEY"));
    }

    #[test]
    fn password_not_in_debug_output() {
        let debug = format!("{:?}", config(&[]).unwrap());
        assert!(!debug.contains("hunter2"));
    }
}
