//! Configuration Module
//!
//! Environment settings and the auxiliary files the monitor loads at startup.

mod currency_codes;
mod settings;

pub use currency_codes::load_currency_codes;
pub use settings::{
    ConfigError, DEFAULT_CAPTCHA_TASK_KEY, DEFAULT_CAPTCHA_TASK_URL, FeedSettings,
    HistorySettings, MonitorConfig,
};
