//! reCAPTCHA Solver
//!
//! Client for the 2captcha HTTP API. A task is posted for the sign-in page's
//! site key; the result endpoint is then polled at a fixed interval.
//!
//! # Responses
//!
//! - `OK|<value>`: task accepted (value = task id) or solved (value = token)
//! - `ERROR_ZERO_BALANCE`: account has no funds
//! - `CAPCHA_NOT_READY`: solution pending, keep polling

use std::time::Duration;

use thiserror::Error;

const OK_PREFIX: &str = "OK|";
const ZERO_BALANCE: &str = "ERROR_ZERO_BALANCE";
const NOT_READY: &str = "CAPCHA_NOT_READY";

/// Default 2captcha endpoint.
pub const DEFAULT_SERVICE_URL: &str = "https://2captcha.com";

/// Errors raised while solving a captcha.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// The solver service could not be reached or read.
    #[error("captcha service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The solver account has no balance.
    #[error("captcha solver balance is zero")]
    ZeroBalance,

    /// No solution after the configured number of polls.
    #[error("captcha not solved after {attempts} polls")]
    Timeout {
        /// Polls made.
        attempts: u32,
    },
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    /// Base URL of the solver service.
    pub service_url: String,
    /// Solver account key.
    pub solver_key: String,
    /// reCAPTCHA site key of the page.
    pub task_key: String,
    /// Page the captcha is shown on.
    pub task_page_url: String,
    /// Delay before each poll.
    pub poll_interval: Duration,
    /// Polls before giving up.
    pub max_attempts: u32,
}

impl CaptchaConfig {
    /// Create a configuration with the standard polling schedule
    /// (every 5 seconds, 30 times).
    #[must_use]
    pub fn new(
        service_url: impl Into<String>,
        solver_key: impl Into<String>,
        task_key: impl Into<String>,
        task_page_url: impl Into<String>,
    ) -> Self {
        Self {
            service_url: service_url.into(),
            solver_key: solver_key.into(),
            task_key: task_key.into(),
            task_page_url: task_page_url.into(),
            poll_interval: Duration::from_secs(5),
            max_attempts: 30,
        }
    }

    /// Override the polling schedule.
    #[must_use]
    pub const fn with_polling(mut self, poll_interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_attempts = max_attempts;
        self
    }
}

/// 2captcha client.
#[derive(Debug, Clone)]
pub struct CaptchaSolver {
    client: reqwest::Client,
    config: CaptchaConfig,
}

impl CaptchaSolver {
    /// Create a solver with its own HTTP client.
    #[must_use]
    pub fn new(config: CaptchaConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Solve the configured captcha.
    ///
    /// An unrecognized answer to the task post yields an empty token rather
    /// than an error; the login then fails on the venue side.
    ///
    /// # Errors
    ///
    /// Returns [`CaptchaError::ZeroBalance`] if the account is empty,
    /// [`CaptchaError::Timeout`] if no solution arrives in time, and
    /// [`CaptchaError::Http`] on transport failures.
    pub async fn solve(&self) -> Result<String, CaptchaError> {
        let task = self.post_task().await?;

        if task == ZERO_BALANCE {
            return Err(CaptchaError::ZeroBalance);
        }

        let Some(task_id) = task.strip_prefix(OK_PREFIX) else {
            tracing::warn!(response = %task, "Unrecognized captcha task response");
            return Ok(String::new());
        };

        tracing::info!(task_id, page = %self.config.task_page_url, "Captcha task scheduled");

        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep(self.config.poll_interval).await;

            let answer = self.fetch_result(task_id).await?;
            if answer == NOT_READY {
                tracing::debug!(attempt, "Captcha solution not ready");
                continue;
            }
            if let Some(token) = answer.strip_prefix(OK_PREFIX) {
                tracing::info!(attempt, "Captcha solved");
                return Ok(token.to_string());
            }
            tracing::debug!(attempt, response = %answer, "Unexpected captcha poll response");
        }

        Err(CaptchaError::Timeout {
            attempts: self.config.max_attempts,
        })
    }

    async fn post_task(&self) -> Result<String, CaptchaError> {
        let url = format!("{}/in.php", self.config.service_url);
        let body = self
            .client
            .get(url)
            .query(&[
                ("key", self.config.solver_key.as_str()),
                ("method", "userrecaptcha"),
                ("googlekey", self.config.task_key.as_str()),
                ("pageurl", self.config.task_page_url.as_str()),
            ])
            .send()
            .await?
            .text()
            .await?;
        Ok(body)
    }

    async fn fetch_result(&self, task_id: &str) -> Result<String, CaptchaError> {
        let url = format!("{}/res.php", self.config.service_url);
        let body = self
            .client
            .get(url)
            .query(&[
                ("key", self.config.solver_key.as_str()),
                ("action", "get"),
                ("googlekey", self.config.task_key.as_str()),
                ("id", task_id),
            ])
            .send()
            .await?
            .text()
            .await?;
        Ok(body)
    }
}
