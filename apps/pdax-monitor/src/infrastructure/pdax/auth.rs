//! PDAX Login
//!
//! Obtains the bearer token the WebSocket auth frame carries.
//!
//! # Login Flow
//!
//! 1. Solve the sign-in page captcha
//! 2. POST the login form (JSON) to the login URL; this sets session cookies
//! 3. GET the refresh URL with the same client and body
//! 4. Read `authToken` from the JSON response
//!
//! The login form carries a fixed browser fingerprint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::captcha::{CaptchaError, CaptchaSolver};

// =============================================================================
// Constants
// =============================================================================

/// Default login endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://trade.pdax.ph/moon/v1/login";

/// Default token refresh endpoint.
pub const DEFAULT_AUTH_REFRESH_URL: &str = "https://trade.pdax.ph/moon/v1/refreshToken";

const DEVICE: Device = Device {
    h: "94129614769af80e6b7cd7fc68294349",
    l: "ru-RU",
    r: "1920x1080",
    h2: "6ed8863b119af2f53411e620bb1ebd8f35ce1da9e0d7a04b26bbdd1f11d5c156",
};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that abort a login.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Captcha solving failed.
    #[error("captcha solving failed: {0}")]
    Captcha(#[from] CaptchaError),

    /// Transport failure or non-success status.
    #[error("login request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The refresh response was not the expected JSON.
    #[error("invalid token response: {0}")]
    Decode(#[from] serde_json::Error),
}

// =============================================================================
// Credentials
// =============================================================================

/// PDAX account credentials.
///
/// `Debug` redacts the password.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Account username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Account password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
struct Device {
    h: &'static str,
    l: &'static str,
    r: &'static str,
    h2: &'static str,
}

#[derive(Debug, Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
    trusted: bool,
    captcha: &'a str,
    platform: &'static str,
    device: Device,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    auth_token: String,
}

// =============================================================================
// Auth Session
// =============================================================================

/// Login endpoints and account.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Login form endpoint.
    pub login_url: String,
    /// Token refresh endpoint.
    pub refresh_url: String,
    /// Account credentials.
    pub credentials: Credentials,
}

/// Performs the PDAX web login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    config: AuthConfig,
    captcha: CaptchaSolver,
}

impl AuthSession {
    /// Create a login session.
    #[must_use]
    pub const fn new(config: AuthConfig, captcha: CaptchaSolver) -> Self {
        Self { config, captcha }
    }

    /// Log in and return a fresh bearer token.
    ///
    /// Each call uses a new cookie store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the captcha fails, either request fails or
    /// returns a non-success status, or the token response is malformed.
    pub async fn login(&self) -> Result<String, AuthError> {
        let captcha = self.captcha.solve().await?;

        let client = reqwest::Client::builder().cookie_store(true).build()?;
        let form = LoginForm {
            username: self.config.credentials.username(),
            password: self.config.credentials.password(),
            trusted: false,
            captcha: &captcha,
            platform: "null",
            device: DEVICE,
        };

        client
            .post(&self.config.login_url)
            .json(&form)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(url = %self.config.login_url, "Login form accepted");

        let body = client
            .get(&self.config.refresh_url)
            .json(&form)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let token: TokenResponse = serde_json::from_str(&body)?;

        tracing::info!(username = %self.config.credentials.username(), "Authenticated to PDAX");
        Ok(token.auth_token)
    }
}
