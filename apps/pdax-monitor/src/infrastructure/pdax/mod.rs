//! PDAX Adapters
//!
//! Everything needed to get typed records out of the PDAX trading UI feed:
//!
//! - `captcha`: 2captcha client for the login form's reCAPTCHA
//! - `auth`: web login and bearer token refresh
//! - `bootstrap`: recorded handshake frames and fixed outbound frames
//! - `session`: WebSocket session state machine
//! - `heartbeat`: application-level keepalive task
//! - `cursor`, `codec`: binary frame decoding
//! - `decoder`: frame dispatch by view

pub mod auth;
pub mod bootstrap;
pub mod captcha;
pub mod codec;
pub mod cursor;
pub mod decoder;
pub mod heartbeat;
pub mod session;

pub use auth::{AuthConfig, AuthError, AuthSession, Credentials};
pub use bootstrap::{BootstrapError, BootstrapScript};
pub use captcha::{CaptchaConfig, CaptchaError, CaptchaSolver};
pub use decoder::PdaxFrameDecoder;
pub use heartbeat::{HeartbeatConfig, HeartbeatManager};
pub use session::{FeedSession, PdaxFeedSource, SessionConfig, SessionError, SessionState};
