//! Handshake Frames
//!
//! The venue only starts pushing data after a browser-like handshake. Its
//! frames were recorded from the trading UI and are replayed verbatim from a
//! JSON file of base64 strings:
//!
//! ```json
//! {
//!   "messageCallbackInfo": "<base64>",
//!   "m0": "<base64>",
//!   "m1": "<base64>",
//!   "messages": ["<base64>", "..."]
//! }
//! ```

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use thiserror::Error;

/// Header of the auth frame; the bearer token follows as UTF-8.
pub const AUTH_PREFIX: [u8; 9] = [0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0xBB];

/// Application keepalive frame.
pub const HEARTBEAT_FRAME: [u8; 7] = [0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Errors raised while loading the handshake script.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The script file exists but could not be read.
    #[error("failed to read bootstrap script: {0}")]
    Io(#[from] std::io::Error),

    /// The script is not valid JSON.
    #[error("invalid bootstrap script: {0}")]
    Json(#[from] serde_json::Error),

    /// A frame is not valid base64.
    #[error("invalid base64 in bootstrap field {field}: {source}")]
    Base64 {
        /// Offending field.
        field: String,
        /// Decoder error.
        source: base64::DecodeError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScriptFile {
    message_callback_info: String,
    m0: String,
    m1: String,
    messages: Vec<String>,
}

/// Decoded handshake frames, in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapScript {
    /// Reply to the login acknowledgement.
    pub callback_info: Vec<u8>,
    /// First view request.
    pub m0: Vec<u8>,
    /// Second view request.
    pub m1: Vec<u8>,
    /// Subscription frames replayed after the handshake.
    pub messages: Vec<Vec<u8>>,
}

impl BootstrapScript {
    /// Load a script file. A missing file yields an empty script.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BootstrapError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Bootstrap script not found, using empty script");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse a script from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] for malformed JSON or base64.
    pub fn from_json(json: &str) -> Result<Self, BootstrapError> {
        let file: ScriptFile = serde_json::from_str(json)?;

        let messages = file
            .messages
            .iter()
            .enumerate()
            .map(|(i, frame)| decode(&format!("messages[{i}]"), frame))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            callback_info: decode("messageCallbackInfo", &file.message_callback_info)?,
            m0: decode("m0", &file.m0)?,
            m1: decode("m1", &file.m1)?,
            messages,
        })
    }
}

/// Build the auth frame for a bearer token.
#[must_use]
pub fn auth_frame(token: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(AUTH_PREFIX.len() + token.len());
    frame.extend_from_slice(&AUTH_PREFIX);
    frame.extend_from_slice(token.as_bytes());
    frame
}

fn decode(field: &str, value: &str) -> Result<Vec<u8>, BootstrapError> {
    STANDARD
        .decode(value)
        .map_err(|source| BootstrapError::Base64 {
            field: field.to_string(),
            source,
        })
}
