//! Feed Session
//!
//! One WebSocket connection to the PDAX trading UI endpoint.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected --connect--> Connected --bootstrap--> Bootstrapped
//!     --start_heartbeat--> Streaming --close / venue close--> Closed
//! ```
//!
//! # Bootstrap Sequence
//!
//! 1. Read and discard the routing info frame
//! 2. Send the auth frame, read its acknowledgement
//! 3. Send the callback info frame, then `m0`
//! 4. Read and discard two frames
//! 5. Send `m1`
//! 6. Read and discard two frames
//! 7. Send every replay frame in order
//!
//! The read half stays with the session; the write half is shared with the
//! heartbeat task behind an async mutex.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::auth::AuthSession;
use super::bootstrap::{BootstrapScript, auth_frame};
use super::heartbeat::{HeartbeatConfig, HeartbeatManager};
use crate::application::ports::{FeedError, FeedSource, FeedStream, Frame};

/// Default trading UI WebSocket endpoint.
pub const DEFAULT_TRADE_URL: &str = "wss://trade.pdax.ph/tradeui/ws/master";

/// Default opening handshake timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(120);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur in a feed session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The opening handshake did not finish in time.
    #[error("connection to {url} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Endpoint.
        url: String,
        /// Configured timeout.
        timeout: Duration,
    },

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The venue closed the connection before the handshake finished.
    #[error("connection closed while waiting for {step}")]
    ClosedDuringBootstrap {
        /// Handshake step.
        step: &'static str,
    },

    /// The stream ended without a close frame.
    #[error("connection lost")]
    ConnectionLost,

    /// Operation not valid in the current state.
    #[error("operation requires {expected:?} session, found {actual:?}")]
    InvalidState {
        /// Required state.
        expected: SessionState,
        /// Current state.
        actual: SessionState,
    },
}

// =============================================================================
// Session State
// =============================================================================

/// Current session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No connection yet.
    #[default]
    Disconnected,
    /// WebSocket open, handshake not sent.
    Connected,
    /// Handshake complete.
    Bootstrapped,
    /// Heartbeat running, frames flowing.
    Streaming,
    /// Connection closed.
    Closed,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket URL.
    pub url: String,
    /// Opening handshake timeout.
    pub connect_timeout: Duration,
    /// Heartbeat timing.
    pub heartbeat: HeartbeatConfig,
}

impl SessionConfig {
    /// Create a configuration with default timings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

// =============================================================================
// Feed Session
// =============================================================================

/// A PDAX WebSocket session.
///
/// Dropping the session stops its heartbeat.
pub struct FeedSession {
    config: SessionConfig,
    state: SessionState,
    sink: Option<Arc<Mutex<WsSink>>>,
    source: Option<WsSource>,
    heartbeat_cancel: CancellationToken,
}

impl FeedSession {
    /// Create a disconnected session.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Disconnected,
            sink: None,
            source: None,
            heartbeat_cancel: CancellationToken::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Open the WebSocket connection.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session is not disconnected, the
    /// handshake times out or the connection fails.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Disconnected)?;

        let url = self.config.url.as_str();
        let timeout = self.config.connect_timeout;
        tracing::info!(url, "Connecting to PDAX feed");

        let (ws_stream, _response) =
            tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url))
                .await
                .map_err(|_| SessionError::ConnectTimeout {
                    url: url.to_string(),
                    timeout,
                })??;

        let (sink, source) = ws_stream.split();
        self.sink = Some(Arc::new(Mutex::new(sink)));
        self.source = Some(source);
        self.state = SessionState::Connected;

        tracing::info!(url = %self.config.url, "Connected to PDAX feed");
        Ok(())
    }

    /// Replay the handshake and start the heartbeat.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the session is not freshly connected, or
    /// any read or write of the handshake fails.
    pub async fn bootstrap(
        &mut self,
        token: &str,
        script: &BootstrapScript,
    ) -> Result<(), SessionError> {
        self.expect_state(SessionState::Connected)?;

        self.read_handshake("route info").await?;

        self.write_frame(auth_frame(token)).await?;
        self.read_handshake("login reply").await?;

        self.write_frame(script.callback_info.clone()).await?;
        self.write_frame(script.m0.clone()).await?;
        for _ in 0..2 {
            self.read_handshake("m0 reply").await?;
        }

        self.write_frame(script.m1.clone()).await?;
        for _ in 0..2 {
            self.read_handshake("m1 reply").await?;
        }

        for frame in &script.messages {
            self.write_frame(frame.clone()).await?;
        }

        self.state = SessionState::Bootstrapped;
        tracing::info!(replayed = script.messages.len(), "PDAX feed bootstrapped");

        self.start_heartbeat()
    }

    /// Spawn the heartbeat task.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the session is
    /// bootstrapped.
    pub fn start_heartbeat(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Bootstrapped)?;
        let sink = self.sink()?;

        let manager = HeartbeatManager::new(
            self.config.heartbeat.clone(),
            sink,
            self.heartbeat_cancel.clone(),
        );
        tokio::spawn(manager.run());

        self.state = SessionState::Streaming;
        Ok(())
    }

    /// Wait for the next data frame.
    ///
    /// Control frames are skipped. A close frame from the venue moves the
    /// session to `Closed` and yields [`Frame::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if there is no open connection, the read
    /// fails, or the stream ends without a close frame.
    pub async fn read_frame(&mut self) -> Result<Frame, SessionError> {
        let actual = self.state;
        let source = self.source.as_mut().ok_or(SessionError::InvalidState {
            expected: SessionState::Streaming,
            actual,
        })?;

        let message = loop {
            match source.next().await {
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                other => break other,
            }
        };

        match message {
            Some(Ok(Message::Binary(data))) => Ok(Frame::Data(data.to_vec())),
            Some(Ok(Message::Text(text))) => Ok(Frame::Data(text.as_bytes().to_vec())),
            Some(Ok(Message::Close(close))) => {
                tracing::info!(frame = ?close, "PDAX closed the connection");
                self.heartbeat_cancel.cancel();
                self.state = SessionState::Closed;
                Ok(Frame::Closed)
            }
            Some(Err(e)) => Err(e.into()),
            Some(Ok(_)) | None => Err(SessionError::ConnectionLost),
        }
    }

    /// Send one binary frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if there is no open connection or the write
    /// fails.
    pub async fn write_frame(&self, frame: Vec<u8>) -> Result<(), SessionError> {
        let sink = self.sink()?;
        sink.lock().await.send(Message::Binary(frame.into())).await?;
        Ok(())
    }

    /// Stop the heartbeat and close the connection.
    pub async fn close(&mut self) {
        self.heartbeat_cancel.cancel();

        if let Some(sink) = self.sink.take()
            && let Err(e) = sink.lock().await.close().await
        {
            tracing::debug!(error = %e, "Error closing PDAX connection");
        }
        self.source = None;

        if self.state != SessionState::Closed {
            tracing::info!("PDAX session closed");
        }
        self.state = SessionState::Closed;
    }

    async fn read_handshake(&mut self, step: &'static str) -> Result<(), SessionError> {
        match self.read_frame().await? {
            Frame::Data(data) => {
                tracing::debug!(step, len = data.len(), "Handshake frame received");
                Ok(())
            }
            Frame::Closed => Err(SessionError::ClosedDuringBootstrap { step }),
        }
    }

    fn sink(&self) -> Result<Arc<Mutex<WsSink>>, SessionError> {
        self.sink.clone().ok_or(SessionError::InvalidState {
            expected: SessionState::Connected,
            actual: self.state,
        })
    }

    const fn expect_state(&self, expected: SessionState) -> Result<(), SessionError> {
        if self.state as u8 == expected as u8 {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.heartbeat_cancel.cancel();
    }
}

#[async_trait]
impl FeedStream for FeedSession {
    async fn read_frame(&mut self) -> Result<Frame, FeedError> {
        Self::read_frame(self)
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        Self::close(self).await;
    }
}

// =============================================================================
// Feed Source
// =============================================================================

/// Opens authenticated, bootstrapped PDAX sessions.
#[derive(Debug, Clone)]
pub struct PdaxFeedSource {
    auth: AuthSession,
    session: SessionConfig,
    script: Arc<BootstrapScript>,
}

impl PdaxFeedSource {
    /// Create a feed source.
    #[must_use]
    pub const fn new(auth: AuthSession, session: SessionConfig, script: Arc<BootstrapScript>) -> Self {
        Self {
            auth,
            session,
            script,
        }
    }

    /// Log in, connect and bootstrap a session.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Authentication`], [`FeedError::Transport`] or
    /// [`FeedError::Bootstrap`] for the step that failed.
    pub async fn open_session(&self) -> Result<FeedSession, FeedError> {
        let token = self
            .auth
            .login()
            .await
            .map_err(|e| FeedError::Authentication(e.to_string()))?;

        let mut session = FeedSession::new(self.session.clone());
        session
            .connect()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;
        session
            .bootstrap(&token, &self.script)
            .await
            .map_err(|e| FeedError::Bootstrap(e.to_string()))?;

        Ok(session)
    }
}

#[async_trait]
impl FeedSource for PdaxFeedSource {
    async fn open(&self) -> Result<Box<dyn FeedStream>, FeedError> {
        Ok(Box::new(self.open_session().await?))
    }
}
