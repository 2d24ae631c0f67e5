//! Error types for OpenAI Realtime API.

use std::fmt;

use thiserror::Error;

/// Result type for OpenAI Realtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Setup step at which a connection attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    /// WebSocket dial and handshake.
    Dial,
    /// Exchanging the API key for a short-lived client secret.
    EphemeralCredential,
    /// Creating the local peer connection.
    PeerConnection,
    /// Adding the receive-only audio transceiver.
    AudioTransceiver,
    /// Creating the event data channel.
    DataChannel,
    /// Creating the offer, setting it locally and gathering ICE candidates.
    Offer,
    /// Posting the local SDP and reading the answer.
    SdpExchange,
    /// Applying the remote SDP answer.
    RemoteDescription,
}

impl fmt::Display for ConnectStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectStep::Dial => "dial",
            ConnectStep::EphemeralCredential => "ephemeral credential",
            ConnectStep::PeerConnection => "peer connection",
            ConnectStep::AudioTransceiver => "audio transceiver",
            ConnectStep::DataChannel => "data channel",
            ConnectStep::Offer => "offer",
            ConnectStep::SdpExchange => "sdp exchange",
            ConnectStep::RemoteDescription => "remote description",
        };
        f.write_str(s)
    }
}

/// Errors that can occur when using the OpenAI Realtime API.
#[derive(Error, Debug)]
pub enum Error {
    /// The connection could not be established.
    #[error("connect failed at {step}: {source}")]
    Connect {
        step: ConnectStep,
        #[source]
        source: Box<Error>,
    },

    /// API error returned by OpenAI, either as an error event or an HTTP status.
    #[error("api error: {0}")]
    Api(ApiError),

    /// An inbound frame could not be parsed as a server event.
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// WebSocket error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// WebRTC error.
    #[error("webrtc error: {0}")]
    WebRtc(#[from] webrtc::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote side closed the connection.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// JSON serialization error for an outbound event.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An event was sent before the data channel opened.
    #[error("data channel not ready")]
    ChannelNotReady,

    /// A local audio track was already attached to the peer connection.
    #[error("local audio track already added")]
    AudioTrackExists,

    /// Session is closed.
    #[error("session closed")]
    SessionClosed,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Timeout error.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Wraps an error with the connection step it happened at.
    pub fn connect(step: ConnectStep, source: impl Into<Error>) -> Self {
        Error::Connect {
            step,
            source: Box::new(source.into()),
        }
    }

    /// Creates an API error from an HTTP response status.
    pub fn http_status_error(code: &str, message: impl Into<String>, status: u16) -> Self {
        Error::Api(ApiError {
            code: Some(code.to_string()),
            message: message.into(),
            http_status: Some(status),
            ..Default::default()
        })
    }

    /// Returns the HTTP status carried by this error, looking through connect wrappers.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Connect { source, .. } => source.http_status(),
            Error::Api(e) => e.http_status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the failed setup step for connect errors.
    pub fn connect_step(&self) -> Option<ConnectStep> {
        match self {
            Error::Connect { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Returns true if the underlying connection failed.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::WebSocket(_) | Error::WebRtc(_) | Error::Http(_) | Error::ConnectionClosed(_)
        )
    }

    /// Returns true for synchronous caller mistakes.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::ChannelNotReady | Error::AudioTrackExists)
    }

    /// Returns true if the server rejected the credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self.http_status(), Some(401) | Some(403))
    }
}

/// API error from OpenAI Realtime.
#[derive(Debug, Clone, Default)]
pub struct ApiError {
    /// Error type (e.g., "invalid_request_error").
    pub error_type: Option<String>,
    /// Error code (e.g., "invalid_value").
    pub code: Option<String>,
    /// Human-readable error message.
    pub message: String,
    /// Parameter that caused the error.
    pub param: Option<String>,
    /// Client event ID that caused the error.
    pub event_id: Option<String>,
    /// HTTP status code, if applicable.
    pub http_status: Option<u16>,
}

impl ApiError {
    /// Creates a new API error from an event error.
    pub fn from_event(
        error_type: Option<String>,
        code: Option<String>,
        message: String,
        param: Option<String>,
        event_id: Option<String>,
    ) -> Self {
        Self {
            error_type,
            code,
            message,
            param,
            event_id,
            http_status: None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref code) = self.code {
            write!(f, "{}: {}", code, self.message)?;
        } else if let Some(ref error_type) = self.error_type {
            write!(f, "{}: {}", error_type, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(status) = self.http_status {
            write!(f, " (http_status={})", status)?;
        }
        Ok(())
    }
}
