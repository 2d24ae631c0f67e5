//! OpenAI Realtime API client for Rust.
//!
//! This crate provides a client for the OpenAI Realtime API over two
//! transports: a persistent WebSocket, and a WebRTC peer connection whose
//! "oai-events" data channel carries the same JSON events while model audio
//! flows as a media track. Both are driven through the [`Session`] trait.
//!
//! # Features
//!
//! - WebSocket and WebRTC realtime sessions behind one [`Session`] interface
//! - Typed client commands ([`ClientEvent`]) and server events ([`ServerEvent`])
//! - Audio input/output support (PCM16 at 24kHz)
//! - Voice activity detection (VAD) modes, including manual turns
//! - Function calling support
//! - Streaming text and audio responses
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use giztoy_openai_realtime::{Client, ServerEventKind, Session, SessionConfig, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("your-api-key");
//!     let session = client.connect(Transport::WebSocket, None).await?;
//!     let mut events = session.events();
//!
//!     // Wait for session.created
//!     while let Some(event) = events.next().await {
//!         if matches!(event?.kind, ServerEventKind::SessionCreated(_)) {
//!             break;
//!         }
//!     }
//!
//!     // Manual turns: commit input and request responses explicitly.
//!     let mut config = SessionConfig::with_vad_disabled();
//!     config.voice = Some("alloy".to_string());
//!     session.update_session(&config).await?;
//!
//!     session.add_user_message("Hello!").await?;
//!     session.create_response(None).await?;
//!
//!     while let Some(event) = events.next().await {
//!         let event = event?;
//!         if let Some(delta) = event.delta_text() {
//!             print!("{}", delta);
//!         }
//!         if event.is_response_done() {
//!             break;
//!         }
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod event;
pub mod peer;
pub mod session;
mod signaling;
pub mod types;
pub mod websocket;

// Re-export main types
pub use client::{Client, ClientBuilder};
pub use error::{ApiError, ConnectStep, Error, Result};
pub use event::{ClientEvent, EventError, ServerEvent, ServerEventKind};
pub use peer::WebRtcSession;
pub use session::{EventStream, Session, SessionState};
pub use signaling::{ClientSecret, EphemeralToken};
pub use types::*;
pub use websocket::WebSocketSession;

// Re-export event type constants
pub use event::{
    EVENT_TYPE_CONVERSATION_CREATED, EVENT_TYPE_CONVERSATION_ITEM_CREATE,
    EVENT_TYPE_CONVERSATION_ITEM_CREATED, EVENT_TYPE_CONVERSATION_ITEM_DELETE,
    EVENT_TYPE_CONVERSATION_ITEM_DELETED,
    EVENT_TYPE_CONVERSATION_ITEM_INPUT_AUDIO_TRANSCRIPTION_COMPLETED,
    EVENT_TYPE_CONVERSATION_ITEM_INPUT_AUDIO_TRANSCRIPTION_FAILED,
    EVENT_TYPE_CONVERSATION_ITEM_TRUNCATE, EVENT_TYPE_CONVERSATION_ITEM_TRUNCATED,
    EVENT_TYPE_ERROR, EVENT_TYPE_INPUT_AUDIO_BUFFER_APPEND, EVENT_TYPE_INPUT_AUDIO_BUFFER_CLEAR,
    EVENT_TYPE_INPUT_AUDIO_BUFFER_CLEARED, EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMIT,
    EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMITTED, EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STARTED,
    EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED, EVENT_TYPE_RATE_LIMITS_UPDATED,
    EVENT_TYPE_RESPONSE_AUDIO_DELTA, EVENT_TYPE_RESPONSE_AUDIO_DONE,
    EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DELTA, EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DONE,
    EVENT_TYPE_RESPONSE_CANCEL, EVENT_TYPE_RESPONSE_CONTENT_PART_ADDED,
    EVENT_TYPE_RESPONSE_CONTENT_PART_DONE, EVENT_TYPE_RESPONSE_CREATE, EVENT_TYPE_RESPONSE_CREATED,
    EVENT_TYPE_RESPONSE_DONE, EVENT_TYPE_RESPONSE_FUNCTION_CALL_ARGUMENTS_DELTA,
    EVENT_TYPE_RESPONSE_FUNCTION_CALL_ARGUMENTS_DONE, EVENT_TYPE_RESPONSE_OUTPUT_ITEM_ADDED,
    EVENT_TYPE_RESPONSE_OUTPUT_ITEM_DONE, EVENT_TYPE_RESPONSE_TEXT_DELTA,
    EVENT_TYPE_RESPONSE_TEXT_DONE, EVENT_TYPE_SESSION_CREATED, EVENT_TYPE_SESSION_UPDATE,
    EVENT_TYPE_SESSION_UPDATED,
};
