//! Session trait for OpenAI Realtime API.

use std::fmt::Display;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::event::{ClientEvent, ServerEvent, ServerEventKind};
use crate::types::*;

/// Capacity of the queue between the background reader and the consumer.
pub const EVENT_QUEUE_CAPACITY: usize = 100;

/// Ordered sequence of server events.
///
/// The stream ends after the first error or once the session is closed.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<ServerEvent>> + Send>>;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Handshake in progress.
    Connecting,
    /// Connected; the background reader is running.
    Active,
    /// Closed by the caller or by a fatal transport error.
    Closed,
}

/// Common interface for OpenAI Realtime sessions.
/// Both WebSocket and WebRTC implementations satisfy this trait.
#[async_trait]
pub trait Session: Send + Sync {
    // === Transport ===

    /// Encodes and sends one client event.
    async fn send(&self, event: &ClientEvent) -> Result<()>;

    /// Sends a raw JSON event to the server.
    /// Use this for events not covered by [`ClientEvent`].
    async fn send_raw(&self, event: serde_json::Value) -> Result<()>;

    /// Returns the server event stream.
    ///
    /// The stream can be taken once; later calls return a stream that ends
    /// immediately.
    fn events(&self) -> EventStream;

    /// Returns the session ID assigned by the server.
    /// Returns None if session.created has not been received yet.
    fn session_id(&self) -> Option<String>;

    /// Returns the current lifecycle state.
    fn state(&self) -> SessionState;

    /// Closes the session connection. Calling it again is a no-op.
    async fn close(&self) -> Result<()>;

    // === Session Management ===

    /// Updates the session configuration.
    /// This should be called after receiving session.created event.
    async fn update_session(&self, config: &SessionConfig) -> Result<()> {
        self.send(&ClientEvent::session_update(config)).await
    }

    // === Audio Input ===

    /// Appends PCM audio data to the input audio buffer.
    /// Audio should be 24kHz, 16-bit, mono PCM (little-endian).
    async fn append_audio(&self, audio: &[u8]) -> Result<()> {
        self.send(&ClientEvent::append_audio(audio)).await
    }

    /// Appends base64-encoded audio data to the input buffer.
    async fn append_audio_base64(&self, audio_base64: &str) -> Result<()> {
        self.send(&ClientEvent::append_audio_base64(audio_base64)).await
    }

    /// Commits the audio buffer and creates a user message.
    /// In server_vad mode, this is called automatically after VAD detects end of speech.
    /// In manual mode (turn_detection: null), call this to indicate end of user input.
    async fn commit_input(&self) -> Result<()> {
        self.send(&ClientEvent::commit_input()).await
    }

    /// Clears the input audio buffer without creating a message.
    async fn clear_input(&self) -> Result<()> {
        self.send(&ClientEvent::clear_input()).await
    }

    // === Conversation Management ===

    /// Adds a user text message to the conversation.
    async fn add_user_message(&self, text: &str) -> Result<()> {
        self.send(&ClientEvent::create_item(ConversationItem::user_text(text)))
            .await
    }

    /// Adds a user audio message to the conversation.
    /// Audio should be base64 encoded. Transcript is optional.
    async fn add_user_audio(&self, audio_base64: &str, transcript: Option<&str>) -> Result<()> {
        let item = ConversationItem::user_audio(audio_base64, transcript.map(str::to_string));
        self.send(&ClientEvent::create_item(item)).await
    }

    /// Adds an assistant text message to the conversation.
    async fn add_assistant_message(&self, text: &str) -> Result<()> {
        self.send(&ClientEvent::create_item(ConversationItem::assistant_text(text)))
            .await
    }

    /// Adds a function call output to the conversation.
    async fn add_function_call_output(&self, call_id: &str, output: &str) -> Result<()> {
        let item = ConversationItem::function_call_output(call_id, output);
        self.send(&ClientEvent::create_item(item)).await
    }

    /// Truncates a conversation item (assistant audio).
    /// content_index is the index of the content part to truncate.
    /// audio_end_ms is the audio end time in milliseconds.
    async fn truncate_item(&self, item_id: &str, content_index: u32, audio_end_ms: u32) -> Result<()> {
        self.send(&ClientEvent::truncate_item(item_id, content_index, audio_end_ms))
            .await
    }

    /// Deletes a conversation item.
    async fn delete_item(&self, item_id: &str) -> Result<()> {
        self.send(&ClientEvent::delete_item(item_id)).await
    }

    // === Response Control ===

    /// Requests the model to generate a response.
    /// In server_vad mode, this is called automatically by the server.
    /// In manual mode, call this after commit_input to trigger response generation.
    /// Pass None for default options.
    async fn create_response(&self, opts: Option<&ResponseCreateOptions>) -> Result<()> {
        self.send(&ClientEvent::create_response(opts)).await
    }

    /// Cancels the current response generation.
    async fn cancel_response(&self) -> Result<()> {
        self.send(&ClientEvent::cancel_response()).await
    }
}

/// State shared by a session and its background reader.
pub(crate) struct SessionCore {
    state: Mutex<SessionState>,
    closing: AtomicBool,
    failed: AtomicBool,
    cancel: CancellationToken,
    reader_cancel: CancellationToken,
    session_id: Mutex<Option<String>>,
    events_tx: Mutex<Option<mpsc::Sender<Result<ServerEvent>>>>,
    events_rx: Mutex<Option<mpsc::Receiver<Result<ServerEvent>>>>,
}

impl SessionCore {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let cancel = CancellationToken::new();
        Self {
            state: Mutex::new(SessionState::Connecting),
            closing: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            reader_cancel: cancel.child_token(),
            cancel,
            session_id: Mutex::new(None),
            events_tx: Mutex::new(Some(tx)),
            events_rx: Mutex::new(Some(rx)),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Moves connecting to active. A session closed meanwhile stays closed.
    pub(crate) fn activate(&self) {
        let mut state = self.state.lock();
        if *state == SessionState::Connecting {
            *state = SessionState::Active;
        }
    }

    pub(crate) fn mark_closed(&self) {
        *self.state.lock() = SessionState::Closed;
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        match self.state() {
            SessionState::Closed => Err(Error::SessionClosed),
            _ => Ok(()),
        }
    }

    pub(crate) fn session_id(&self) -> Option<String> {
        self.session_id.lock().clone()
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Token observed by the inbound side. Cancelled on close and on any
    /// transport failure; the consumer stream only watches [`cancel_token`](Self::cancel_token).
    pub(crate) fn reader_token(&self) -> &CancellationToken {
        &self.reader_cancel
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Starts shutdown. Returns false if shutdown already started.
    ///
    /// Cancellation is signalled before the transport is released so the
    /// reader never blocks on delivery after close.
    pub(crate) fn begin_close(&self) -> bool {
        if self.closing.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.cancel.cancel();
        self.mark_closed();
        self.finish();
        true
    }

    /// Drops the producer side so the stream ends once drained.
    pub(crate) fn finish(&self) {
        self.events_tx.lock().take();
    }

    pub(crate) fn events(&self) -> EventStream {
        let rx = self.events_rx.lock().take();
        let cancel = self.cancel.clone();

        Box::pin(async_stream::stream! {
            if let Some(mut rx) = rx {
                loop {
                    let item = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        item = rx.recv() => match item {
                            Some(item) => item,
                            None => break,
                        },
                    };
                    let failed = item.is_err();
                    yield item;
                    if failed {
                        break;
                    }
                }
            }
        })
    }

    /// Decodes one inbound frame and delivers it.
    ///
    /// Returns false when the reader should stop.
    pub(crate) async fn handle_frame(&self, data: Bytes) -> bool {
        if self.reader_cancel.is_cancelled() {
            return false;
        }
        debug!(
            "Received: {}",
            truncate_for_log(&String::from_utf8_lossy(&data), 1000)
        );

        let event = match ServerEvent::decode(data) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "failed to decode server event");
                return self.deliver(Err(e)).await;
            }
        };

        match &event.kind {
            ServerEventKind::SessionCreated(created) => {
                debug!(session_id = %created.session.id, "session created");
                *self.session_id.lock() = Some(created.session.id.clone());
            }
            ServerEventKind::Error(e) => {
                let err = Error::Api(e.error.to_api_error());
                error!(error = %err, "server reported error");
                self.deliver(Err(err)).await;
                self.finish();
                return false;
            }
            _ => {}
        }

        self.deliver(Ok(event)).await
    }

    /// Delivers a transport failure as the final item and closes the session.
    ///
    /// Only the first failure is delivered.
    pub(crate) async fn fail(&self, err: Error) {
        if self.is_closing() || self.failed.swap(true, Ordering::SeqCst) {
            return;
        }
        error!(error = %err, "transport failed");
        self.mark_closed();
        self.reader_cancel.cancel();
        self.deliver(Err(err)).await;
        self.finish();
    }

    /// Handles a failed outbound write.
    ///
    /// The session is closed and the reader stopped at once; the failure is
    /// queued as the final item from a separate task so the sender never
    /// waits on the consumer.
    pub(crate) fn fail_write(self: &Arc<Self>, err: &impl Display) {
        if self.is_closing() {
            return;
        }
        self.mark_closed();
        self.reader_cancel.cancel();

        let core = self.clone();
        let err = Error::ConnectionClosed(format!("write failed: {}", err));
        tokio::spawn(async move { core.fail(err).await });
    }

    async fn deliver(&self, item: Result<ServerEvent>) -> bool {
        let tx = self.events_tx.lock().clone();
        let Some(tx) = tx else {
            return false;
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = tx.send(item) => sent.is_ok(),
        }
    }
}

pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() > max_len {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    fn frame(json: &str) -> Bytes {
        Bytes::copy_from_slice(json.as_bytes())
    }

    #[tokio::test]
    async fn test_session_id_set_before_delivery() {
        let core = SessionCore::new();
        assert_eq!(core.session_id(), None);

        let mut events = core.events();
        assert!(core.handle_frame(frame(r#"{"type":"session.created","session":{"id":"sess_1"}}"#)).await);
        assert_eq!(core.session_id().as_deref(), Some("sess_1"));

        let event = events.next().await.unwrap().unwrap();
        assert_eq!(event.event_type(), "session.created");
    }

    #[tokio::test]
    async fn test_stream_ends_after_first_error() {
        let core = SessionCore::new();
        let mut events = core.events();

        assert!(core.handle_frame(frame("{oops")).await);
        assert!(core.handle_frame(frame(r#"{"type":"input_audio_buffer.cleared"}"#)).await);

        assert!(matches!(events.next().await, Some(Err(Error::Decode(_)))));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_error_event_stops_reader() {
        let core = SessionCore::new();
        let mut events = core.events();

        let stop = core
            .handle_frame(frame(r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad"}}"#))
            .await;
        assert!(!stop);

        match events.next().await {
            Some(Err(Error::Api(e))) => assert_eq!(e.message, "bad"),
            other => panic!("unexpected item: {:?}", other.map(|r| r.map(|e| e.event_type().to_string()))),
        }
        assert!(events.next().await.is_none());
        assert!(!core.handle_frame(frame(r#"{"type":"input_audio_buffer.cleared"}"#)).await);
    }

    #[tokio::test]
    async fn test_transport_failure_closes_session() {
        let core = SessionCore::new();
        core.activate();
        let mut events = core.events();

        core.fail(Error::ConnectionClosed("reset".into())).await;
        assert_eq!(core.state(), SessionState::Closed);
        assert!(matches!(core.ensure_open(), Err(Error::SessionClosed)));
        assert!(matches!(events.next().await, Some(Err(Error::ConnectionClosed(_)))));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_ends_stream_and_reader() {
        let core = std::sync::Arc::new(SessionCore::new());
        core.activate();
        let mut events = core.events();

        assert!(core.handle_frame(frame(r#"{"type":"input_audio_buffer.cleared"}"#)).await);
        core.fail_write(&"broken pipe");

        assert_eq!(core.state(), SessionState::Closed);
        assert!(core.reader_token().is_cancelled());
        assert!(!core.cancel_token().is_cancelled());
        assert!(matches!(core.ensure_open(), Err(Error::SessionClosed)));
        assert!(!core.handle_frame(frame(r#"{"type":"input_audio_buffer.cleared"}"#)).await);

        let first = tokio::time::timeout(Duration::from_secs(1), events.next()).await.unwrap();
        assert_eq!(first.unwrap().unwrap().event_type(), "input_audio_buffer.cleared");
        match tokio::time::timeout(Duration::from_secs(1), events.next()).await.unwrap() {
            Some(Err(Error::ConnectionClosed(reason))) => assert!(reason.contains("broken pipe"), "{}", reason),
            other => panic!("unexpected item: {:?}", other.map(|r| r.map(|e| e.event_type().to_string()))),
        }
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_only_first_failure_is_delivered() {
        let core = SessionCore::new();
        core.activate();
        let mut events = core.events();

        core.fail(Error::ConnectionClosed("first".into())).await;
        core.fail(Error::ConnectionClosed("second".into())).await;

        match events.next().await {
            Some(Err(Error::ConnectionClosed(reason))) => assert_eq!(reason, "first"),
            other => panic!("unexpected item: {:?}", other.map(|r| r.map(|e| e.event_type().to_string()))),
        }
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_unblocks_consumer() {
        let core = std::sync::Arc::new(SessionCore::new());
        core.activate();
        let mut events = core.events();

        let waiter = tokio::spawn(async move { events.next().await.is_none() });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(core.begin_close());
        assert!(!core.begin_close());
        assert_eq!(core.state(), SessionState::Closed);
        assert!(core.reader_token().is_cancelled());

        let ended = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("stream did not end")
            .unwrap();
        assert!(ended);
    }

    #[tokio::test]
    async fn test_full_queue_does_not_block_close() {
        let core = std::sync::Arc::new(SessionCore::new());
        let _events = core.events();

        for _ in 0..EVENT_QUEUE_CAPACITY {
            assert!(core.handle_frame(frame(r#"{"type":"input_audio_buffer.cleared"}"#)).await);
        }

        let reader = {
            let core = core.clone();
            tokio::spawn(async move {
                core.handle_frame(frame(r#"{"type":"input_audio_buffer.cleared"}"#)).await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        core.begin_close();

        let delivered = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("reader blocked after close")
            .unwrap();
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_second_events_call_is_empty() {
        let core = SessionCore::new();
        let _first = core.events();
        let mut second = core.events();
        assert!(second.next().await.is_none());
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("hello", 10), "hello");
        assert_eq!(truncate_for_log("hello world", 5), "hello...");
        assert_eq!(truncate_for_log("héllo", 2), "h...");
    }
}
