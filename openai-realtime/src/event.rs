//! Event types for OpenAI Realtime API.
//!
//! Client events are a closed set of commands serialized with a `type` tag and
//! a generated `event_id`. Server events are decoded into [`ServerEvent`],
//! whose [`ServerEventKind`] carries only the fields meaningful to each type.

use base64::Engine;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Error, Result};
use crate::types::*;

// ============================================================================
// Client Event Types (sent from client to server)
// ============================================================================

/// Session update event.
pub const EVENT_TYPE_SESSION_UPDATE: &str = "session.update";

/// Input audio buffer events.
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_APPEND: &str = "input_audio_buffer.append";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMIT: &str = "input_audio_buffer.commit";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_CLEAR: &str = "input_audio_buffer.clear";

/// Conversation item events.
pub const EVENT_TYPE_CONVERSATION_ITEM_CREATE: &str = "conversation.item.create";
pub const EVENT_TYPE_CONVERSATION_ITEM_TRUNCATE: &str = "conversation.item.truncate";
pub const EVENT_TYPE_CONVERSATION_ITEM_DELETE: &str = "conversation.item.delete";

/// Response events.
pub const EVENT_TYPE_RESPONSE_CREATE: &str = "response.create";
pub const EVENT_TYPE_RESPONSE_CANCEL: &str = "response.cancel";

// ============================================================================
// Server Event Types (sent from server to client)
// ============================================================================

/// Error event.
pub const EVENT_TYPE_ERROR: &str = "error";

/// Session events.
pub const EVENT_TYPE_SESSION_CREATED: &str = "session.created";
pub const EVENT_TYPE_SESSION_UPDATED: &str = "session.updated";

/// Conversation events.
pub const EVENT_TYPE_CONVERSATION_CREATED: &str = "conversation.created";
pub const EVENT_TYPE_CONVERSATION_ITEM_CREATED: &str = "conversation.item.created";
pub const EVENT_TYPE_CONVERSATION_ITEM_INPUT_AUDIO_TRANSCRIPTION_COMPLETED: &str =
    "conversation.item.input_audio_transcription.completed";
pub const EVENT_TYPE_CONVERSATION_ITEM_INPUT_AUDIO_TRANSCRIPTION_FAILED: &str =
    "conversation.item.input_audio_transcription.failed";
pub const EVENT_TYPE_CONVERSATION_ITEM_TRUNCATED: &str = "conversation.item.truncated";
pub const EVENT_TYPE_CONVERSATION_ITEM_DELETED: &str = "conversation.item.deleted";

/// Input audio buffer events.
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMITTED: &str = "input_audio_buffer.committed";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_CLEARED: &str = "input_audio_buffer.cleared";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STARTED: &str = "input_audio_buffer.speech_started";
pub const EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED: &str = "input_audio_buffer.speech_stopped";

/// Response events.
pub const EVENT_TYPE_RESPONSE_CREATED: &str = "response.created";
pub const EVENT_TYPE_RESPONSE_DONE: &str = "response.done";
pub const EVENT_TYPE_RESPONSE_OUTPUT_ITEM_ADDED: &str = "response.output_item.added";
pub const EVENT_TYPE_RESPONSE_OUTPUT_ITEM_DONE: &str = "response.output_item.done";
pub const EVENT_TYPE_RESPONSE_CONTENT_PART_ADDED: &str = "response.content_part.added";
pub const EVENT_TYPE_RESPONSE_CONTENT_PART_DONE: &str = "response.content_part.done";

/// Response text events.
pub const EVENT_TYPE_RESPONSE_TEXT_DELTA: &str = "response.text.delta";
pub const EVENT_TYPE_RESPONSE_TEXT_DONE: &str = "response.text.done";

/// Response audio events.
pub const EVENT_TYPE_RESPONSE_AUDIO_DELTA: &str = "response.audio.delta";
pub const EVENT_TYPE_RESPONSE_AUDIO_DONE: &str = "response.audio.done";

/// Response audio transcript events.
pub const EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DELTA: &str = "response.audio_transcript.delta";
pub const EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DONE: &str = "response.audio_transcript.done";

/// Response function call events.
pub const EVENT_TYPE_RESPONSE_FUNCTION_CALL_ARGUMENTS_DELTA: &str =
    "response.function_call_arguments.delta";
pub const EVENT_TYPE_RESPONSE_FUNCTION_CALL_ARGUMENTS_DONE: &str =
    "response.function_call_arguments.done";

/// Rate limits event.
pub const EVENT_TYPE_RATE_LIMITS_UPDATED: &str = "rate_limits.updated";

/// Generates a client event ID.
pub fn generate_event_id() -> String {
    format!("evt_{}", &uuid::Uuid::new_v4().simple().to_string()[..16])
}

// ============================================================================
// Client Event
// ============================================================================

/// Command sent from the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate {
        event_id: String,
        session: Box<SessionConfig>,
    },

    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { event_id: String, audio: String },

    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit { event_id: String },

    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioBufferClear { event_id: String },

    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        event_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous_item_id: Option<String>,
        item: ConversationItem,
    },

    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate {
        event_id: String,
        item_id: String,
        content_index: u32,
        audio_end_ms: u32,
    },

    #[serde(rename = "conversation.item.delete")]
    ConversationItemDelete { event_id: String, item_id: String },

    #[serde(rename = "response.create")]
    ResponseCreate {
        event_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<Box<ResponseCreateOptions>>,
    },

    #[serde(rename = "response.cancel")]
    ResponseCancel {
        event_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response_id: Option<String>,
    },
}

impl ClientEvent {
    pub fn session_update(config: &SessionConfig) -> Self {
        ClientEvent::SessionUpdate {
            event_id: generate_event_id(),
            session: Box::new(config.clone()),
        }
    }

    pub fn append_audio(audio: &[u8]) -> Self {
        Self::append_audio_base64(base64::engine::general_purpose::STANDARD.encode(audio))
    }

    pub fn append_audio_base64(audio_base64: impl Into<String>) -> Self {
        ClientEvent::InputAudioBufferAppend {
            event_id: generate_event_id(),
            audio: audio_base64.into(),
        }
    }

    pub fn commit_input() -> Self {
        ClientEvent::InputAudioBufferCommit {
            event_id: generate_event_id(),
        }
    }

    pub fn clear_input() -> Self {
        ClientEvent::InputAudioBufferClear {
            event_id: generate_event_id(),
        }
    }

    pub fn create_item(item: ConversationItem) -> Self {
        ClientEvent::ConversationItemCreate {
            event_id: generate_event_id(),
            previous_item_id: None,
            item,
        }
    }

    pub fn truncate_item(item_id: impl Into<String>, content_index: u32, audio_end_ms: u32) -> Self {
        ClientEvent::ConversationItemTruncate {
            event_id: generate_event_id(),
            item_id: item_id.into(),
            content_index,
            audio_end_ms,
        }
    }

    pub fn delete_item(item_id: impl Into<String>) -> Self {
        ClientEvent::ConversationItemDelete {
            event_id: generate_event_id(),
            item_id: item_id.into(),
        }
    }

    /// Builds a response.create event. Empty options are omitted from the wire.
    pub fn create_response(opts: Option<&ResponseCreateOptions>) -> Self {
        ClientEvent::ResponseCreate {
            event_id: generate_event_id(),
            response: opts.filter(|o| !o.is_empty()).cloned().map(Box::new),
        }
    }

    pub fn cancel_response() -> Self {
        ClientEvent::ResponseCancel {
            event_id: generate_event_id(),
            response_id: None,
        }
    }

    /// Returns the client-generated correlation ID.
    pub fn event_id(&self) -> &str {
        match self {
            ClientEvent::SessionUpdate { event_id, .. }
            | ClientEvent::InputAudioBufferAppend { event_id, .. }
            | ClientEvent::InputAudioBufferCommit { event_id }
            | ClientEvent::InputAudioBufferClear { event_id }
            | ClientEvent::ConversationItemCreate { event_id, .. }
            | ClientEvent::ConversationItemTruncate { event_id, .. }
            | ClientEvent::ConversationItemDelete { event_id, .. }
            | ClientEvent::ResponseCreate { event_id, .. }
            | ClientEvent::ResponseCancel { event_id, .. } => event_id,
        }
    }

    /// Returns the wire type tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::SessionUpdate { .. } => EVENT_TYPE_SESSION_UPDATE,
            ClientEvent::InputAudioBufferAppend { .. } => EVENT_TYPE_INPUT_AUDIO_BUFFER_APPEND,
            ClientEvent::InputAudioBufferCommit { .. } => EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMIT,
            ClientEvent::InputAudioBufferClear { .. } => EVENT_TYPE_INPUT_AUDIO_BUFFER_CLEAR,
            ClientEvent::ConversationItemCreate { .. } => EVENT_TYPE_CONVERSATION_ITEM_CREATE,
            ClientEvent::ConversationItemTruncate { .. } => EVENT_TYPE_CONVERSATION_ITEM_TRUNCATE,
            ClientEvent::ConversationItemDelete { .. } => EVENT_TYPE_CONVERSATION_ITEM_DELETE,
            ClientEvent::ResponseCreate { .. } => EVENT_TYPE_RESPONSE_CREATE,
            ClientEvent::ResponseCancel { .. } => EVENT_TYPE_RESPONSE_CANCEL,
        }
    }

    /// Serializes the event to its JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Server Event
// ============================================================================

/// Server event received from the Realtime API.
#[derive(Debug, Clone)]
pub struct ServerEvent {
    /// Server-assigned event identifier.
    pub event_id: Option<String>,
    /// Type-specific payload.
    pub kind: ServerEventKind,
    /// Raw JSON frame.
    pub raw: Bytes,
}

/// Payload of a server event, keyed by its type tag.
#[derive(Debug, Clone)]
pub enum ServerEventKind {
    Error(ErrorEvent),
    SessionCreated(SessionEvent),
    SessionUpdated(SessionEvent),
    ConversationCreated(ConversationCreated),
    ConversationItemCreated(ItemCreated),
    InputAudioTranscriptionCompleted(TranscriptionCompleted),
    InputAudioTranscriptionFailed(TranscriptionFailed),
    ConversationItemTruncated(ItemTruncated),
    ConversationItemDeleted(ItemDeleted),
    InputAudioBufferCommitted(BufferCommitted),
    InputAudioBufferCleared,
    InputAudioBufferSpeechStarted(SpeechStarted),
    InputAudioBufferSpeechStopped(SpeechStopped),
    ResponseCreated(ResponseEvent),
    ResponseDone(ResponseEvent),
    ResponseOutputItemAdded(OutputItem),
    ResponseOutputItemDone(OutputItem),
    ResponseContentPartAdded(ContentPartEvent),
    ResponseContentPartDone(ContentPartEvent),
    ResponseTextDelta(TextDelta),
    ResponseTextDone(TextDone),
    ResponseAudioDelta(AudioDelta),
    ResponseAudioDone(ContentRef),
    ResponseAudioTranscriptDelta(TextDelta),
    ResponseAudioTranscriptDone(TranscriptDone),
    ResponseFunctionCallArgumentsDelta(FunctionCallArgumentsDelta),
    ResponseFunctionCallArgumentsDone(FunctionCallArgumentsDone),
    RateLimitsUpdated(RateLimitsUpdated),
    /// An event type this crate does not model.
    Unknown {
        event_type: String,
        payload: serde_json::Value,
    },
}

/// Error information from error events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl EventError {
    /// Converts to an API error.
    pub fn to_api_error(&self) -> ApiError {
        ApiError::from_event(
            self.error_type.clone(),
            self.code.clone(),
            self.message.clone(),
            self.param.clone(),
            self.event_id.clone(),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEvent {
    pub error: EventError,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionEvent {
    pub session: SessionResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationCreated {
    pub conversation: ConversationResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemCreated {
    #[serde(default)]
    pub previous_item_id: Option<String>,
    pub item: ConversationItem,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptionCompleted {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub content_index: u32,
    #[serde(default)]
    pub transcript: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptionFailed {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub content_index: u32,
    #[serde(default)]
    pub error: ErrorInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemTruncated {
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub content_index: u32,
    #[serde(default)]
    pub audio_end_ms: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDeleted {
    #[serde(default)]
    pub item_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BufferCommitted {
    #[serde(default)]
    pub previous_item_id: Option<String>,
    #[serde(default)]
    pub item_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechStarted {
    #[serde(default)]
    pub audio_start_ms: u32,
    #[serde(default)]
    pub item_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechStopped {
    #[serde(default)]
    pub audio_end_ms: u32,
    #[serde(default)]
    pub item_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEvent {
    pub response: ResponseResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub response_id: String,
    #[serde(default)]
    pub output_index: u32,
    pub item: ConversationItem,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentPartEvent {
    #[serde(default)]
    pub response_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub output_index: u32,
    #[serde(default)]
    pub content_index: u32,
    pub part: ContentPart,
}

/// Location of a content part inside a response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentRef {
    #[serde(default)]
    pub response_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub output_index: u32,
    #[serde(default)]
    pub content_index: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextDelta {
    #[serde(flatten)]
    pub at: ContentRef,
    #[serde(default)]
    pub delta: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextDone {
    #[serde(flatten)]
    pub at: ContentRef,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptDone {
    #[serde(flatten)]
    pub at: ContentRef,
    #[serde(default)]
    pub transcript: String,
}

/// Streamed audio fragment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioDelta {
    #[serde(flatten)]
    pub at: ContentRef,
    /// Base64 audio as received.
    #[serde(default)]
    pub delta: String,
    /// Decoded audio; empty if `delta` is not valid base64.
    #[serde(skip)]
    pub audio: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionCallArgumentsDelta {
    #[serde(default)]
    pub response_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub output_index: u32,
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub delta: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunctionCallArgumentsDone {
    #[serde(default)]
    pub response_id: String,
    #[serde(default)]
    pub item_id: String,
    #[serde(default)]
    pub output_index: u32,
    #[serde(default)]
    pub call_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitsUpdated {
    #[serde(default)]
    pub rate_limits: Vec<RateLimit>,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    event_id: Option<String>,
}

impl ServerEvent {
    /// Decodes a raw frame into a server event.
    ///
    /// Unknown fields are ignored and unknown event types decode to
    /// [`ServerEventKind::Unknown`]. A frame that is not a JSON object with a
    /// string `type`, or whose payload does not match its type, is a
    /// [`Error::Decode`].
    pub fn decode(data: impl Into<Bytes>) -> Result<Self> {
        let raw: Bytes = data.into();
        let value: serde_json::Value = serde_json::from_slice(&raw).map_err(Error::Decode)?;
        let envelope = Envelope::deserialize(&value).map_err(Error::Decode)?;

        let kind = match envelope.event_type.as_str() {
            EVENT_TYPE_ERROR => ServerEventKind::Error(payload(value)?),
            EVENT_TYPE_SESSION_CREATED => ServerEventKind::SessionCreated(payload(value)?),
            EVENT_TYPE_SESSION_UPDATED => ServerEventKind::SessionUpdated(payload(value)?),
            EVENT_TYPE_CONVERSATION_CREATED => ServerEventKind::ConversationCreated(payload(value)?),
            EVENT_TYPE_CONVERSATION_ITEM_CREATED => {
                ServerEventKind::ConversationItemCreated(payload(value)?)
            }
            EVENT_TYPE_CONVERSATION_ITEM_INPUT_AUDIO_TRANSCRIPTION_COMPLETED => {
                ServerEventKind::InputAudioTranscriptionCompleted(payload(value)?)
            }
            EVENT_TYPE_CONVERSATION_ITEM_INPUT_AUDIO_TRANSCRIPTION_FAILED => {
                ServerEventKind::InputAudioTranscriptionFailed(payload(value)?)
            }
            EVENT_TYPE_CONVERSATION_ITEM_TRUNCATED => {
                ServerEventKind::ConversationItemTruncated(payload(value)?)
            }
            EVENT_TYPE_CONVERSATION_ITEM_DELETED => {
                ServerEventKind::ConversationItemDeleted(payload(value)?)
            }
            EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMITTED => {
                ServerEventKind::InputAudioBufferCommitted(payload(value)?)
            }
            EVENT_TYPE_INPUT_AUDIO_BUFFER_CLEARED => ServerEventKind::InputAudioBufferCleared,
            EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STARTED => {
                ServerEventKind::InputAudioBufferSpeechStarted(payload(value)?)
            }
            EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED => {
                ServerEventKind::InputAudioBufferSpeechStopped(payload(value)?)
            }
            EVENT_TYPE_RESPONSE_CREATED => ServerEventKind::ResponseCreated(payload(value)?),
            EVENT_TYPE_RESPONSE_DONE => ServerEventKind::ResponseDone(payload(value)?),
            EVENT_TYPE_RESPONSE_OUTPUT_ITEM_ADDED => {
                ServerEventKind::ResponseOutputItemAdded(payload(value)?)
            }
            EVENT_TYPE_RESPONSE_OUTPUT_ITEM_DONE => {
                ServerEventKind::ResponseOutputItemDone(payload(value)?)
            }
            EVENT_TYPE_RESPONSE_CONTENT_PART_ADDED => {
                ServerEventKind::ResponseContentPartAdded(payload(value)?)
            }
            EVENT_TYPE_RESPONSE_CONTENT_PART_DONE => {
                ServerEventKind::ResponseContentPartDone(payload(value)?)
            }
            EVENT_TYPE_RESPONSE_TEXT_DELTA => ServerEventKind::ResponseTextDelta(payload(value)?),
            EVENT_TYPE_RESPONSE_TEXT_DONE => ServerEventKind::ResponseTextDone(payload(value)?),
            EVENT_TYPE_RESPONSE_AUDIO_DELTA => {
                let mut delta: AudioDelta = payload(value)?;
                // A bad payload leaves `audio` empty without failing the event.
                if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(&delta.delta) {
                    delta.audio = decoded;
                }
                ServerEventKind::ResponseAudioDelta(delta)
            }
            EVENT_TYPE_RESPONSE_AUDIO_DONE => ServerEventKind::ResponseAudioDone(payload(value)?),
            EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DELTA => {
                ServerEventKind::ResponseAudioTranscriptDelta(payload(value)?)
            }
            EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DONE => {
                ServerEventKind::ResponseAudioTranscriptDone(payload(value)?)
            }
            EVENT_TYPE_RESPONSE_FUNCTION_CALL_ARGUMENTS_DELTA => {
                ServerEventKind::ResponseFunctionCallArgumentsDelta(payload(value)?)
            }
            EVENT_TYPE_RESPONSE_FUNCTION_CALL_ARGUMENTS_DONE => {
                ServerEventKind::ResponseFunctionCallArgumentsDone(payload(value)?)
            }
            EVENT_TYPE_RATE_LIMITS_UPDATED => ServerEventKind::RateLimitsUpdated(payload(value)?),
            _ => ServerEventKind::Unknown {
                event_type: envelope.event_type.clone(),
                payload: value,
            },
        };

        Ok(ServerEvent {
            event_id: envelope.event_id,
            kind,
            raw,
        })
    }

    /// Returns the wire type tag.
    pub fn event_type(&self) -> &str {
        match &self.kind {
            ServerEventKind::Error(_) => EVENT_TYPE_ERROR,
            ServerEventKind::SessionCreated(_) => EVENT_TYPE_SESSION_CREATED,
            ServerEventKind::SessionUpdated(_) => EVENT_TYPE_SESSION_UPDATED,
            ServerEventKind::ConversationCreated(_) => EVENT_TYPE_CONVERSATION_CREATED,
            ServerEventKind::ConversationItemCreated(_) => EVENT_TYPE_CONVERSATION_ITEM_CREATED,
            ServerEventKind::InputAudioTranscriptionCompleted(_) => {
                EVENT_TYPE_CONVERSATION_ITEM_INPUT_AUDIO_TRANSCRIPTION_COMPLETED
            }
            ServerEventKind::InputAudioTranscriptionFailed(_) => {
                EVENT_TYPE_CONVERSATION_ITEM_INPUT_AUDIO_TRANSCRIPTION_FAILED
            }
            ServerEventKind::ConversationItemTruncated(_) => EVENT_TYPE_CONVERSATION_ITEM_TRUNCATED,
            ServerEventKind::ConversationItemDeleted(_) => EVENT_TYPE_CONVERSATION_ITEM_DELETED,
            ServerEventKind::InputAudioBufferCommitted(_) => EVENT_TYPE_INPUT_AUDIO_BUFFER_COMMITTED,
            ServerEventKind::InputAudioBufferCleared => EVENT_TYPE_INPUT_AUDIO_BUFFER_CLEARED,
            ServerEventKind::InputAudioBufferSpeechStarted(_) => {
                EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STARTED
            }
            ServerEventKind::InputAudioBufferSpeechStopped(_) => {
                EVENT_TYPE_INPUT_AUDIO_BUFFER_SPEECH_STOPPED
            }
            ServerEventKind::ResponseCreated(_) => EVENT_TYPE_RESPONSE_CREATED,
            ServerEventKind::ResponseDone(_) => EVENT_TYPE_RESPONSE_DONE,
            ServerEventKind::ResponseOutputItemAdded(_) => EVENT_TYPE_RESPONSE_OUTPUT_ITEM_ADDED,
            ServerEventKind::ResponseOutputItemDone(_) => EVENT_TYPE_RESPONSE_OUTPUT_ITEM_DONE,
            ServerEventKind::ResponseContentPartAdded(_) => EVENT_TYPE_RESPONSE_CONTENT_PART_ADDED,
            ServerEventKind::ResponseContentPartDone(_) => EVENT_TYPE_RESPONSE_CONTENT_PART_DONE,
            ServerEventKind::ResponseTextDelta(_) => EVENT_TYPE_RESPONSE_TEXT_DELTA,
            ServerEventKind::ResponseTextDone(_) => EVENT_TYPE_RESPONSE_TEXT_DONE,
            ServerEventKind::ResponseAudioDelta(_) => EVENT_TYPE_RESPONSE_AUDIO_DELTA,
            ServerEventKind::ResponseAudioDone(_) => EVENT_TYPE_RESPONSE_AUDIO_DONE,
            ServerEventKind::ResponseAudioTranscriptDelta(_) => {
                EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DELTA
            }
            ServerEventKind::ResponseAudioTranscriptDone(_) => {
                EVENT_TYPE_RESPONSE_AUDIO_TRANSCRIPT_DONE
            }
            ServerEventKind::ResponseFunctionCallArgumentsDelta(_) => {
                EVENT_TYPE_RESPONSE_FUNCTION_CALL_ARGUMENTS_DELTA
            }
            ServerEventKind::ResponseFunctionCallArgumentsDone(_) => {
                EVENT_TYPE_RESPONSE_FUNCTION_CALL_ARGUMENTS_DONE
            }
            ServerEventKind::RateLimitsUpdated(_) => EVENT_TYPE_RATE_LIMITS_UPDATED,
            ServerEventKind::Unknown { event_type, .. } => event_type,
        }
    }

    /// Returns true if this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self.kind, ServerEventKind::Error(_))
    }

    /// Returns true if this is a response done event.
    pub fn is_response_done(&self) -> bool {
        matches!(self.kind, ServerEventKind::ResponseDone(_))
    }

    /// Returns true if this is an audio delta event.
    pub fn is_audio_delta(&self) -> bool {
        matches!(self.kind, ServerEventKind::ResponseAudioDelta(_))
    }

    /// Returns decoded audio for audio delta events.
    pub fn audio(&self) -> Option<&[u8]> {
        match &self.kind {
            ServerEventKind::ResponseAudioDelta(d) => Some(&d.audio),
            _ => None,
        }
    }

    /// Returns the text of text, transcript and function-argument deltas.
    pub fn delta_text(&self) -> Option<&str> {
        match &self.kind {
            ServerEventKind::ResponseTextDelta(d) | ServerEventKind::ResponseAudioTranscriptDelta(d) => {
                Some(&d.delta)
            }
            ServerEventKind::ResponseFunctionCallArgumentsDelta(d) => Some(&d.delta),
            _ => None,
        }
    }

    /// Returns the session resource of session.created/updated events.
    pub fn session(&self) -> Option<&SessionResource> {
        match &self.kind {
            ServerEventKind::SessionCreated(e) | ServerEventKind::SessionUpdated(e) => Some(&e.session),
            _ => None,
        }
    }

    /// Returns the response resource of response.created/done events.
    pub fn response(&self) -> Option<&ResponseResource> {
        match &self.kind {
            ServerEventKind::ResponseCreated(e) | ServerEventKind::ResponseDone(e) => Some(&e.response),
            _ => None,
        }
    }
}

fn payload<T: DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(Error::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_ids_are_distinct() {
        let a = ClientEvent::commit_input();
        let b = ClientEvent::commit_input();
        assert!(a.event_id().starts_with("evt_"));
        assert!(a.event_id().len() > 4);
        assert_ne!(a.event_id(), b.event_id());
    }

    #[test]
    fn test_client_event_wire_form() {
        let event = ClientEvent::truncate_item("item_1", 0, 1500);
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "conversation.item.truncate");
        assert_eq!(value["event_id"], event.event_id());
        assert_eq!(value["item_id"], "item_1");
        assert_eq!(value["content_index"], 0);
        assert_eq!(value["audio_end_ms"], 1500);
    }

    #[test]
    fn test_session_update_disabled_vad() {
        let event = ClientEvent::session_update(&SessionConfig::with_vad_disabled());
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"], json!({ "turn_detection": null }));
    }

    #[test]
    fn test_create_response_omits_empty_options() {
        let event = ClientEvent::create_response(Some(&ResponseCreateOptions::default()));
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert!(value.get("response").is_none());

        let opts = ResponseCreateOptions {
            modalities: vec![MODALITY_TEXT.to_string()],
            max_output_tokens: Some(MaxTokens::Infinite),
            ..Default::default()
        };
        let event = ClientEvent::create_response(Some(&opts));
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(
            value["response"],
            json!({ "modalities": ["text"], "max_output_tokens": "inf" })
        );
    }

    #[test]
    fn test_append_audio_encodes_base64() {
        let event = ClientEvent::append_audio(&[0x01, 0x02, 0x03]);
        match event {
            ClientEvent::InputAudioBufferAppend { audio, .. } => assert_eq!(audio, "AQID"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_audio_delta() {
        let frame = json!({
            "type": "response.audio.delta",
            "event_id": "event_1",
            "response_id": "resp_1",
            "item_id": "item_1",
            "output_index": 0,
            "content_index": 0,
            "delta": "AQID",
            "future_field": true,
        })
        .to_string();

        let event = ServerEvent::decode(frame.into_bytes()).unwrap();
        assert_eq!(event.event_type(), EVENT_TYPE_RESPONSE_AUDIO_DELTA);
        assert_eq!(event.event_id.as_deref(), Some("event_1"));
        match &event.kind {
            ServerEventKind::ResponseAudioDelta(d) => {
                assert_eq!(d.delta, "AQID");
                assert_eq!(d.audio, vec![1, 2, 3]);
                assert_eq!(d.at.response_id, "resp_1");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_decode_audio_delta_bad_base64() {
        let frame = json!({
            "type": "response.audio.delta",
            "response_id": "resp_1",
            "item_id": "item_1",
            "delta": "not base64!!",
        })
        .to_string();

        let event = ServerEvent::decode(frame.into_bytes()).unwrap();
        match &event.kind {
            ServerEventKind::ResponseAudioDelta(d) => {
                assert_eq!(d.delta, "not base64!!");
                assert!(d.audio.is_empty());
                assert_eq!(d.at.item_id, "item_1");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
        assert_eq!(event.audio(), Some(&[][..]));
    }

    #[test]
    fn test_decode_session_created() {
        let frame = json!({
            "type": "session.created",
            "event_id": "event_2",
            "session": {
                "id": "sess_123",
                "model": "gpt-4o-realtime-preview",
                "voice": "alloy",
                "turn_detection": { "type": "server_vad", "threshold": 0.5 },
                "max_response_output_tokens": "inf",
            },
        })
        .to_string();

        let event = ServerEvent::decode(frame.into_bytes()).unwrap();
        let session = event.session().unwrap();
        assert_eq!(session.id, "sess_123");
        assert_eq!(session.max_response_output_tokens, Some(MaxTokens::Infinite));
        assert_eq!(
            session.turn_detection.as_ref().and_then(|t| t.detection_type.as_deref()),
            Some(VAD_SERVER_VAD)
        );
    }

    #[test]
    fn test_decode_response_done() {
        let frame = json!({
            "type": "response.done",
            "response": {
                "id": "resp_1",
                "status": "completed",
                "output": [{ "id": "item_1", "type": "message", "role": "assistant" }],
                "usage": { "total_tokens": 30, "input_tokens": 10, "output_tokens": 20 },
            },
        })
        .to_string();

        let event = ServerEvent::decode(frame.into_bytes()).unwrap();
        assert!(event.is_response_done());
        let response = event.response().unwrap();
        assert!(response.is_completed());
        assert_eq!(response.output.len(), 1);
        assert_eq!(response.usage.as_ref().map(|u| u.total_tokens), Some(30));
    }

    #[test]
    fn test_decode_unknown_type() {
        let frame = br#"{"type":"output_audio_buffer.started","response_id":"resp_1"}"#;
        let event = ServerEvent::decode(&frame[..]).unwrap();
        assert_eq!(event.event_type(), "output_audio_buffer.started");
        match &event.kind {
            ServerEventKind::Unknown { payload, .. } => assert_eq!(payload["response_id"], "resp_1"),
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(ServerEvent::decode(&b"{not json"[..]), Err(Error::Decode(_))));
        assert!(matches!(ServerEvent::decode(&b"[1,2,3]"[..]), Err(Error::Decode(_))));
        assert!(matches!(ServerEvent::decode(&br#"{"event_id":"x"}"#[..]), Err(Error::Decode(_))));
        // Known type with a payload of the wrong shape.
        assert!(matches!(
            ServerEvent::decode(&br#"{"type":"session.created","session":42}"#[..]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_decode_error_event() {
        let frame = br#"{"type":"error","event_id":"event_9","error":{"type":"invalid_request_error","code":"invalid_value","message":"bad","event_id":"evt_abc"}}"#;
        let event = ServerEvent::decode(&frame[..]).unwrap();
        match &event.kind {
            ServerEventKind::Error(e) => {
                let api = e.error.to_api_error();
                assert_eq!(api.code.as_deref(), Some("invalid_value"));
                assert_eq!(api.event_id.as_deref(), Some("evt_abc"));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_delta_text() {
        let frame = br#"{"type":"response.text.delta","response_id":"r","item_id":"i","output_index":0,"content_index":0,"delta":"Hel"}"#;
        let event = ServerEvent::decode(&frame[..]).unwrap();
        assert_eq!(event.delta_text(), Some("Hel"));
        assert_eq!(event.audio(), None);
    }
}
