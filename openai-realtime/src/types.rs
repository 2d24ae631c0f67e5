//! Type definitions for OpenAI Realtime API.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Models
// ============================================================================

/// GPT-4o realtime preview model.
pub const MODEL_GPT4O_REALTIME_PREVIEW: &str = "gpt-4o-realtime-preview";
/// GPT-4o realtime preview model (2024-12-17 version).
pub const MODEL_GPT4O_REALTIME_PREVIEW_20241217: &str = "gpt-4o-realtime-preview-2024-12-17";
/// GPT-4o mini realtime preview model.
pub const MODEL_GPT4O_MINI_REALTIME_PREVIEW: &str = "gpt-4o-mini-realtime-preview";
/// GPT-4o mini realtime preview model (2024-12-17 version).
pub const MODEL_GPT4O_MINI_REALTIME_PREVIEW_20241217: &str = "gpt-4o-mini-realtime-preview-2024-12-17";

/// Default transcription model.
pub const TRANSCRIPTION_MODEL_WHISPER_1: &str = "whisper-1";

// ============================================================================
// Audio Formats
// ============================================================================

/// 16-bit PCM audio at 24kHz, mono, little-endian.
pub const AUDIO_FORMAT_PCM16: &str = "pcm16";
/// G.711 μ-law audio at 8kHz.
pub const AUDIO_FORMAT_G711_ULAW: &str = "g711_ulaw";
/// G.711 A-law audio at 8kHz.
pub const AUDIO_FORMAT_G711_ALAW: &str = "g711_alaw";

/// Sample rate of PCM16 audio exchanged with the service.
pub const PCM16_SAMPLE_RATE: u32 = 24000;

// ============================================================================
// Voices
// ============================================================================

pub const VOICE_ALLOY: &str = "alloy";
pub const VOICE_ASH: &str = "ash";
pub const VOICE_BALLAD: &str = "ballad";
pub const VOICE_CORAL: &str = "coral";
pub const VOICE_ECHO: &str = "echo";
pub const VOICE_SAGE: &str = "sage";
pub const VOICE_SHIMMER: &str = "shimmer";
pub const VOICE_VERSE: &str = "verse";

// ============================================================================
// VAD Modes
// ============================================================================

/// Server-side voice activity detection.
pub const VAD_SERVER_VAD: &str = "server_vad";
/// Semantic voice activity detection.
pub const VAD_SEMANTIC_VAD: &str = "semantic_vad";

pub const EAGERNESS_LOW: &str = "low";
pub const EAGERNESS_MEDIUM: &str = "medium";
pub const EAGERNESS_HIGH: &str = "high";
pub const EAGERNESS_AUTO: &str = "auto";

// ============================================================================
// Modalities
// ============================================================================

pub const MODALITY_TEXT: &str = "text";
pub const MODALITY_AUDIO: &str = "audio";

// ============================================================================
// Items
// ============================================================================

pub const ITEM_TYPE_MESSAGE: &str = "message";
pub const ITEM_TYPE_FUNCTION_CALL: &str = "function_call";
pub const ITEM_TYPE_FUNCTION_CALL_OUTPUT: &str = "function_call_output";

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";
pub const ROLE_SYSTEM: &str = "system";

pub const CONTENT_TYPE_INPUT_TEXT: &str = "input_text";
pub const CONTENT_TYPE_INPUT_AUDIO: &str = "input_audio";
pub const CONTENT_TYPE_ITEM_REFERENCE: &str = "item_reference";
pub const CONTENT_TYPE_TEXT: &str = "text";
pub const CONTENT_TYPE_AUDIO: &str = "audio";

// ============================================================================
// Response Status
// ============================================================================

pub const RESPONSE_STATUS_IN_PROGRESS: &str = "in_progress";
pub const RESPONSE_STATUS_COMPLETED: &str = "completed";
pub const RESPONSE_STATUS_CANCELLED: &str = "cancelled";
pub const RESPONSE_STATUS_INCOMPLETE: &str = "incomplete";
pub const RESPONSE_STATUS_FAILED: &str = "failed";

// ============================================================================
// Connection
// ============================================================================

/// Wire mechanism carrying a realtime session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    /// Persistent authenticated WebSocket.
    #[default]
    WebSocket,
    /// Negotiated WebRTC peer connection with an event data channel.
    WebRtc,
}

/// Configuration for establishing a realtime connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Model ID to use. Default: gpt-4o-realtime-preview
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,

    /// Voice requested when minting a WebRTC client secret. Default: alloy
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub voice: String,
}

impl ConnectConfig {
    pub(crate) fn model_or_default(&self) -> &str {
        if self.model.is_empty() {
            MODEL_GPT4O_REALTIME_PREVIEW
        } else {
            &self.model
        }
    }

    pub(crate) fn voice_or_default(&self) -> &str {
        if self.voice.is_empty() {
            VOICE_ALLOY
        } else {
            &self.voice
        }
    }
}

// ============================================================================
// Session Configuration
// ============================================================================

/// Configuration for updating session parameters.
///
/// Every field is optional; omitted fields keep the server's current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Output modalities. Default: ["text", "audio"]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modalities: Vec<String>,

    /// System prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Voice ID for audio output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Input audio format. Default: pcm16
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,

    /// Output audio format. Default: pcm16
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,

    /// Input audio transcription config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<TranscriptionConfig>,

    /// Voice activity detection config.
    #[serde(default, skip_serializing_if = "TurnDetectionSetting::is_unset")]
    pub turn_detection: TurnDetectionSetting,

    /// Available function tools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,

    /// Tool choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Temperature (0.6-1.2). Default: 0.8
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Max response output tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_response_output_tokens: Option<MaxTokens>,

    /// Additional raw fields passed through as-is.
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionConfig {
    /// Creates a new session config with VAD disabled (manual mode).
    pub fn with_vad_disabled() -> Self {
        Self {
            turn_detection: TurnDetectionSetting::Disabled,
            ..Default::default()
        }
    }

    /// Converts to a JSON value.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}

/// Turn detection setting of a session update.
///
/// `Unset` omits the field (keep the server's value), `Disabled` sends an
/// explicit `null` (manual turn mode), `Enabled` sends the given settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TurnDetectionSetting {
    #[default]
    Unset,
    Disabled,
    Enabled(TurnDetection),
}

impl TurnDetectionSetting {
    pub fn is_unset(&self) -> bool {
        matches!(self, TurnDetectionSetting::Unset)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, TurnDetectionSetting::Disabled)
    }
}

impl From<TurnDetection> for TurnDetectionSetting {
    fn from(td: TurnDetection) -> Self {
        TurnDetectionSetting::Enabled(td)
    }
}

impl Serialize for TurnDetectionSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TurnDetectionSetting::Enabled(td) => td.serialize(serializer),
            // Unset is skipped at the field level.
            TurnDetectionSetting::Unset | TurnDetectionSetting::Disabled => {
                serializer.serialize_none()
            }
        }
    }
}

impl<'de> Deserialize<'de> for TurnDetectionSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A missing field never reaches here; it takes the Unset default.
        Ok(match Option::<TurnDetection>::deserialize(deserializer)? {
            Some(td) => TurnDetectionSetting::Enabled(td),
            None => TurnDetectionSetting::Disabled,
        })
    }
}

/// Transcription configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Transcription model. Default: whisper-1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Input language in ISO-639-1 format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Optional text to guide the transcription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Voice activity detection configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    /// VAD mode: "server_vad" or "semantic_vad".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<String>,

    /// VAD sensitivity (0.0-1.0). Default: 0.5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// Padding before speech start (ms). Default: 300
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_padding_ms: Option<u32>,

    /// Silence duration to detect end of speech (ms). Default: 500
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silence_duration_ms: Option<u32>,

    /// Auto-create response when VAD detects end of speech. Default: true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_response: Option<bool>,

    /// Interrupt current response on new speech. Default: true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt_response: Option<bool>,

    /// Response eagerness for semantic_vad: "low", "medium", "high", "auto".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eagerness: Option<String>,
}

impl TurnDetection {
    /// Server VAD with default thresholds.
    pub fn server_vad() -> Self {
        Self {
            detection_type: Some(VAD_SERVER_VAD.to_string()),
            ..Default::default()
        }
    }

    /// Semantic VAD with the given eagerness.
    pub fn semantic_vad(eagerness: impl Into<String>) -> Self {
        Self {
            detection_type: Some(VAD_SEMANTIC_VAD.to_string()),
            eagerness: Some(eagerness.into()),
            ..Default::default()
        }
    }
}

/// Function tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool type. Always "function".
    #[serde(rename = "type")]
    pub tool_type: String,

    /// Function name.
    pub name: String,

    /// Function description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON Schema for function parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, serde_json::Value>>,
}

impl Tool {
    /// Creates a new function tool.
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            tool_type: "function".to_string(),
            name: name.into(),
            description: None,
            parameters: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the parameters schema.
    pub fn with_parameters(mut self, parameters: HashMap<String, serde_json::Value>) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

// ============================================================================
// Tool Choice
// ============================================================================

/// Tool choice mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoiceMode {
    Auto,
    None,
    Required,
}

/// Forces a specific function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionChoice {
    /// Always "function".
    #[serde(rename = "type")]
    pub choice_type: String,
    pub name: String,
}

/// Tool choice: a mode string, a named function, or raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    Mode(ToolChoiceMode),
    Function(FunctionChoice),
    /// Any other shape, passed through unchanged.
    Raw(serde_json::Value),
}

impl ToolChoice {
    pub fn auto() -> Self {
        ToolChoice::Mode(ToolChoiceMode::Auto)
    }

    pub fn none() -> Self {
        ToolChoice::Mode(ToolChoiceMode::None)
    }

    pub fn required() -> Self {
        ToolChoice::Mode(ToolChoiceMode::Required)
    }

    pub fn function(name: impl Into<String>) -> Self {
        ToolChoice::Function(FunctionChoice {
            choice_type: "function".to_string(),
            name: name.into(),
        })
    }
}

// ============================================================================
// Max Tokens
// ============================================================================

/// Output token limit: a count or unlimited (`"inf"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxTokens {
    Limit(u32),
    Infinite,
}

impl Serialize for MaxTokens {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxTokens::Limit(n) => serializer.serialize_u32(*n),
            MaxTokens::Infinite => serializer.serialize_str("inf"),
        }
    }
}

impl<'de> Deserialize<'de> for MaxTokens {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Limit(u32),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Limit(n) => Ok(MaxTokens::Limit(n)),
            Repr::Text(s) if s == "inf" => Ok(MaxTokens::Infinite),
            Repr::Text(s) => Err(de::Error::custom(format!("invalid max tokens: {}", s))),
        }
    }
}

// ============================================================================
// Response Create Options
// ============================================================================

/// Options for creating a response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseCreateOptions {
    /// Output modalities for this response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modalities: Vec<String>,

    /// Instructions override for this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Voice override for this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Output audio format override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,

    /// Tools override for this response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,

    /// Tool choice override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    /// Temperature override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Max output tokens for this response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<MaxTokens>,

    /// Conversation handling: "auto" (default) or "none".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,

    /// Input items instead of using the conversation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<ConversationItem>,

    /// Additional raw fields passed through as-is.
    #[serde(flatten, default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResponseCreateOptions {
    /// Returns true if no override is set.
    pub fn is_empty(&self) -> bool {
        self.modalities.is_empty()
            && self.instructions.is_none()
            && self.voice.is_none()
            && self.output_audio_format.is_none()
            && self.tools.is_empty()
            && self.tool_choice.is_none()
            && self.temperature.is_none()
            && self.max_output_tokens.is_none()
            && self.conversation.is_none()
            && self.input.is_empty()
            && self.extra.is_empty()
    }
}

// ============================================================================
// Resource Types
// ============================================================================

/// Session state returned by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionResource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub expires_at: i64,
    #[serde(default)]
    pub modalities: Vec<String>,
    #[serde(default)]
    pub instructions: String,
    #[serde(default)]
    pub voice: String,
    #[serde(default)]
    pub input_audio_format: String,
    #[serde(default)]
    pub output_audio_format: String,
    #[serde(default)]
    pub input_audio_transcription: Option<TranscriptionConfig>,
    #[serde(default)]
    pub turn_detection: Option<TurnDetection>,
    #[serde(default)]
    pub tools: Vec<Tool>,
    #[serde(default)]
    pub tool_choice: Option<ToolChoice>,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub max_response_output_tokens: Option<MaxTokens>,
}

/// Conversation resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationResource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
}

/// Conversation item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// "message", "function_call", "function_call_output"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// "user", "assistant", "system"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentPart>,
    /// For function_call and function_call_output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// For function_call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// For function_call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    /// For function_call_output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl ConversationItem {
    /// Creates a user text message item.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::message(ROLE_USER, ContentPart::input_text(text))
    }

    /// Creates an assistant text message item.
    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self::message(
            ROLE_ASSISTANT,
            ContentPart {
                content_type: Some(CONTENT_TYPE_TEXT.to_string()),
                text: Some(text.into()),
                ..Default::default()
            },
        )
    }

    /// Creates a user audio message item.
    pub fn user_audio(audio_base64: impl Into<String>, transcript: Option<String>) -> Self {
        Self::message(
            ROLE_USER,
            ContentPart {
                content_type: Some(CONTENT_TYPE_INPUT_AUDIO.to_string()),
                audio: Some(audio_base64.into()),
                transcript,
                ..Default::default()
            },
        )
    }

    /// Creates a function call output item.
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            item_type: Some(ITEM_TYPE_FUNCTION_CALL_OUTPUT.to_string()),
            call_id: Some(call_id.into()),
            output: Some(output.into()),
            ..Default::default()
        }
    }

    fn message(role: &str, part: ContentPart) -> Self {
        Self {
            item_type: Some(ITEM_TYPE_MESSAGE.to_string()),
            role: Some(role.to_string()),
            content: vec![part],
            ..Default::default()
        }
    }
}

/// Content part of a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// "input_text", "input_audio", "item_reference", "text", "audio"
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64 encoded audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Transcript for audio parts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    /// For item_reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ContentPart {
    pub fn input_text(text: impl Into<String>) -> Self {
        Self {
            content_type: Some(CONTENT_TYPE_INPUT_TEXT.to_string()),
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Response resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseResource {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    /// "in_progress", "completed", "cancelled", "incomplete", "failed"
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_details: Option<StatusDetails>,
    #[serde(default)]
    pub output: Vec<ConversationItem>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ResponseResource {
    pub fn is_completed(&self) -> bool {
        self.status == RESPONSE_STATUS_COMPLETED
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RESPONSE_STATUS_CANCELLED
    }

    pub fn is_failed(&self) -> bool {
        self.status == RESPONSE_STATUS_FAILED
    }
}

/// Status details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusDetails {
    #[serde(rename = "type", default)]
    pub details_type: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

/// Error information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub param: Option<String>,
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub input_token_details: Option<TokenDetails>,
    #[serde(default)]
    pub output_token_details: Option<TokenDetails>,
}

/// Token details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenDetails {
    #[serde(default)]
    pub cached_tokens: u32,
    #[serde(default)]
    pub text_tokens: u32,
    #[serde(default)]
    pub audio_tokens: u32,
    #[serde(default)]
    pub cached_tokens_details: Option<CachedTokensDetails>,
}

/// Cached token details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedTokensDetails {
    #[serde(default)]
    pub text_tokens: u32,
    #[serde(default)]
    pub audio_tokens: u32,
}

/// Rate limit information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimit {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub remaining: u64,
    #[serde(default)]
    pub reset_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_detection_disabled_is_null() {
        let config = SessionConfig::with_vad_disabled();
        let value = config.to_json_value();
        assert_eq!(value, json!({ "turn_detection": null }));
    }

    #[test]
    fn test_turn_detection_unset_is_omitted() {
        let config = SessionConfig {
            voice: Some(VOICE_ECHO.to_string()),
            ..Default::default()
        };
        let value = config.to_json_value();
        assert!(value.get("turn_detection").is_none());
        assert_eq!(value["voice"], "echo");
    }

    #[test]
    fn test_turn_detection_enabled() {
        let config = SessionConfig {
            turn_detection: TurnDetection {
                silence_duration_ms: Some(800),
                ..TurnDetection::server_vad()
            }
            .into(),
            ..Default::default()
        };
        let value = config.to_json_value();
        assert_eq!(
            value["turn_detection"],
            json!({ "type": "server_vad", "silence_duration_ms": 800 })
        );
    }

    #[test]
    fn test_turn_detection_setting_parse() {
        let disabled: SessionConfig = serde_json::from_value(json!({ "turn_detection": null })).unwrap();
        assert!(disabled.turn_detection.is_disabled());

        let unset: SessionConfig = serde_json::from_value(json!({ "voice": "alloy" })).unwrap();
        assert!(unset.turn_detection.is_unset());
        assert!(unset.extra.is_empty());

        let enabled: SessionConfig =
            serde_json::from_value(json!({ "turn_detection": { "type": "semantic_vad", "eagerness": "low" } }))
                .unwrap();
        assert_eq!(
            enabled.turn_detection,
            TurnDetectionSetting::Enabled(TurnDetection::semantic_vad(EAGERNESS_LOW))
        );
    }

    #[test]
    fn test_tool_choice_variants() {
        assert_eq!(serde_json::to_value(ToolChoice::auto()).unwrap(), json!("auto"));
        assert_eq!(
            serde_json::to_value(ToolChoice::function("get_weather")).unwrap(),
            json!({ "type": "function", "name": "get_weather" })
        );

        let parsed: ToolChoice = serde_json::from_value(json!("required")).unwrap();
        assert_eq!(parsed, ToolChoice::required());

        let parsed: ToolChoice = serde_json::from_value(json!({ "type": "function", "name": "f" })).unwrap();
        assert_eq!(parsed, ToolChoice::function("f"));

        let parsed: ToolChoice = serde_json::from_value(json!({ "type": "mcp", "server": "x" })).unwrap();
        assert!(matches!(parsed, ToolChoice::Raw(_)));
    }

    #[test]
    fn test_max_tokens() {
        assert_eq!(serde_json::to_value(MaxTokens::Infinite).unwrap(), json!("inf"));
        assert_eq!(serde_json::to_value(MaxTokens::Limit(256)).unwrap(), json!(256));
        assert_eq!(serde_json::from_value::<MaxTokens>(json!("inf")).unwrap(), MaxTokens::Infinite);
        assert_eq!(serde_json::from_value::<MaxTokens>(json!(42)).unwrap(), MaxTokens::Limit(42));
        assert!(serde_json::from_value::<MaxTokens>(json!("lots")).is_err());
    }

    #[test]
    fn test_session_config_extra_passthrough() {
        let mut config = SessionConfig::default();
        config.extra.insert("speed".to_string(), json!(1.2));
        assert_eq!(config.to_json_value(), json!({ "speed": 1.2 }));
    }

    #[test]
    fn test_response_options_is_empty() {
        assert!(ResponseCreateOptions::default().is_empty());
        let opts = ResponseCreateOptions {
            instructions: Some("be brief".to_string()),
            ..Default::default()
        };
        assert!(!opts.is_empty());
    }

    #[test]
    fn test_conversation_item_builders() {
        let item = ConversationItem::user_text("hi");
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "type": "message", "role": "user", "content": [{ "type": "input_text", "text": "hi" }] })
        );

        let item = ConversationItem::function_call_output("call_1", "{\"ok\":true}");
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "type": "function_call_output", "call_id": "call_1", "output": "{\"ok\":true}" })
        );
    }
}
