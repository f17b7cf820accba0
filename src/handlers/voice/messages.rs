//! Voice session wire protocol
//!
//! Control messages are JSON objects tagged by their `event` field. Audio
//! travels separately as binary frames of PCM16 LE mono in both directions.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Maximum allowed size for text messages (50 KB)
pub const MAX_TEXT_SIZE: usize = 50 * 1024;

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

/// Incoming control messages from the client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event")]
pub enum IncomingMessage {
    /// Open a phase, either recording audio or waiting for text
    #[serde(rename = "start")]
    Start {
        #[serde(default)]
        text_only: bool,
    },

    /// Close the recording phase and transcribe it
    #[serde(rename = "end", alias = "audio_end")]
    End,

    /// Text to synthesize in a text-only phase
    #[serde(rename = "text")]
    Text { text: String },
}

impl IncomingMessage {
    /// Decode one inbound text frame.
    pub fn parse(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }

    /// Validates message field sizes to prevent resource exhaustion.
    pub fn validate_size(&self) -> Result<(), ValidationError> {
        match self {
            IncomingMessage::Text { text } if text.len() > MAX_TEXT_SIZE => {
                Err(ValidationError::TextTooLarge {
                    size: text.len(),
                    max: MAX_TEXT_SIZE,
                })
            }
            _ => Ok(()),
        }
    }

    /// Event name, for logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            IncomingMessage::Start { .. } => "start",
            IncomingMessage::End => "end",
            IncomingMessage::Text { .. } => "text",
        }
    }
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Outgoing control messages to the client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event")]
pub enum OutgoingMessage {
    /// Final transcript of a recording phase
    #[serde(rename = "transcript")]
    Transcript { text: String },

    /// Every audio chunk of the current synthesis has been sent
    #[serde(rename = "tts_end")]
    TtsEnd,

    /// Something went wrong; `code` is machine-readable
    #[serde(rename = "error")]
    Error { message: String, code: String },
}

impl OutgoingMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        OutgoingMessage::Error {
            message: message.into(),
            code: code.into(),
        }
    }
}

// =============================================================================
// Message Routing
// =============================================================================

/// What the writer task should put on the socket next
#[derive(Debug)]
pub enum MessageRoute {
    /// JSON text message
    Outgoing(OutgoingMessage),
    /// Binary audio data
    Audio(Bytes),
    /// Close connection
    Close,
}

// =============================================================================
// Validation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Text too large: {size} bytes (max: {max} bytes)")]
    TextTooLarge { size: usize, max: usize },
}
