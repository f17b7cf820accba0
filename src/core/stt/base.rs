use async_trait::async_trait;
use bytes::Bytes;

use crate::core::http::FailureKind;

/// Error types for STT operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum STTError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
}

impl STTError {
    /// Failures that justify switching to the fallback provider.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            STTError::AuthenticationFailed(_) | STTError::Unavailable(_)
        )
    }

    pub(crate) fn from_failure(kind: FailureKind, message: String) -> Self {
        match kind {
            FailureKind::Auth => STTError::AuthenticationFailed(message),
            FailureKind::Unavailable => STTError::Unavailable(message),
            FailureKind::UnsupportedFormat => STTError::UnsupportedFormat(message),
            FailureKind::Other => STTError::ProviderError(message),
        }
    }
}

/// One-shot speech-to-text capability.
///
/// Implementations receive the complete PCM16 mono buffer of one recording
/// phase and return the final transcript. They hold no per-call state, so a
/// single instance serves every phase of a session.
#[async_trait]
pub trait BaseSTT: Send + Sync {
    /// Transcribe one recording phase.
    async fn transcribe(&self, audio: Bytes) -> Result<String, STTError>;

    /// Canonical provider name, used in logs.
    fn provider_name(&self) -> &'static str;

    /// Whether this is the deterministic stand-in provider.
    fn is_mock(&self) -> bool {
        false
    }
}
