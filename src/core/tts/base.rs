use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::core::http::FailureKind;

/// Lazy, finite, non-restartable sequence of PCM16 chunks.
pub type AudioStream = BoxStream<'static, Result<Bytes, TTSError>>;

/// Error types for TTS operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TTSError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
}

impl TTSError {
    /// Failures that justify switching to the fallback provider.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            TTSError::AuthenticationFailed(_) | TTSError::Unavailable(_)
        )
    }

    pub(crate) fn from_failure(kind: FailureKind, message: String) -> Self {
        match kind {
            FailureKind::Auth => TTSError::AuthenticationFailed(message),
            FailureKind::Unavailable => TTSError::Unavailable(message),
            FailureKind::UnsupportedFormat => TTSError::AudioProcessingError(message),
            FailureKind::Other => TTSError::ProviderError(message),
        }
    }
}

/// Text-to-speech capability.
///
/// `synthesize` resolves once the vendor has accepted the request (so
/// credential and availability failures surface there) and hands back a
/// stream that yields audio as the vendor produces it.
#[async_trait]
pub trait BaseTTS: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, TTSError>;

    /// Canonical provider name, used in logs.
    fn provider_name(&self) -> &'static str;

    fn is_mock(&self) -> bool {
        false
    }
}
