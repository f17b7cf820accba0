//! Per-session provider gateways.
//!
//! A gateway wraps the provider selected for one role and owns the
//! primary → mock fallback chain. Gateways are resolved once when a session
//! starts and are owned by that session alone; a switch to the mock is
//! therefore cached for the rest of the session and never re-attempted.

use bytes::Bytes;
use tracing::{info, warn};

use super::registry::ProviderRegistry;
use super::stt::{BaseSTT, MockSTT, STTError, create_stt_provider};
use super::tts::{AudioStream, BaseTTS, MockTTS, TTSError, create_tts_provider};

enum Backend<P: ?Sized, E> {
    Ready(Box<P>),
    /// Primary lacks credentials and fallback is disallowed; every call fails.
    Unconfigured(E),
}

/// Speech-to-text side of a session.
pub struct SttGateway {
    backend: Backend<dyn BaseSTT, STTError>,
    allow_fallback: bool,
    using_fallback: bool,
}

impl SttGateway {
    /// Wrap an already constructed primary provider.
    pub fn new(primary: Box<dyn BaseSTT>, allow_fallback: bool) -> Self {
        let using_fallback = primary.is_mock();
        Self {
            backend: Backend::Ready(primary),
            allow_fallback,
            using_fallback,
        }
    }

    /// Resolve the configured STT provider for a new session.
    pub fn resolve(registry: &ProviderRegistry) -> Self {
        let allow_fallback = registry.allow_fallback();
        match create_stt_provider(registry.selected_stt(), registry) {
            Ok(primary) => Self::new(primary, allow_fallback),
            Err(e) if allow_fallback => {
                warn!(
                    provider = %registry.selected_stt(),
                    "STT provider not configured ({e}); using mock for this session"
                );
                Self::new(Box::new(MockSTT), allow_fallback)
            }
            Err(e) => Self {
                backend: Backend::Unconfigured(e),
                allow_fallback,
                using_fallback: false,
            },
        }
    }

    /// Transcribe one recording phase, falling back to the mock when allowed.
    ///
    /// An empty recording has an empty transcript and never reaches a provider.
    pub async fn transcribe(&mut self, audio: Bytes) -> Result<String, STTError> {
        if audio.is_empty() {
            return Ok(String::new());
        }

        let result = match &self.backend {
            Backend::Ready(provider) => provider.transcribe(audio.clone()).await,
            Backend::Unconfigured(e) => Err(e.clone()),
        };

        match result {
            Err(e) if self.allow_fallback && !self.using_fallback && e.allows_fallback() => {
                warn!(
                    provider = self.provider_name(),
                    "STT failed ({e}); switching to mock for the rest of the session"
                );
                self.backend = Backend::Ready(Box::new(MockSTT));
                self.using_fallback = true;
                MockSTT.transcribe(audio).await
            }
            other => other,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match &self.backend {
            Backend::Ready(provider) => provider.provider_name(),
            Backend::Unconfigured(_) => "unconfigured",
        }
    }

    /// Whether calls are currently served by the mock.
    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback
    }
}

/// Text-to-speech side of a session.
pub struct TtsGateway {
    backend: Backend<dyn BaseTTS, TTSError>,
    allow_fallback: bool,
    using_fallback: bool,
    sample_rate: u32,
}

impl TtsGateway {
    /// Wrap an already constructed primary provider.
    pub fn new(primary: Box<dyn BaseTTS>, allow_fallback: bool, sample_rate: u32) -> Self {
        let using_fallback = primary.is_mock();
        Self {
            backend: Backend::Ready(primary),
            allow_fallback,
            using_fallback,
            sample_rate,
        }
    }

    /// Resolve the configured TTS provider for a new session.
    pub fn resolve(registry: &ProviderRegistry) -> Self {
        let allow_fallback = registry.allow_fallback();
        let sample_rate = registry.settings().sample_rate;
        match create_tts_provider(registry.selected_tts(), registry) {
            Ok(primary) => Self::new(primary, allow_fallback, sample_rate),
            Err(e) if allow_fallback => {
                warn!(
                    provider = %registry.selected_tts(),
                    "TTS provider not configured ({e}); using mock for this session"
                );
                Self::new(Box::new(MockTTS::new(sample_rate)), allow_fallback, sample_rate)
            }
            Err(e) => Self {
                backend: Backend::Unconfigured(e),
                allow_fallback,
                using_fallback: false,
                sample_rate,
            },
        }
    }

    /// Start synthesizing `text`.
    ///
    /// Fallback only applies to failures before the stream is handed out; an
    /// error in the middle of a stream is yielded by the stream itself.
    pub async fn synthesize(&mut self, text: &str) -> Result<AudioStream, TTSError> {
        if text.trim().is_empty() {
            info!("Empty text, nothing to synthesize");
            return Ok(Box::pin(futures::stream::empty()));
        }

        let result = match &self.backend {
            Backend::Ready(provider) => provider.synthesize(text).await,
            Backend::Unconfigured(e) => Err(e.clone()),
        };

        match result {
            Err(e) if self.allow_fallback && !self.using_fallback && e.allows_fallback() => {
                warn!(
                    provider = self.provider_name(),
                    "TTS failed ({e}); switching to mock for the rest of the session"
                );
                let mock = MockTTS::new(self.sample_rate);
                self.backend = Backend::Ready(Box::new(mock));
                self.using_fallback = true;
                mock.synthesize(text).await
            }
            other => other,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match &self.backend {
            Backend::Ready(provider) => provider.provider_name(),
            Backend::Unconfigured(_) => "unconfigured",
        }
    }

    /// Whether calls are currently served by the mock.
    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::core::stt::{MOCK_TRANSCRIPT, SttProvider};
    use crate::core::tts::TtsProvider;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSTT {
        error: STTError,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BaseSTT for FailingSTT {
        async fn transcribe(&self, _audio: Bytes) -> Result<String, STTError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }

        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    struct FailingTTS {
        error: TTSError,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BaseTTS for FailingTTS {
        async fn synthesize(&self, _text: &str) -> Result<AudioStream, TTSError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }

        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    fn failing_stt(error: STTError) -> (Box<dyn BaseSTT>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let stt = FailingSTT {
            error,
            calls: calls.clone(),
        };
        (Box::new(stt), calls)
    }

    fn failing_tts(error: TTSError) -> (Box<dyn BaseTTS>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let tts = FailingTTS {
            error,
            calls: calls.clone(),
        };
        (Box::new(tts), calls)
    }

    #[test]
    fn test_resolve_missing_credentials_with_fallback_uses_mock() {
        let mut config = test_config();
        config.stt_provider = SttProvider::Whisper;
        config.tts_provider = TtsProvider::ElevenLabs;
        let registry = ProviderRegistry::from_config(&config).unwrap();

        let stt = SttGateway::resolve(&registry);
        let tts = TtsGateway::resolve(&registry);
        assert_eq!(stt.provider_name(), "mock");
        assert!(stt.is_using_fallback());
        assert_eq!(tts.provider_name(), "mock");
        assert!(tts.is_using_fallback());
    }

    #[tokio::test]
    async fn test_resolve_missing_credentials_without_fallback_fails_on_use() {
        let mut config = test_config();
        config.stt_provider = SttProvider::Deepgram;
        config.tts_provider = TtsProvider::Azure;
        config.allow_fallback = false;
        let registry = ProviderRegistry::from_config(&config).unwrap();

        let mut stt = SttGateway::resolve(&registry);
        assert_eq!(stt.provider_name(), "unconfigured");
        let err = stt.transcribe(Bytes::from_static(&[0, 0])).await.unwrap_err();
        assert_eq!(
            err,
            STTError::AuthenticationFailed(
                "DEEPGRAM_API_KEY is required for Deepgram STT".to_string()
            )
        );

        let mut tts = TtsGateway::resolve(&registry);
        match tts.synthesize("hello").await {
            Err(TTSError::AuthenticationFailed(msg)) => {
                assert_eq!(msg, "AZURE_TTS_KEY is required for Azure TTS")
            }
            Err(other) => panic!("Expected AuthenticationFailed, got {other:?}"),
            Ok(_) => panic!("Expected AuthenticationFailed, got a stream"),
        }
    }

    #[tokio::test]
    async fn test_stt_fallback_is_cached_after_first_failure() {
        let (primary, calls) = failing_stt(STTError::Unavailable("503".into()));
        let mut gateway = SttGateway::new(primary, true);

        let first = gateway.transcribe(Bytes::from_static(&[1, 2])).await.unwrap();
        assert_eq!(first, MOCK_TRANSCRIPT);
        assert!(gateway.is_using_fallback());

        let second = gateway.transcribe(Bytes::from_static(&[3, 4])).await.unwrap();
        assert_eq!(second, MOCK_TRANSCRIPT);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stt_empty_recording_skips_provider() {
        let (primary, calls) = failing_stt(STTError::ProviderError("too short".into()));
        let mut gateway = SttGateway::new(primary, false);

        let transcript = gateway.transcribe(Bytes::new()).await.unwrap();
        assert_eq!(transcript, "");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!gateway.is_using_fallback());
    }

    #[tokio::test]
    async fn test_stt_non_eligible_failure_is_surfaced() {
        let (primary, calls) = failing_stt(STTError::UnsupportedFormat("ogg".into()));
        let mut gateway = SttGateway::new(primary, true);

        let err = gateway.transcribe(Bytes::from_static(&[1, 2])).await.unwrap_err();
        assert!(matches!(err, STTError::UnsupportedFormat(_)));
        assert!(!gateway.is_using_fallback());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stt_fallback_disallowed_surfaces_auth_error() {
        let (primary, _) = failing_stt(STTError::AuthenticationFailed("401".into()));
        let mut gateway = SttGateway::new(primary, false);

        let err = gateway.transcribe(Bytes::from_static(&[1, 2])).await.unwrap_err();
        assert!(matches!(err, STTError::AuthenticationFailed(_)));
        assert_eq!(gateway.provider_name(), "failing");
    }

    #[tokio::test]
    async fn test_tts_fallback_retries_current_call_on_mock() {
        let (primary, calls) = failing_tts(TTSError::AuthenticationFailed("401".into()));
        let mut gateway = TtsGateway::new(primary, true, 16000);

        let chunks: Vec<_> = gateway.synthesize("hello").await.unwrap().collect().await;
        assert_eq!(chunks.len(), 3);
        assert!(gateway.is_using_fallback());
        assert_eq!(gateway.provider_name(), "mock");

        let _ = gateway.synthesize("again").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tts_empty_text_yields_no_chunks() {
        let (primary, calls) = failing_tts(TTSError::Unavailable("down".into()));
        let mut gateway = TtsGateway::new(primary, false, 16000);

        let chunks: Vec<_> = gateway.synthesize("   ").await.unwrap().collect().await;
        assert!(chunks.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_tts_provider_error_never_falls_back() {
        let (primary, _) = failing_tts(TTSError::ProviderError("400".into()));
        let mut gateway = TtsGateway::new(primary, true, 16000);

        assert!(gateway.synthesize("hello").await.is_err());
        assert!(!gateway.is_using_fallback());
    }
}
