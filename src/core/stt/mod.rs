mod base;
pub mod deepgram;
pub mod google;
pub mod mock;
pub mod wav;
pub mod whisper;

pub use base::{BaseSTT, STTError};
pub use deepgram::DeepgramSTT;
pub use google::GoogleSTT;
pub use mock::{MOCK_TRANSCRIPT, MockSTT};
pub use whisper::WhisperSTT;

use crate::core::registry::ProviderRegistry;

/// Supported STT providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SttProvider {
    /// OpenAI Whisper transcription API
    Whisper,
    /// Deepgram pre-recorded API
    Deepgram,
    /// Google Cloud Speech-to-Text v1 REST
    Google,
    /// Deterministic stand-in
    Mock,
}

impl SttProvider {
    /// Message reported when the provider is selected without its credentials.
    pub fn missing_credentials_message(&self) -> &'static str {
        match self {
            SttProvider::Whisper => "OPENAI_API_KEY is required for Whisper STT",
            SttProvider::Deepgram => "DEEPGRAM_API_KEY is required for Deepgram STT",
            SttProvider::Google => "GOOGLE_SPEECH_API_KEY is required for Google STT",
            SttProvider::Mock => "mock STT requires no credentials",
        }
    }
}

impl std::fmt::Display for SttProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SttProvider::Whisper => write!(f, "whisper"),
            SttProvider::Deepgram => write!(f, "deepgram"),
            SttProvider::Google => write!(f, "google"),
            SttProvider::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for SttProvider {
    type Err = STTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" | "openai-whisper" => Ok(SttProvider::Whisper),
            "deepgram" => Ok(SttProvider::Deepgram),
            "google" | "google-speech" => Ok(SttProvider::Google),
            "mock" => Ok(SttProvider::Mock),
            _ => Err(STTError::ConfigurationError(format!(
                "Unsupported STT provider: {s}. Supported providers: {}",
                get_supported_stt_providers().join(", ")
            ))),
        }
    }
}

/// Factory function to create an STT provider from the registry
///
/// # Errors
/// Returns `STTError::AuthenticationFailed` when the provider's descriptor lacks
/// the credentials it needs.
pub fn create_stt_provider(
    provider: SttProvider,
    registry: &ProviderRegistry,
) -> Result<Box<dyn BaseSTT>, STTError> {
    let descriptor = registry.stt_descriptor_for(provider);
    if !descriptor.has_required_credentials() {
        return Err(STTError::AuthenticationFailed(
            provider.missing_credentials_message().to_string(),
        ));
    }

    let settings = registry.settings().clone();
    let stt: Box<dyn BaseSTT> = match provider {
        SttProvider::Whisper => Box::new(WhisperSTT::new(descriptor.clone(), settings)),
        SttProvider::Deepgram => Box::new(DeepgramSTT::new(descriptor.clone(), settings)),
        SttProvider::Google => Box::new(GoogleSTT::new(descriptor.clone(), settings)),
        SttProvider::Mock => Box::new(MockSTT),
    };
    Ok(stt)
}

/// Get the canonical names of all supported STT providers
pub fn get_supported_stt_providers() -> Vec<&'static str> {
    vec!["whisper", "deepgram", "google", "mock"]
}

#[cfg(test)]
mod factory_tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_stt_provider_enum_from_string() {
        assert_eq!(
            "whisper".parse::<SttProvider>().unwrap(),
            SttProvider::Whisper
        );
        assert_eq!(
            "OpenAI".parse::<SttProvider>().unwrap(),
            SttProvider::Whisper
        );
        assert_eq!(
            "DEEPGRAM".parse::<SttProvider>().unwrap(),
            SttProvider::Deepgram
        );
        assert_eq!(
            " Google ".parse::<SttProvider>().unwrap(),
            SttProvider::Google
        );
        assert_eq!("mock".parse::<SttProvider>().unwrap(), SttProvider::Mock);

        let result = "invalid".parse::<SttProvider>();
        match result {
            Err(STTError::ConfigurationError(msg)) => {
                assert!(msg.contains("Unsupported STT provider: invalid"));
                assert!(msg.contains("whisper, deepgram, google, mock"));
            }
            other => panic!("Expected ConfigurationError, got {other:?}"),
        }
    }

    #[test]
    fn test_stt_provider_enum_display_round_trips() {
        for name in get_supported_stt_providers() {
            let provider: SttProvider = name.parse().unwrap();
            assert_eq!(provider.to_string(), name);
        }
    }

    #[test]
    fn test_create_stt_provider_requires_credentials() {
        let registry = ProviderRegistry::from_config(&test_config()).unwrap();

        let err = create_stt_provider(SttProvider::Deepgram, &registry)
            .err()
            .unwrap();
        assert_eq!(
            err,
            STTError::AuthenticationFailed(
                "DEEPGRAM_API_KEY is required for Deepgram STT".to_string()
            )
        );
    }

    #[test]
    fn test_create_stt_provider_variants() {
        let mut config = test_config();
        config.openai_api_key = Some("sk".to_string());
        config.google_speech_api_key = Some("g".to_string());
        let registry = ProviderRegistry::from_config(&config).unwrap();

        let whisper = create_stt_provider(SttProvider::Whisper, &registry).unwrap();
        assert_eq!(whisper.provider_name(), "whisper");
        assert!(!whisper.is_mock());

        let google = create_stt_provider(SttProvider::Google, &registry).unwrap();
        assert_eq!(google.provider_name(), "google");

        let mock = create_stt_provider(SttProvider::Mock, &registry).unwrap();
        assert!(mock.is_mock());
    }
}
