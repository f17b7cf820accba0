pub mod azure;
mod base;
pub mod coqui;
pub mod elevenlabs;
pub mod mock;
pub mod provider;

pub use azure::AzureTTS;
pub use base::{AudioStream, BaseTTS, TTSError};
pub use coqui::CoquiTTS;
pub use elevenlabs::ElevenLabsTTS;
pub use mock::{MOCK_CHUNK_COUNT, MockTTS};
pub use provider::{HttpTTS, ResponseEncoding, TTSRequestBuilder, rechunk_pcm};

use crate::core::registry::ProviderRegistry;

/// Supported TTS providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtsProvider {
    /// ElevenLabs streaming REST API
    ElevenLabs,
    /// Microsoft Azure Cognitive Services (SSML)
    Azure,
    /// Self-hosted Coqui tts-server
    Coqui,
    /// Deterministic stand-in
    Mock,
}

impl TtsProvider {
    /// Message reported when the provider is selected without its credentials.
    pub fn missing_credentials_message(&self) -> &'static str {
        match self {
            TtsProvider::ElevenLabs => "ELEVENLABS_API_KEY is required for ElevenLabs TTS",
            TtsProvider::Azure => "AZURE_TTS_KEY is required for Azure TTS",
            TtsProvider::Coqui => "Coqui TTS requires no credentials",
            TtsProvider::Mock => "mock TTS requires no credentials",
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TtsProvider::ElevenLabs => write!(f, "elevenlabs"),
            TtsProvider::Azure => write!(f, "azure"),
            TtsProvider::Coqui => write!(f, "coqui"),
            TtsProvider::Mock => write!(f, "mock"),
        }
    }
}

impl std::str::FromStr for TtsProvider {
    type Err = TTSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "elevenlabs" | "eleven-labs" | "eleven_labs" => Ok(TtsProvider::ElevenLabs),
            "azure" | "microsoft-azure" => Ok(TtsProvider::Azure),
            "coqui" | "coqui-tts" => Ok(TtsProvider::Coqui),
            "mock" => Ok(TtsProvider::Mock),
            _ => Err(TTSError::InvalidConfiguration(format!(
                "Unsupported TTS provider: {s}. Supported providers: {}",
                get_supported_tts_providers().join(", ")
            ))),
        }
    }
}

/// Factory function to create a TTS provider from the registry
///
/// # Errors
/// Returns `TTSError::AuthenticationFailed` when the provider's descriptor lacks
/// the credentials it needs.
pub fn create_tts_provider(
    provider: TtsProvider,
    registry: &ProviderRegistry,
) -> Result<Box<dyn BaseTTS>, TTSError> {
    let descriptor = registry.tts_descriptor_for(provider);
    if !descriptor.has_required_credentials() {
        return Err(TTSError::AuthenticationFailed(
            provider.missing_credentials_message().to_string(),
        ));
    }

    let settings = registry.settings().clone();
    let tts: Box<dyn BaseTTS> = match provider {
        TtsProvider::ElevenLabs => {
            Box::new(ElevenLabsTTS::from_descriptor(descriptor.clone(), settings))
        }
        TtsProvider::Azure => Box::new(AzureTTS::from_descriptor(descriptor.clone(), settings)),
        TtsProvider::Coqui => Box::new(CoquiTTS::from_descriptor(descriptor.clone(), settings)),
        TtsProvider::Mock => Box::new(MockTTS::new(settings.sample_rate)),
    };
    Ok(tts)
}

/// Get the canonical names of all supported TTS providers
pub fn get_supported_tts_providers() -> Vec<&'static str> {
    vec!["elevenlabs", "azure", "coqui", "mock"]
}

#[cfg(test)]
mod factory_tests {
    use super::*;
    use crate::config::tests::test_config;

    #[test]
    fn test_tts_provider_enum_from_string() {
        assert_eq!(
            "ElevenLabs".parse::<TtsProvider>().unwrap(),
            TtsProvider::ElevenLabs
        );
        assert_eq!(
            "microsoft-azure".parse::<TtsProvider>().unwrap(),
            TtsProvider::Azure
        );
        assert_eq!("COQUI".parse::<TtsProvider>().unwrap(), TtsProvider::Coqui);
        assert_eq!("mock".parse::<TtsProvider>().unwrap(), TtsProvider::Mock);

        match "festival".parse::<TtsProvider>() {
            Err(TTSError::InvalidConfiguration(msg)) => {
                assert!(msg.contains("Unsupported TTS provider: festival"));
                assert!(msg.contains("elevenlabs, azure, coqui, mock"));
            }
            other => panic!("Expected InvalidConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_tts_provider_enum_display_round_trips() {
        for name in get_supported_tts_providers() {
            let provider: TtsProvider = name.parse().unwrap();
            assert_eq!(provider.to_string(), name);
        }
    }

    #[test]
    fn test_create_tts_provider_requires_credentials() {
        let registry = ProviderRegistry::from_config(&test_config()).unwrap();

        let err = create_tts_provider(TtsProvider::ElevenLabs, &registry)
            .err()
            .unwrap();
        assert_eq!(
            err,
            TTSError::AuthenticationFailed(
                "ELEVENLABS_API_KEY is required for ElevenLabs TTS".to_string()
            )
        );
    }

    #[test]
    fn test_create_tts_provider_variants() {
        let mut config = test_config();
        config.azure_tts_key = Some("az".to_string());
        let registry = ProviderRegistry::from_config(&config).unwrap();

        let azure = create_tts_provider(TtsProvider::Azure, &registry).unwrap();
        assert_eq!(azure.provider_name(), "azure");
        assert!(!azure.is_mock());

        let coqui = create_tts_provider(TtsProvider::Coqui, &registry).unwrap();
        assert_eq!(coqui.provider_name(), "coqui");

        let mock = create_tts_provider(TtsProvider::Mock, &registry).unwrap();
        assert!(mock.is_mock());
    }
}
