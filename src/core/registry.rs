//! Provider descriptor registry
//!
//! A process-wide, read-only table describing every provider the gateway knows
//! about: its role, endpoint, credentials and model parameters. It is built once
//! from [`ServerConfig`] before the server accepts connections and is shared by
//! every session through an `Arc`. Nothing mutates it afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use super::http::build_http_client;
use super::stt::SttProvider;
use super::tts::TtsProvider;
use crate::config::ServerConfig;

/// Capability a provider offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderRole {
    Stt,
    Tts,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderRole::Stt => write!(f, "stt"),
            ProviderRole::Tts => write!(f, "tts"),
        }
    }
}

/// Immutable connection parameters for one provider.
#[derive(Clone)]
pub struct ProviderDescriptor {
    pub name: &'static str,
    pub role: ProviderRole,
    pub endpoint: String,
    pub credentials: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub is_mock: bool,
    requires_credentials: bool,
}

impl ProviderDescriptor {
    fn new(name: &'static str, role: ProviderRole, endpoint: impl Into<String>) -> Self {
        Self {
            name,
            role,
            endpoint: endpoint.into(),
            credentials: None,
            model: None,
            voice: None,
            is_mock: false,
            requires_credentials: true,
        }
    }

    fn mock(role: ProviderRole) -> Self {
        let mut descriptor = Self::new("mock", role, "");
        descriptor.is_mock = true;
        descriptor.requires_credentials = false;
        descriptor
    }

    fn with_credentials(mut self, credentials: Option<&String>) -> Self {
        self.credentials = credentials.cloned();
        self
    }

    fn with_model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    fn with_voice(mut self, voice: &str) -> Self {
        self.voice = Some(voice.to_string());
        self
    }

    fn without_credentials(mut self) -> Self {
        self.requires_credentials = false;
        self
    }

    /// Whether the provider can be called with what the descriptor carries.
    pub fn has_required_credentials(&self) -> bool {
        !self.requires_credentials || self.credentials.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Credential value, or an empty string for providers that need none.
    pub fn credential(&self) -> &str {
        self.credentials.as_deref().unwrap_or_default()
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("endpoint", &self.endpoint)
            .field(
                "credentials",
                &self.credentials.as_ref().map(|_| "<redacted>"),
            )
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("is_mock", &self.is_mock)
            .finish()
    }
}

impl Drop for ProviderDescriptor {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut credentials) = self.credentials {
            credentials.zeroize();
        }
    }
}

/// Errors raised while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Audio and transport settings handed to every provider instance.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Shared connection pool
    pub client: Client,
    /// PCM16 mono sample rate for both directions
    pub sample_rate: u32,
    /// Outbound TTS frame size in bytes
    pub tts_chunk_bytes: usize,
}

/// Process-wide table of provider descriptors plus the selected provider per role.
#[derive(Debug)]
pub struct ProviderRegistry {
    stt: HashMap<SttProvider, Arc<ProviderDescriptor>>,
    tts: HashMap<TtsProvider, Arc<ProviderDescriptor>>,
    selected_stt: SttProvider,
    selected_tts: TtsProvider,
    allow_fallback: bool,
    settings: ProviderSettings,
}

impl ProviderRegistry {
    /// Build the registry from validated configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self, RegistryError> {
        let settings = ProviderSettings {
            client: build_http_client()?,
            sample_rate: config.sample_rate,
            tts_chunk_bytes: config.tts_chunk_bytes,
        };
        Ok(Self::with_settings(config, settings))
    }

    /// Build the registry with caller-supplied provider settings.
    pub fn with_settings(config: &ServerConfig, settings: ProviderSettings) -> Self {
        let stt: HashMap<SttProvider, Arc<ProviderDescriptor>> = HashMap::from([
            (
                SttProvider::Whisper,
                ProviderDescriptor::new("whisper", ProviderRole::Stt, &config.openai_base_url)
                    .with_credentials(config.openai_api_key.as_ref())
                    .with_model(&config.whisper_model),
            ),
            (
                SttProvider::Deepgram,
                ProviderDescriptor::new("deepgram", ProviderRole::Stt, &config.deepgram_url)
                    .with_credentials(config.deepgram_api_key.as_ref())
                    .with_model(&config.deepgram_model),
            ),
            (
                SttProvider::Google,
                ProviderDescriptor::new("google", ProviderRole::Stt, &config.google_speech_url)
                    .with_credentials(config.google_speech_api_key.as_ref()),
            ),
            (SttProvider::Mock, ProviderDescriptor::mock(ProviderRole::Stt)),
        ])
        .into_iter()
        .map(|(k, v)| (k, Arc::new(v)))
        .collect();

        let tts: HashMap<TtsProvider, Arc<ProviderDescriptor>> = HashMap::from([
            (
                TtsProvider::ElevenLabs,
                ProviderDescriptor::new(
                    "elevenlabs",
                    ProviderRole::Tts,
                    &config.elevenlabs_base_url,
                )
                .with_credentials(config.elevenlabs_api_key.as_ref())
                .with_model(&config.elevenlabs_model)
                .with_voice(&config.elevenlabs_voice_id),
            ),
            (
                TtsProvider::Azure,
                ProviderDescriptor::new("azure", ProviderRole::Tts, config.azure_tts_url())
                    .with_credentials(config.azure_tts_key.as_ref())
                    .with_voice(&config.azure_tts_voice),
            ),
            (
                TtsProvider::Coqui,
                ProviderDescriptor::new("coqui", ProviderRole::Tts, &config.coqui_tts_url)
                    .without_credentials(),
            ),
            (TtsProvider::Mock, ProviderDescriptor::mock(ProviderRole::Tts)),
        ])
        .into_iter()
        .map(|(k, v)| (k, Arc::new(v)))
        .collect();

        let registry = Self {
            stt,
            tts,
            selected_stt: config.stt_provider,
            selected_tts: config.tts_provider,
            allow_fallback: config.allow_fallback,
            settings,
        };

        info!(
            stt = %registry.selected_stt,
            stt_ready = registry.stt_descriptor().has_required_credentials(),
            tts = %registry.selected_tts,
            tts_ready = registry.tts_descriptor().has_required_credentials(),
            allow_fallback = registry.allow_fallback,
            "Provider registry initialized"
        );

        registry
    }

    /// Descriptor of the configured STT provider.
    pub fn stt_descriptor(&self) -> &Arc<ProviderDescriptor> {
        self.stt_descriptor_for(self.selected_stt)
    }

    /// Descriptor of the configured TTS provider.
    pub fn tts_descriptor(&self) -> &Arc<ProviderDescriptor> {
        self.tts_descriptor_for(self.selected_tts)
    }

    pub fn stt_descriptor_for(&self, provider: SttProvider) -> &Arc<ProviderDescriptor> {
        // Every variant is inserted in `with_settings`.
        &self.stt[&provider]
    }

    pub fn tts_descriptor_for(&self, provider: TtsProvider) -> &Arc<ProviderDescriptor> {
        &self.tts[&provider]
    }

    pub fn selected_stt(&self) -> SttProvider {
        self.selected_stt
    }

    pub fn selected_tts(&self) -> TtsProvider {
        self.selected_tts
    }

    pub fn allow_fallback(&self) -> bool {
        self.allow_fallback
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    /// Look up any descriptor by role and name (aliases accepted).
    pub fn descriptor(&self, role: ProviderRole, name: &str) -> Option<&Arc<ProviderDescriptor>> {
        match role {
            ProviderRole::Stt => name
                .parse::<SttProvider>()
                .ok()
                .map(|p| self.stt_descriptor_for(p)),
            ProviderRole::Tts => name
                .parse::<TtsProvider>()
                .ok()
                .map(|p| self.tts_descriptor_for(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;

    fn registry(config: &ServerConfig) -> ProviderRegistry {
        ProviderRegistry::from_config(config).unwrap()
    }

    #[test]
    fn test_role_display() {
        assert_eq!(ProviderRole::Stt.to_string(), "stt");
        assert_eq!(ProviderRole::Tts.to_string(), "tts");
    }

    #[test]
    fn test_registry_describes_every_provider() {
        let mut config = test_config();
        config.stt_provider = SttProvider::Deepgram;
        config.tts_provider = TtsProvider::Azure;
        config.deepgram_api_key = Some("dg".to_string());
        config.azure_tts_region = "westus2".to_string();

        let registry = registry(&config);

        let stt = registry.stt_descriptor();
        assert_eq!(stt.name, "deepgram");
        assert_eq!(stt.role, ProviderRole::Stt);
        assert_eq!(stt.model.as_deref(), Some("nova-2"));
        assert!(stt.has_required_credentials());
        assert!(!stt.is_mock);

        let tts = registry.tts_descriptor();
        assert_eq!(tts.name, "azure");
        assert_eq!(
            tts.endpoint,
            "https://westus2.tts.speech.microsoft.com/cognitiveservices/v1"
        );
        assert!(!tts.has_required_credentials());

        let whisper = registry.descriptor(ProviderRole::Stt, "openai").unwrap();
        assert_eq!(whisper.name, "whisper");
        assert_eq!(whisper.endpoint, "https://api.openai.com/v1");
        assert!(registry.descriptor(ProviderRole::Tts, "festival").is_none());
    }

    #[test]
    fn test_mock_and_coqui_need_no_credentials() {
        let registry = registry(&test_config());

        let mock = registry.stt_descriptor_for(SttProvider::Mock);
        assert!(mock.is_mock);
        assert!(mock.has_required_credentials());

        let coqui = registry.tts_descriptor_for(TtsProvider::Coqui);
        assert!(!coqui.is_mock);
        assert!(coqui.has_required_credentials());
        assert_eq!(coqui.credential(), "");
    }

    #[test]
    fn test_empty_credentials_are_missing() {
        let mut config = test_config();
        config.elevenlabs_api_key = Some(String::new());
        let registry = registry(&config);
        assert!(
            !registry
                .tts_descriptor_for(TtsProvider::ElevenLabs)
                .has_required_credentials()
        );
    }

    #[test]
    fn test_descriptor_debug_redacts_credentials() {
        let mut config = test_config();
        config.openai_api_key = Some("sk-very-secret".to_string());
        let registry = registry(&config);

        let rendered = format!("{:?}", registry.stt_descriptor_for(SttProvider::Whisper));
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_registry_carries_audio_settings() {
        let mut config = test_config();
        config.sample_rate = 24000;
        config.tts_chunk_bytes = 960;
        config.allow_fallback = false;
        let registry = registry(&config);

        assert_eq!(registry.settings().sample_rate, 24000);
        assert_eq!(registry.settings().tts_chunk_bytes, 960);
        assert!(!registry.allow_fallback());
    }
}
