use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///
/// voice:
///   stt_provider: "whisper"
///   tts_provider: "elevenlabs"
///   allow_fallback: true
///   sample_rate: 16000
///   max_audio_bytes: 10485760
///   tts_chunk_bytes: 2048
///   tts_queue_depth: 16
///
/// providers:
///   openai_api_key: "sk-..."
///   whisper_model: "whisper-1"
///   deepgram_api_key: "dg-key"
///   elevenlabs_api_key: "el-key"
///   azure_tts_key: "azure-key"
///   azure_tts_region: "westeurope"
///   coqui_tts_url: "http://localhost:5002/api/tts"
///
/// security:
///   cors_allowed_origins: "*"
///   max_websocket_connections: 500
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub voice: Option<VoiceYaml>,
    pub providers: Option<ProvidersYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Voice pipeline settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VoiceYaml {
    /// STT provider name (whisper, deepgram, google, mock)
    pub stt_provider: Option<String>,
    /// TTS provider name (elevenlabs, azure, coqui, mock)
    pub tts_provider: Option<String>,
    /// Substitute the mock provider when the primary is unusable
    pub allow_fallback: Option<bool>,
    /// PCM16 sample rate of inbound and outbound audio (Hz)
    pub sample_rate: Option<u32>,
    /// Ceiling for one recording phase (bytes)
    pub max_audio_bytes: Option<usize>,
    /// Size of each outbound TTS binary frame (bytes)
    pub tts_chunk_bytes: Option<usize>,
    /// Depth of the outbound queue between synthesis and the socket writer
    pub tts_queue_depth: Option<usize>,
}

/// Provider credentials and endpoints from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub whisper_model: Option<String>,
    pub deepgram_api_key: Option<String>,
    pub deepgram_model: Option<String>,
    pub deepgram_url: Option<String>,
    pub google_speech_api_key: Option<String>,
    pub google_speech_url: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: Option<String>,
    pub elevenlabs_voice_id: Option<String>,
    pub elevenlabs_model: Option<String>,
    pub azure_tts_key: Option<String>,
    /// Azure region where the Speech resource is deployed (e.g., "eastus")
    pub azure_tts_region: Option<String>,
    pub azure_tts_voice: Option<String>,
    /// Full endpoint override; replaces the region-derived URL
    pub azure_tts_endpoint: Option<String>,
    pub coqui_tts_url: Option<String>,
}

/// Security configuration from YAML
///
/// # Example YAML structure
/// ```yaml
/// security:
///   cors_allowed_origins: "https://example.com,https://app.example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
///   max_websocket_connections: 1000
///   max_connections_per_ip: 100
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: Option<u32>,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: Option<u32>,
    /// Maximum concurrent WebSocket connections
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    pub max_connections_per_ip: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML is malformed.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
