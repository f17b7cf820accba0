//! Configuration module for the voice session gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//! The configuration is read once at startup and never mutated afterwards.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use voice_session_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use crate::core::stt::SttProvider;
use crate::core::tts::TtsProvider;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use merge::{
    DEFAULT_AZURE_TTS_REGION, DEFAULT_AZURE_TTS_VOICE, DEFAULT_COQUI_TTS_URL,
    DEFAULT_DEEPGRAM_MODEL, DEFAULT_DEEPGRAM_URL, DEFAULT_ELEVENLABS_BASE_URL,
    DEFAULT_ELEVENLABS_MODEL, DEFAULT_ELEVENLABS_VOICE_ID, DEFAULT_GOOGLE_SPEECH_URL,
    DEFAULT_MAX_AUDIO_BYTES, DEFAULT_OPENAI_BASE_URL, DEFAULT_SAMPLE_RATE,
    DEFAULT_TTS_CHUNK_BYTES, DEFAULT_TTS_QUEUE_DEPTH, DEFAULT_WHISPER_MODEL,
};
pub use validation::SUPPORTED_SAMPLE_RATES;

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - Voice pipeline settings (provider selectors, fallback flag, audio format, limits)
/// - Provider credentials and endpoints
/// - Security settings (CORS, rate limiting, connection limits)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Voice pipeline
    pub stt_provider: SttProvider,
    pub tts_provider: TtsProvider,
    /// Substitute the mock provider when the primary is unusable
    pub allow_fallback: bool,
    /// PCM16 mono sample rate for both directions
    pub sample_rate: u32,
    /// Ceiling for the audio buffered during one recording phase
    pub max_audio_bytes: usize,
    /// Size of each outbound TTS binary frame
    pub tts_chunk_bytes: usize,
    /// Depth of the bounded queue between synthesis and the socket writer
    pub tts_queue_depth: usize,

    // OpenAI Whisper
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub whisper_model: String,

    // Deepgram
    pub deepgram_api_key: Option<String>,
    pub deepgram_model: String,
    pub deepgram_url: String,

    // Google Speech-to-Text (REST, API key)
    pub google_speech_api_key: Option<String>,
    pub google_speech_url: String,

    // ElevenLabs
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: String,
    pub elevenlabs_voice_id: String,
    pub elevenlabs_model: String,

    // Azure Speech TTS
    pub azure_tts_key: Option<String>,
    /// Azure region where the Speech resource is deployed (e.g., "eastus", "westus2")
    pub azure_tts_region: String,
    pub azure_tts_voice: String,
    /// Overrides the region-derived endpoint when set
    pub azure_tts_endpoint: Option<String>,

    // Coqui TTS server (no credentials)
    pub coqui_tts_url: String,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,

    // Connection limits
    /// Maximum concurrent WebSocket connections
    /// Default: None (unlimited)
    pub max_websocket_connections: Option<usize>,
    /// Maximum connections per IP address
    /// Default: 100
    pub max_connections_per_ip: u32,
}

/// Zeroize every credential when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        for key in [
            &mut self.openai_api_key,
            &mut self.deepgram_api_key,
            &mut self.google_speech_api_key,
            &mut self.elevenlabs_api_key,
            &mut self.azure_tts_key,
        ]
        .into_iter()
        .flatten()
        {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable base
    ///
    /// Environment variables (with defaults) form the base and the YAML file
    /// overrides specific values. `.env` is loaded by `main` before this runs.
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - A provider name is not one of the supported providers
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;

        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Endpoint used for Azure synthesis requests
    pub fn azure_tts_url(&self) -> String {
        self.azure_tts_endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                self.azure_tts_region
            )
        })
    }
}
