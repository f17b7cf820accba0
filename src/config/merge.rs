//! Merges environment variables (with defaults) and optional YAML overrides
//! into a single `ServerConfig`.

use std::path::PathBuf;

use super::utils::{env_bool, env_parse, env_var};
use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig};
use crate::core::stt::SttProvider;
use crate::core::tts::TtsProvider;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_STT_PROVIDER: &str = "whisper";
pub const DEFAULT_TTS_PROVIDER: &str = "elevenlabs";
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_TTS_CHUNK_BYTES: usize = 2048;
pub const DEFAULT_TTS_QUEUE_DEPTH: usize = 16;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_WHISPER_MODEL: &str = "whisper-1";
pub const DEFAULT_DEEPGRAM_MODEL: &str = "nova-2";
pub const DEFAULT_DEEPGRAM_URL: &str = "https://api.deepgram.com/v1/listen";
pub const DEFAULT_GOOGLE_SPEECH_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_ELEVENLABS_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";
pub const DEFAULT_AZURE_TTS_REGION: &str = "eastus";
pub const DEFAULT_AZURE_TTS_VOICE: &str = "en-US-JennyNeural";
pub const DEFAULT_COQUI_TTS_URL: &str = "http://localhost:5002/api/tts";

const DEFAULT_RATE_LIMIT_RPS: u32 = 60;
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;
const DEFAULT_MAX_CONNECTIONS_PER_IP: u32 = 100;

/// Build the final configuration: environment values (or defaults) first,
/// then any value present in the YAML file on top.
pub(crate) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml.unwrap_or_default();
    let server = yaml.server.unwrap_or_default();
    let tls_yaml = server.tls.unwrap_or_default();
    let voice = yaml.voice.unwrap_or_default();
    let providers = yaml.providers.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    let host = server
        .host
        .or_else(|| env_var("HOST"))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = pick(server.port, env_parse("PORT")?, DEFAULT_PORT);

    let tls_enabled = pick(tls_yaml.enabled, env_bool("TLS_ENABLED")?, false);
    let tls = if tls_enabled {
        let cert_path = tls_yaml
            .cert_path
            .or_else(|| env_var("TLS_CERT_PATH"))
            .ok_or("TLS_CERT_PATH is required when TLS is enabled")?;
        let key_path = tls_yaml
            .key_path
            .or_else(|| env_var("TLS_KEY_PATH"))
            .ok_or("TLS_KEY_PATH is required when TLS is enabled")?;
        Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        })
    } else {
        None
    };

    let stt_name = voice
        .stt_provider
        .or_else(|| env_var("VOICE_STT_PROVIDER"))
        .unwrap_or_else(|| DEFAULT_STT_PROVIDER.to_string());
    let tts_name = voice
        .tts_provider
        .or_else(|| env_var("VOICE_TTS_PROVIDER"))
        .unwrap_or_else(|| DEFAULT_TTS_PROVIDER.to_string());
    let stt_provider: SttProvider = stt_name.parse()?;
    let tts_provider: TtsProvider = tts_name.parse()?;

    Ok(ServerConfig {
        host,
        port,
        tls,

        stt_provider,
        tts_provider,
        allow_fallback: pick(
            voice.allow_fallback,
            env_bool("VOICE_ALLOW_FALLBACK")?,
            true,
        ),
        sample_rate: pick(
            voice.sample_rate,
            env_parse("VOICE_SAMPLE_RATE")?,
            DEFAULT_SAMPLE_RATE,
        ),
        max_audio_bytes: pick(
            voice.max_audio_bytes,
            env_parse("VOICE_MAX_AUDIO_BYTES")?,
            DEFAULT_MAX_AUDIO_BYTES,
        ),
        tts_chunk_bytes: pick(
            voice.tts_chunk_bytes,
            env_parse("VOICE_TTS_CHUNK_BYTES")?,
            DEFAULT_TTS_CHUNK_BYTES,
        ),
        tts_queue_depth: pick(
            voice.tts_queue_depth,
            env_parse("VOICE_TTS_QUEUE_DEPTH")?,
            DEFAULT_TTS_QUEUE_DEPTH,
        ),

        openai_api_key: providers
            .openai_api_key
            .or_else(|| env_var("OPENAI_API_KEY")),
        openai_base_url: text(
            providers.openai_base_url,
            "OPENAI_BASE_URL",
            DEFAULT_OPENAI_BASE_URL,
        ),
        whisper_model: text(
            providers.whisper_model,
            "WHISPER_MODEL",
            DEFAULT_WHISPER_MODEL,
        ),

        deepgram_api_key: providers
            .deepgram_api_key
            .or_else(|| env_var("DEEPGRAM_API_KEY")),
        deepgram_model: text(
            providers.deepgram_model,
            "DEEPGRAM_MODEL",
            DEFAULT_DEEPGRAM_MODEL,
        ),
        deepgram_url: text(providers.deepgram_url, "DEEPGRAM_URL", DEFAULT_DEEPGRAM_URL),

        google_speech_api_key: providers
            .google_speech_api_key
            .or_else(|| env_var("GOOGLE_SPEECH_API_KEY")),
        google_speech_url: text(
            providers.google_speech_url,
            "GOOGLE_SPEECH_URL",
            DEFAULT_GOOGLE_SPEECH_URL,
        ),

        elevenlabs_api_key: providers
            .elevenlabs_api_key
            .or_else(|| env_var("ELEVENLABS_API_KEY")),
        elevenlabs_base_url: text(
            providers.elevenlabs_base_url,
            "ELEVENLABS_BASE_URL",
            DEFAULT_ELEVENLABS_BASE_URL,
        ),
        elevenlabs_voice_id: text(
            providers.elevenlabs_voice_id,
            "ELEVENLABS_VOICE_ID",
            DEFAULT_ELEVENLABS_VOICE_ID,
        ),
        elevenlabs_model: text(
            providers.elevenlabs_model,
            "ELEVENLABS_MODEL",
            DEFAULT_ELEVENLABS_MODEL,
        ),

        azure_tts_key: providers
            .azure_tts_key
            .or_else(|| env_var("AZURE_TTS_KEY")),
        azure_tts_region: text(
            providers.azure_tts_region,
            "AZURE_TTS_REGION",
            DEFAULT_AZURE_TTS_REGION,
        ),
        azure_tts_voice: text(
            providers.azure_tts_voice,
            "AZURE_TTS_VOICE",
            DEFAULT_AZURE_TTS_VOICE,
        ),
        azure_tts_endpoint: providers
            .azure_tts_endpoint
            .or_else(|| env_var("AZURE_TTS_ENDPOINT")),

        coqui_tts_url: text(
            providers.coqui_tts_url,
            "COQUI_TTS_URL",
            DEFAULT_COQUI_TTS_URL,
        ),

        cors_allowed_origins: security
            .cors_allowed_origins
            .or_else(|| env_var("CORS_ALLOWED_ORIGINS")),
        rate_limit_requests_per_second: pick(
            security.rate_limit_requests_per_second,
            env_parse("RATE_LIMIT_REQUESTS_PER_SECOND")?,
            DEFAULT_RATE_LIMIT_RPS,
        ),
        rate_limit_burst_size: pick(
            security.rate_limit_burst_size,
            env_parse("RATE_LIMIT_BURST_SIZE")?,
            DEFAULT_RATE_LIMIT_BURST,
        ),
        max_websocket_connections: security
            .max_websocket_connections
            .or(env_parse("MAX_WEBSOCKET_CONNECTIONS")?),
        max_connections_per_ip: pick(
            security.max_connections_per_ip,
            env_parse("MAX_CONNECTIONS_PER_IP")?,
            DEFAULT_MAX_CONNECTIONS_PER_IP,
        ),
    })
}

/// YAML value, else environment value, else default.
fn pick<T>(yaml: Option<T>, env: Option<T>, default: T) -> T {
    yaml.or(env).unwrap_or(default)
}

fn text(yaml: Option<String>, env_name: &str, default: &str) -> String {
    yaml.or_else(|| env_var(env_name))
        .unwrap_or_else(|| default.to_string())
}
