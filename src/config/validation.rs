//! Startup validation of the merged configuration.

use url::Url;

use super::ServerConfig;

/// Sample rates every PCM-capable TTS vendor can produce without resampling.
pub const SUPPORTED_SAMPLE_RATES: [u32; 6] = [8000, 16000, 22050, 24000, 44100, 48000];

/// Run every check against the final configuration.
pub(crate) fn validate(config: &ServerConfig) -> Result<(), String> {
    validate_audio(config)?;
    validate_endpoints(config)?;
    validate_limits(config)?;
    Ok(())
}

fn validate_audio(config: &ServerConfig) -> Result<(), String> {
    if !SUPPORTED_SAMPLE_RATES.contains(&config.sample_rate) {
        return Err(format!(
            "Unsupported sample_rate {}. Supported rates: {:?}",
            config.sample_rate, SUPPORTED_SAMPLE_RATES
        ));
    }
    if config.max_audio_bytes == 0 {
        return Err("max_audio_bytes must be greater than zero".to_string());
    }
    if config.tts_chunk_bytes == 0 || config.tts_chunk_bytes % 2 != 0 {
        return Err(format!(
            "tts_chunk_bytes must be a positive even number of bytes (PCM16), got {}",
            config.tts_chunk_bytes
        ));
    }
    if config.tts_queue_depth == 0 {
        return Err("tts_queue_depth must be greater than zero".to_string());
    }
    Ok(())
}

fn validate_endpoints(config: &ServerConfig) -> Result<(), String> {
    let mut endpoints = vec![
        ("openai_base_url", config.openai_base_url.as_str()),
        ("deepgram_url", config.deepgram_url.as_str()),
        ("google_speech_url", config.google_speech_url.as_str()),
        ("elevenlabs_base_url", config.elevenlabs_base_url.as_str()),
        ("coqui_tts_url", config.coqui_tts_url.as_str()),
    ];
    if let Some(endpoint) = config.azure_tts_endpoint.as_deref() {
        endpoints.push(("azure_tts_endpoint", endpoint));
    }

    for (name, value) in endpoints {
        let url = Url::parse(value).map_err(|e| format!("Invalid {name} '{value}': {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Invalid {name} '{value}': scheme must be http or https"
            ));
        }
    }
    Ok(())
}

fn validate_limits(config: &ServerConfig) -> Result<(), String> {
    if config.max_connections_per_ip == 0 {
        return Err("max_connections_per_ip must be greater than zero".to_string());
    }
    if config.max_websocket_connections == Some(0) {
        return Err("max_websocket_connections must be greater than zero when set".to_string());
    }
    if config.rate_limit_requests_per_second == 0 || config.rate_limit_burst_size == 0 {
        return Err("rate limit values must be greater than zero".to_string());
    }
    Ok(())
}
