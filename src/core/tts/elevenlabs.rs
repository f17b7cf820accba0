//! ElevenLabs TTS provider implementation.
//!
//! # API Reference
//!
//! - Endpoint: `POST {base}/text-to-speech/{voice_id}?output_format=pcm_{rate}`
//! - Auth: `xi-api-key` header
//! - Output: headerless PCM16 LE mono at the requested rate

use std::sync::Arc;

use serde_json::json;

use super::provider::{HttpTTS, TTSRequestBuilder};
use crate::core::registry::{ProviderDescriptor, ProviderSettings};

/// ElevenLabs-specific TTS request builder
pub struct ElevenLabsRequestBuilder {
    descriptor: Arc<ProviderDescriptor>,
    sample_rate: u32,
}

impl TTSRequestBuilder for ElevenLabsRequestBuilder {
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder {
        let voice_id = self.descriptor.voice.as_deref().unwrap_or_default();
        let url = format!(
            "{}/text-to-speech/{}",
            self.descriptor.endpoint.trim_end_matches('/'),
            voice_id
        );

        let mut body = json!({ "text": text });
        if let Some(model) = self.descriptor.model.as_deref() {
            body["model_id"] = json!(model);
        }

        client
            .post(url)
            .query(&[("output_format", format!("pcm_{}", self.sample_rate))])
            .header("xi-api-key", self.descriptor.credential())
            .header("Accept", "audio/pcm")
            .json(&body)
    }

    fn provider_name(&self) -> &'static str {
        "elevenlabs"
    }
}

/// ElevenLabs TTS provider
pub type ElevenLabsTTS = HttpTTS<ElevenLabsRequestBuilder>;

impl ElevenLabsTTS {
    pub fn from_descriptor(descriptor: Arc<ProviderDescriptor>, settings: ProviderSettings) -> Self {
        let builder = ElevenLabsRequestBuilder {
            descriptor,
            sample_rate: settings.sample_rate,
        };
        HttpTTS::new(builder, settings)
    }
}
