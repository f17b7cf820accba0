//! Coqui TTS server provider.
//!
//! Talks to a self-hosted `tts-server` (`GET /api/tts?text=...`), which answers
//! with a complete WAV file. No credentials.

use std::sync::Arc;

use super::provider::{HttpTTS, ResponseEncoding, TTSRequestBuilder};
use crate::core::registry::{ProviderDescriptor, ProviderSettings};

/// Coqui-specific TTS request builder
pub struct CoquiRequestBuilder {
    descriptor: Arc<ProviderDescriptor>,
}

impl TTSRequestBuilder for CoquiRequestBuilder {
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder {
        let mut request = client.get(&self.descriptor.endpoint).query(&[("text", text)]);
        if let Some(voice) = self.descriptor.voice.as_deref() {
            request = request.query(&[("speaker_id", voice)]);
        }
        request
    }

    fn provider_name(&self) -> &'static str {
        "coqui"
    }

    fn response_encoding(&self) -> ResponseEncoding {
        ResponseEncoding::Wav
    }
}

/// Coqui TTS provider
pub type CoquiTTS = HttpTTS<CoquiRequestBuilder>;

impl CoquiTTS {
    pub fn from_descriptor(descriptor: Arc<ProviderDescriptor>, settings: ProviderSettings) -> Self {
        HttpTTS::new(CoquiRequestBuilder { descriptor }, settings)
    }
}
