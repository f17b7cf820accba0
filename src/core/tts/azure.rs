//! Azure Cognitive Services TTS provider implementation.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://{region}.tts.speech.microsoft.com/cognitiveservices/v1`
//! - Auth: `Ocp-Apim-Subscription-Key` header
//! - Body: SSML (`application/ssml+xml`)
//! - Output: selected by `X-Microsoft-OutputFormat`; we always ask for raw mono PCM16

use std::sync::Arc;

use super::provider::{HttpTTS, TTSRequestBuilder};
use crate::core::registry::{ProviderDescriptor, ProviderSettings};

const USER_AGENT: &str = "voice-session-gateway";

/// Azure output format name for raw 16-bit mono PCM at `sample_rate`.
pub fn output_format(sample_rate: u32) -> String {
    match sample_rate {
        22050 | 44100 => format!("raw-{sample_rate}hz-16bit-mono-pcm"),
        _ => format!("raw-{}khz-16bit-mono-pcm", sample_rate / 1000),
    }
}

/// Escape text for inclusion in SSML element content.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn build_ssml(voice: &str, text: &str) -> String {
    let lang = voice
        .splitn(3, '-')
        .take(2)
        .collect::<Vec<_>>()
        .join("-");
    format!(
        "<speak version='1.0' xml:lang='{lang}'><voice name='{}'>{}</voice></speak>",
        escape_xml(voice),
        escape_xml(text)
    )
}

/// Azure-specific TTS request builder
pub struct AzureRequestBuilder {
    descriptor: Arc<ProviderDescriptor>,
    output_format: String,
}

impl TTSRequestBuilder for AzureRequestBuilder {
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder {
        let voice = self.descriptor.voice.as_deref().unwrap_or_default();

        client
            .post(&self.descriptor.endpoint)
            .header("Ocp-Apim-Subscription-Key", self.descriptor.credential())
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .header("User-Agent", USER_AGENT)
            .body(build_ssml(voice, text))
    }

    fn provider_name(&self) -> &'static str {
        "azure"
    }
}

/// Azure TTS provider
pub type AzureTTS = HttpTTS<AzureRequestBuilder>;

impl AzureTTS {
    pub fn from_descriptor(descriptor: Arc<ProviderDescriptor>, settings: ProviderSettings) -> Self {
        let builder = AzureRequestBuilder {
            descriptor,
            output_format: output_format(settings.sample_rate),
        };
        HttpTTS::new(builder, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::core::registry::ProviderRegistry;
    use crate::core::tts::{BaseTTS, TTSError, TtsProvider};
    use futures::StreamExt;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn azure_for(server: &MockServer) -> AzureTTS {
        let mut config = test_config();
        config.azure_tts_key = Some("az-key".to_string());
        config.azure_tts_endpoint = Some(format!("{}/cognitiveservices/v1", server.uri()));
        let registry = ProviderRegistry::from_config(&config).unwrap();
        AzureTTS::from_descriptor(
            registry.tts_descriptor_for(TtsProvider::Azure).clone(),
            registry.settings().clone(),
        )
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!(output_format(8000), "raw-8khz-16bit-mono-pcm");
        assert_eq!(output_format(16000), "raw-16khz-16bit-mono-pcm");
        assert_eq!(output_format(24000), "raw-24khz-16bit-mono-pcm");
        assert_eq!(output_format(48000), "raw-48khz-16bit-mono-pcm");
        assert_eq!(output_format(22050), "raw-22050hz-16bit-mono-pcm");
        assert_eq!(output_format(44100), "raw-44100hz-16bit-mono-pcm");
    }

    #[test]
    fn test_ssml_escapes_text() {
        let ssml = build_ssml("en-US-JennyNeural", "Tom & Jerry <3");
        assert!(ssml.contains("xml:lang='en-US'"));
        assert!(ssml.contains("<voice name='en-US-JennyNeural'>"));
        assert!(ssml.contains("Tom &amp; Jerry &lt;3"));
    }

    #[tokio::test]
    async fn test_azure_sends_ssml_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .and(header("Ocp-Apim-Subscription-Key", "az-key"))
            .and(header("Content-Type", "application/ssml+xml"))
            .and(header("X-Microsoft-OutputFormat", "raw-16khz-16bit-mono-pcm"))
            .and(body_string_contains("good morning"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
            .expect(1)
            .mount(&server)
            .await;

        let tts = azure_for(&server);
        let chunks: Vec<_> = tts.synthesize("good morning").await.unwrap().collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.as_ref().unwrap().len() == 2048));
    }

    #[tokio::test]
    async fn test_azure_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let tts = azure_for(&server);
        let err = match tts.synthesize("hi").await {
            Err(e) => e,
            Ok(_) => panic!("Expected an error"),
        };
        assert!(matches!(err, TTSError::Unavailable(_)));
        assert!(err.allows_fallback());
    }
}
