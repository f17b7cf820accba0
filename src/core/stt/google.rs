//! Google Cloud Speech-to-Text (v1 REST, API key) client.
//!
//! Audio is sent inline as base64 LINEAR16 with the configured sample rate.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::base::{BaseSTT, STTError};
use crate::core::http::{classify_status, classify_transport, truncate_body};
use crate::core::registry::{ProviderDescriptor, ProviderSettings};

const LANGUAGE_CODE: &str = "en-US";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'a str,
    sample_rate_hertz: u32,
    language_code: &'a str,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

pub struct GoogleSTT {
    descriptor: Arc<ProviderDescriptor>,
    settings: ProviderSettings,
}

impl GoogleSTT {
    pub fn new(descriptor: Arc<ProviderDescriptor>, settings: ProviderSettings) -> Self {
        Self {
            descriptor,
            settings,
        }
    }

    fn build_request(&self, audio: &[u8]) -> RecognizeRequest<'static> {
        RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: self.settings.sample_rate,
                language_code: LANGUAGE_CODE,
            },
            audio: RecognitionAudio {
                content: BASE64.encode(audio),
            },
        }
    }
}

fn extract_transcript(payload: &Value) -> String {
    payload
        .pointer("/results/0/alternatives/0/transcript")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl BaseSTT for GoogleSTT {
    async fn transcribe(&self, audio: Bytes) -> Result<String, STTError> {
        info!("Sending {} bytes of audio to Google Speech", audio.len());

        let response = self
            .settings
            .client
            .post(&self.descriptor.endpoint)
            .query(&[("key", self.descriptor.credential())])
            .json(&self.build_request(&audio))
            .send()
            .await
            .map_err(|e| {
                STTError::from_failure(classify_transport(&e), format!("Request failed: {e}"))
            })?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| STTError::Unavailable(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(STTError::from_failure(
                classify_status(status),
                format!(
                    "Google Speech API error ({status}): {}",
                    truncate_body(&response_text)
                ),
            ));
        }

        let payload: Value = serde_json::from_str(&response_text)
            .map_err(|e| STTError::ProviderError(format!("Failed to parse response: {e}")))?;
        let transcript = extract_transcript(&payload);

        debug!("Google transcript: {} characters", transcript.len());
        Ok(transcript)
    }

    fn provider_name(&self) -> &'static str {
        "google"
    }
}
