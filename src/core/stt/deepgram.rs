//! Deepgram pre-recorded STT client.
//!
//! The recording phase is posted as a WAV body to the `listen` endpoint and
//! the transcript is read from the first alternative of the first channel.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, info};

use super::base::{BaseSTT, STTError};
use super::wav;
use crate::core::http::{classify_status, classify_transport, truncate_body};
use crate::core::registry::{ProviderDescriptor, ProviderSettings};

const DEFAULT_MODEL: &str = "nova-2";

pub struct DeepgramSTT {
    descriptor: Arc<ProviderDescriptor>,
    settings: ProviderSettings,
}

impl DeepgramSTT {
    pub fn new(descriptor: Arc<ProviderDescriptor>, settings: ProviderSettings) -> Self {
        Self {
            descriptor,
            settings,
        }
    }
}

/// Pull `results.channels[0].alternatives[0].transcript`, empty when absent.
fn extract_transcript(payload: &Value) -> String {
    payload
        .pointer("/results/channels/0/alternatives/0/transcript")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl BaseSTT for DeepgramSTT {
    async fn transcribe(&self, audio: Bytes) -> Result<String, STTError> {
        info!("Sending {} bytes of audio to Deepgram", audio.len());

        let wav_data = wav::create_wav(&audio, self.settings.sample_rate)?;
        let model = self.descriptor.model.as_deref().unwrap_or(DEFAULT_MODEL);

        let response = self
            .settings
            .client
            .post(&self.descriptor.endpoint)
            .query(&[("model", model)])
            .header(
                "Authorization",
                format!("Token {}", self.descriptor.credential()),
            )
            .header("Content-Type", "audio/wav")
            .body(wav_data)
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
                    "Deepgram API error ({status}): {}",
                    truncate_body(&response_text)
                ),
            ));
        }

        let payload: Value = serde_json::from_str(&response_text)
            .map_err(|e| STTError::ProviderError(format!("Failed to parse response: {e}")))?;
        let transcript = extract_transcript(&payload);

        debug!("Deepgram transcript: {} characters", transcript.len());
        Ok(transcript)
    }

    fn provider_name(&self) -> &'static str {
        "deepgram"
    }
}
