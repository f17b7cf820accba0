//! OpenAI Whisper STT client.
//!
//! Whisper is a REST API: the whole recording phase is uploaded as one WAV file
//! via multipart form and the final transcript comes back as JSON.
//!
//! - Endpoint: `POST {base_url}/audio/transcriptions`
//! - Auth: `Authorization: Bearer <key>`
//! - Response: `{"text": "..."}`

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use super::base::{BaseSTT, STTError};
use super::wav;
use crate::core::http::{classify_status, classify_transport, truncate_body};
use crate::core::registry::{ProviderDescriptor, ProviderSettings};

const DEFAULT_MODEL: &str = "whisper-1";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
    #[serde(rename = "type", default)]
    error_type: String,
}

pub struct WhisperSTT {
    descriptor: Arc<ProviderDescriptor>,
    settings: ProviderSettings,
}

impl WhisperSTT {
    pub fn new(descriptor: Arc<ProviderDescriptor>, settings: ProviderSettings) -> Self {
        Self {
            descriptor,
            settings,
        }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/audio/transcriptions",
            self.descriptor.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl BaseSTT for WhisperSTT {
    async fn transcribe(&self, audio: Bytes) -> Result<String, STTError> {
        info!(
            "Sending {} bytes of audio to Whisper transcription API",
            audio.len()
        );

        let wav_data = wav::create_wav(&audio, self.settings.sample_rate)?;
        let file_part = Part::bytes(wav_data)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| STTError::ConfigurationError(format!("Invalid MIME type: {e}")))?;
        let model = self.descriptor.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let form = Form::new()
            .part("file", file_part)
            .text("model", model.to_string());

        let response = self
            .settings
            .client
            .post(self.api_url())
            .bearer_auth(self.descriptor.credential())
            .multipart(form)
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
            let error_msg = match serde_json::from_str::<OpenAIErrorResponse>(&response_text) {
                Ok(err) => format!(
                    "Whisper API error: {} ({})",
                    err.error.message, err.error.error_type
                ),
                Err(_) => format!(
                    "Whisper API error ({status}): {}",
                    truncate_body(&response_text)
                ),
            };
            return Err(STTError::from_failure(classify_status(status), error_msg));
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&response_text)
            .map_err(|e| STTError::ProviderError(format!("Failed to parse response: {e}")))?;

        debug!("Whisper transcript: {} characters", parsed.text.len());
        Ok(parsed.text)
    }

    fn provider_name(&self) -> &'static str {
        "whisper"
    }
}
