//! Generic HTTP synthesis plumbing.
//!
//! Each REST vendor only describes how to build its request
//! ([`TTSRequestBuilder`]); [`HttpTTS`] sends it, maps failures, and turns the
//! response body into a stream of fixed-size PCM16 frames.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use super::base::{AudioStream, BaseTTS, TTSError};
use crate::core::http::{classify_status, classify_transport, truncate_body};
use crate::core::registry::ProviderSettings;

/// Container the vendor returns audio in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseEncoding {
    /// Headerless PCM16 LE at the requested rate; streamed as it arrives
    RawPcm,
    /// Complete WAV file; buffered and decoded before streaming
    Wav,
}

/// Vendor-specific part of an HTTP synthesis call.
pub trait TTSRequestBuilder: Send + Sync {
    /// Build the vendor HTTP request for `text`
    fn build_http_request(&self, client: &reqwest::Client, text: &str) -> reqwest::RequestBuilder;

    fn provider_name(&self) -> &'static str;

    fn response_encoding(&self) -> ResponseEncoding {
        ResponseEncoding::RawPcm
    }
}

/// REST-backed TTS provider parameterized by its request builder.
pub struct HttpTTS<B: TTSRequestBuilder> {
    builder: B,
    settings: ProviderSettings,
}

impl<B: TTSRequestBuilder> HttpTTS<B> {
    pub fn new(builder: B, settings: ProviderSettings) -> Self {
        Self { builder, settings }
    }

    async fn send(&self, text: &str) -> Result<reqwest::Response, TTSError> {
        let name = self.builder.provider_name();
        let response = self
            .builder
            .build_http_request(&self.settings.client, text)
            .send()
            .await
            .map_err(|e| {
                TTSError::from_failure(
                    classify_transport(&e),
                    format!("{name} request failed: {e}"),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TTSError::from_failure(
                classify_status(status),
                format!("{name} API error ({status}): {}", truncate_body(&body)),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl<B: TTSRequestBuilder + 'static> BaseTTS for HttpTTS<B> {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, TTSError> {
        let name = self.builder.provider_name();
        info!(provider = name, "Synthesizing {} characters", text.len());

        let response = self.send(text).await?;
        let chunk_bytes = self.settings.tts_chunk_bytes;

        match self.builder.response_encoding() {
            ResponseEncoding::RawPcm => {
                let body = response.bytes_stream().map(move |piece| {
                    piece.map_err(|e| {
                        TTSError::from_failure(
                            classify_transport(&e),
                            format!("{name} stream interrupted: {e}"),
                        )
                    })
                });
                Ok(rechunk_pcm(body, chunk_bytes))
            }
            ResponseEncoding::Wav => {
                let body = response.bytes().await.map_err(|e| {
                    TTSError::Unavailable(format!("{name} failed to read response: {e}"))
                })?;
                let pcm = decode_wav(&body, self.settings.sample_rate)?;
                debug!(provider = name, "Decoded {} bytes of PCM", pcm.len());
                Ok(rechunk_pcm(
                    futures::stream::once(async move { Ok(pcm) }),
                    chunk_bytes,
                ))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        self.builder.provider_name()
    }
}

/// Re-slice an arbitrary byte stream into `chunk_bytes` frames.
///
/// A trailing partial frame is flushed at the end; a dangling odd byte (half a
/// sample) is dropped.
pub fn rechunk_pcm<S>(source: S, chunk_bytes: usize) -> AudioStream
where
    S: Stream<Item = Result<Bytes, TTSError>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut source = std::pin::pin!(source);
        let mut pending = BytesMut::with_capacity(chunk_bytes);

        while let Some(piece) = source.next().await {
            match piece {
                Ok(bytes) => {
                    pending.extend_from_slice(&bytes);
                    while pending.len() >= chunk_bytes {
                        yield Ok(pending.split_to(chunk_bytes).freeze());
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        let whole_samples = pending.len() - pending.len() % 2;
        if whole_samples < pending.len() {
            warn!("Dropping trailing odd byte from synthesized audio");
        }
        if whole_samples > 0 {
            yield Ok(pending.split_to(whole_samples).freeze());
        }
    })
}

/// Decode a mono PCM16 WAV file into raw little-endian samples.
pub fn decode_wav(data: &[u8], expected_rate: u32) -> Result<Bytes, TTSError> {
    let mut reader = hound::WavReader::new(Cursor::new(data))
        .map_err(|e| TTSError::AudioProcessingError(format!("Invalid WAV response: {e}")))?;
    let spec = reader.spec();

    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(TTSError::AudioProcessingError(format!(
            "Expected 16-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }
    if spec.channels != 1 {
        return Err(TTSError::AudioProcessingError(format!(
            "Expected mono audio, got {} channels",
            spec.channels
        )));
    }
    if spec.sample_rate != expected_rate {
        return Err(TTSError::AudioProcessingError(format!(
            "Provider returned {} Hz audio, gateway is configured for {} Hz",
            spec.sample_rate, expected_rate
        )));
    }

    let mut pcm = BytesMut::with_capacity(reader.len() as usize * 2);
    for sample in reader.samples::<i16>() {
        let sample = sample
            .map_err(|e| TTSError::AudioProcessingError(format!("Corrupt WAV sample: {e}")))?;
        pcm.extend_from_slice(&sample.to_le_bytes());
    }
    Ok(pcm.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    async fn collect(stream: AudioStream) -> Vec<Result<Bytes, TTSError>> {
        stream.collect().await
    }

    fn wav_bytes(samples: &[i16], rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in samples {
                writer.write_sample(*s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[tokio::test]
    async fn test_rechunk_splits_and_flushes_tail() {
        let source = stream::iter(vec![
            Ok(Bytes::from(vec![1u8; 5])),
            Ok(Bytes::from(vec![2u8; 7])),
        ]);

        let chunks = collect(rechunk_pcm(source, 4)).await;
        let sizes: Vec<usize> = chunks.iter().map(|c| c.as_ref().unwrap().len()).collect();
        assert_eq!(sizes, vec![4, 4, 4]);

        let joined: Vec<u8> = chunks
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect();
        assert_eq!(&joined[..5], &[1, 1, 1, 1, 1]);
        assert_eq!(&joined[5..], &[2, 2, 2, 2, 2, 2, 2]);
    }

    #[tokio::test]
    async fn test_rechunk_drops_odd_trailing_byte() {
        let source = stream::iter(vec![Ok(Bytes::from(vec![0u8; 7]))]);
        let chunks = collect(rechunk_pcm(source, 4)).await;
        let sizes: Vec<usize> = chunks.iter().map(|c| c.as_ref().unwrap().len()).collect();
        assert_eq!(sizes, vec![4, 2]);
    }

    #[tokio::test]
    async fn test_rechunk_stops_after_error() {
        let source = stream::iter(vec![
            Ok(Bytes::from(vec![0u8; 4])),
            Err(TTSError::Unavailable("reset".into())),
            Ok(Bytes::from(vec![0u8; 4])),
        ]);
        let chunks = collect(rechunk_pcm(source, 4)).await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_ok());
        assert_eq!(chunks[1], Err(TTSError::Unavailable("reset".into())));
    }

    #[test]
    fn test_decode_wav_mono() {
        let wav = wav_bytes(&[0, 1, -1, 256], 16000, 1);
        let pcm = decode_wav(&wav, 16000).unwrap();
        assert_eq!(pcm.len(), 8);
        assert_eq!(&pcm[2..4], &1i16.to_le_bytes());
        assert_eq!(&pcm[6..8], &256i16.to_le_bytes());
    }

    #[test]
    fn test_decode_wav_rejects_rate_mismatch_and_stereo() {
        let wav = wav_bytes(&[0, 0], 22050, 1);
        let err = decode_wav(&wav, 16000).unwrap_err();
        assert!(err.to_string().contains("22050 Hz"));

        let wav = wav_bytes(&[0, 0], 16000, 2);
        assert!(decode_wav(&wav, 16000).is_err());

        assert!(decode_wav(b"not a wav", 16000).is_err());
    }
}
