use async_trait::async_trait;
use bytes::Bytes;

use super::base::{AudioStream, BaseTTS, TTSError};

/// Number of chunks the mock emits per utterance.
pub const MOCK_CHUNK_COUNT: usize = 3;

/// Deterministic stand-in: three 100 ms chunks of silence per utterance.
#[derive(Debug, Clone, Copy)]
pub struct MockTTS {
    sample_rate: u32,
}

impl MockTTS {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Bytes in one 100 ms PCM16 mono chunk.
    pub fn chunk_bytes(&self) -> usize {
        (self.sample_rate as usize / 10) * 2
    }
}

#[async_trait]
impl BaseTTS for MockTTS {
    async fn synthesize(&self, _text: &str) -> Result<AudioStream, TTSError> {
        let chunk = Bytes::from(vec![0u8; self.chunk_bytes()]);
        let chunks = std::iter::repeat_n(chunk, MOCK_CHUNK_COUNT).map(Ok);
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn is_mock(&self) -> bool {
        true
    }
}
