use async_trait::async_trait;
use bytes::Bytes;

use super::base::{BaseSTT, STTError};

/// Transcript returned for any non-empty recording.
pub const MOCK_TRANSCRIPT: &str = "[mock transcript]";

/// Deterministic stand-in used for tests and as the fallback provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockSTT;

#[async_trait]
impl BaseSTT for MockSTT {
    async fn transcribe(&self, audio: Bytes) -> Result<String, STTError> {
        if audio.is_empty() {
            return Ok(String::new());
        }
        Ok(MOCK_TRANSCRIPT.to_string())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn is_mock(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transcribe_empty_input() {
        assert_eq!(MockSTT.transcribe(Bytes::new()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_mock_transcribe_is_deterministic() {
        let first = MockSTT.transcribe(Bytes::from_static(&[1, 2])).await.unwrap();
        let second = MockSTT
            .transcribe(Bytes::from(vec![0u8; 32000]))
            .await
            .unwrap();
        assert_eq!(first, MOCK_TRANSCRIPT);
        assert_eq!(second, MOCK_TRANSCRIPT);
        assert!(MockSTT.is_mock());
    }
}
