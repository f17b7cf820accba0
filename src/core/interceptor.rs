//! Hook between transcription and synthesis.
//!
//! By default a session speaks back what it heard. Deployments that put a
//! dialogue service behind the gateway install their own
//! [`TranscriptInterceptor`] in `AppState` to turn the transcript into a reply.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Transcript interceptor failed: {0}")]
pub struct InterceptorError(pub String);

#[async_trait]
pub trait TranscriptInterceptor: Send + Sync {
    /// Map a finished transcript to the text that should be synthesized.
    async fn intercept(&self, session_id: &str, transcript: &str)
    -> Result<String, InterceptorError>;
}

/// Returns the transcript unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoInterceptor;

#[async_trait]
impl TranscriptInterceptor for EchoInterceptor {
    async fn intercept(
        &self,
        _session_id: &str,
        transcript: &str,
    ) -> Result<String, InterceptorError> {
        Ok(transcript.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_transcript() {
        let reply = EchoInterceptor.intercept("s1", "hello world").await.unwrap();
        assert_eq!(reply, "hello world");
    }
}
