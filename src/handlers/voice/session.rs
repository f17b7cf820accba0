//! Per-connection session state machine.
//!
//! The controller consumes inbound frames strictly in arrival order and awaits
//! every provider call inline, so at most one call is outstanding per session.
//! Frames that arrive meanwhile wait in the bounded inbound queue.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::inbound::{InboundFrame, InboundReceiver};
use super::messages::{IncomingMessage, MessageRoute, OutgoingMessage, ValidationError};
use crate::core::{
    AudioBuffer, AudioBufferError, InterceptorError, STTError, SttGateway, TTSError,
    TranscriptInterceptor, TtsGateway,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Started,
    ReceivingAudio,
    AwaitingText,
    Transcribing,
    Synthesizing,
    /// Outbound transport is gone; the session is over
    Errored,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Started => "started",
            SessionState::ReceivingAudio => "receiving_audio",
            SessionState::AwaitingText => "awaiting_text",
            SessionState::Transcribing => "transcribing",
            SessionState::Synthesizing => "synthesizing",
            SessionState::Errored => "errored",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("A session phase is already in progress")]
    AlreadyStarted,
    #[error("No recording in progress")]
    NotRecording,
    #[error("Not waiting for text; send start with text_only first")]
    NotAwaitingText,
    #[error("Audio received outside a recording phase")]
    UnexpectedAudio,
    #[error(transparent)]
    AudioTooLarge(#[from] AudioBufferError),
    #[error("Transcription failed: {0}")]
    Stt(#[from] STTError),
    #[error("Synthesis failed: {0}")]
    Tts(#[from] TTSError),
    #[error(transparent)]
    Interceptor(#[from] InterceptorError),
    #[error("Connection closed")]
    TransportClosed,
}

impl SessionError {
    /// Machine-readable reason sent in `error` events.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidMessage(_) => "invalid_message",
            SessionError::Validation(_) => "validation_error",
            SessionError::AlreadyStarted => "already_started",
            SessionError::NotRecording => "not_recording",
            SessionError::NotAwaitingText => "not_awaiting_text",
            SessionError::UnexpectedAudio => "unexpected_audio",
            SessionError::AudioTooLarge(_) => "audio_too_large",
            SessionError::Stt(STTError::AuthenticationFailed(_))
            | SessionError::Tts(TTSError::AuthenticationFailed(_)) => "provider_auth",
            SessionError::Stt(STTError::Unavailable(_))
            | SessionError::Tts(TTSError::Unavailable(_)) => "provider_unavailable",
            SessionError::Stt(STTError::UnsupportedFormat(_)) => "unsupported_format",
            SessionError::Stt(_) | SessionError::Tts(_) => "provider_error",
            SessionError::Interceptor(_) => "interceptor_error",
            SessionError::TransportClosed => "transport_closed",
        }
    }
}

/// One voice session: state, audio buffer, and the gateways resolved for it.
pub struct SessionController {
    id: String,
    state: SessionState,
    text_only: bool,
    audio: AudioBuffer,
    pending_transcript: Option<String>,
    stt: SttGateway,
    tts: TtsGateway,
    interceptor: Arc<dyn TranscriptInterceptor>,
    outbound: mpsc::Sender<MessageRoute>,
    cancel: CancellationToken,
}

impl SessionController {
    pub fn new(
        id: String,
        stt: SttGateway,
        tts: TtsGateway,
        interceptor: Arc<dyn TranscriptInterceptor>,
        max_audio_bytes: usize,
        outbound: mpsc::Sender<MessageRoute>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            text_only: false,
            audio: AudioBuffer::new(max_audio_bytes),
            pending_transcript: None,
            stt,
            tts,
            interceptor,
            outbound,
            cancel,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn text_only(&self) -> bool {
        self.text_only
    }

    /// Transcript of the phase currently being answered, if any.
    pub fn pending_transcript(&self) -> Option<&str> {
        self.pending_transcript.as_deref()
    }

    pub fn buffered_audio_bytes(&self) -> usize {
        self.audio.len()
    }

    /// Drive the session until the inbound channel closes, the connection is
    /// cancelled, or the outbound side goes away.
    pub async fn run(mut self, mut inbound: InboundReceiver) {
        info!(
            session_id = %self.id,
            stt = self.stt.provider_name(),
            tts = self.tts.provider_name(),
            "Voice session started"
        );

        loop {
            let frame = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                frame = inbound.recv() => frame,
            };
            let Some(frame) = frame else { break };

            if let Err(e) = self.handle_frame(frame).await {
                debug!(session_id = %self.id, "Session loop stopping: {}", e);
                break;
            }
        }

        info!(session_id = %self.id, state = %self.state, "Voice session ended");
    }

    /// Process one inbound frame.
    ///
    /// Protocol and provider failures are reported to the peer and leave the
    /// session usable; only a lost transport is returned as an error.
    pub async fn handle_frame(&mut self, frame: InboundFrame) -> Result<(), SessionError> {
        match frame {
            InboundFrame::Binary(data) => self.on_audio(data).await,
            InboundFrame::Text(raw) => {
                let message = match IncomingMessage::parse(&raw) {
                    Ok(message) => message,
                    Err(e) => return self.report(SessionError::InvalidMessage(e.to_string())).await,
                };
                if let Err(e) = message.validate_size() {
                    return self.report(e.into()).await;
                }
                self.on_control(message).await
            }
        }
    }

    async fn on_control(&mut self, message: IncomingMessage) -> Result<(), SessionError> {
        debug!(
            session_id = %self.id,
            event = message.event_name(),
            state = %self.state,
            "Control message"
        );

        match message {
            IncomingMessage::Start { text_only } => {
                if self.state != SessionState::Idle {
                    return self.report(SessionError::AlreadyStarted).await;
                }
                self.state = SessionState::Started;
                self.text_only = text_only;
                self.state = if text_only {
                    SessionState::AwaitingText
                } else {
                    self.audio.reset();
                    SessionState::ReceivingAudio
                };
                Ok(())
            }
            IncomingMessage::End => {
                if self.state != SessionState::ReceivingAudio {
                    return self.report(SessionError::NotRecording).await;
                }
                self.transcribe_phase().await
            }
            IncomingMessage::Text { text } => {
                if self.state != SessionState::AwaitingText {
                    return self.report(SessionError::NotAwaitingText).await;
                }
                self.synthesize_phase(text).await
            }
        }
    }

    async fn on_audio(&mut self, data: Bytes) -> Result<(), SessionError> {
        if self.state != SessionState::ReceivingAudio {
            return self.report(SessionError::UnexpectedAudio).await;
        }
        if let Err(e) = self.audio.append(&data) {
            self.state = SessionState::Idle;
            return self.report(e.into()).await;
        }
        Ok(())
    }

    async fn transcribe_phase(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Transcribing;
        let audio = self.audio.take();
        info!(session_id = %self.id, bytes = audio.len(), "Transcribing recording");

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SessionError::TransportClosed),
            result = self.stt.transcribe(audio) => result,
        };

        let transcript = match result {
            Ok(transcript) => transcript,
            Err(e) => {
                self.state = SessionState::Idle;
                return self.report(e.into()).await;
            }
        };

        self.emit(MessageRoute::Outgoing(OutgoingMessage::Transcript {
            text: transcript.clone(),
        }))
        .await?;
        self.pending_transcript = Some(transcript.clone());

        let reply = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SessionError::TransportClosed),
            reply = self.interceptor.intercept(&self.id, &transcript) => reply,
        };

        match reply {
            Ok(reply) => self.synthesize_phase(reply).await,
            Err(e) => {
                self.finish_phase();
                self.report(e.into()).await
            }
        }
    }

    async fn synthesize_phase(&mut self, text: String) -> Result<(), SessionError> {
        self.state = SessionState::Synthesizing;
        debug!(session_id = %self.id, chars = text.len(), "Synthesizing reply");

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(SessionError::TransportClosed),
            result = self.tts.synthesize(&text) => result,
        };

        let mut stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                self.finish_phase();
                return self.report(e.into()).await;
            }
        };

        let mut chunks = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(SessionError::TransportClosed),
                next = stream.next() => next,
            };
            match next {
                Some(Ok(chunk)) => {
                    chunks += 1;
                    self.emit(MessageRoute::Audio(chunk)).await?;
                }
                Some(Err(e)) => {
                    warn!(session_id = %self.id, chunks, "Synthesis stream failed");
                    self.finish_phase();
                    return self.report(e.into()).await;
                }
                None => break,
            }
        }

        self.emit(MessageRoute::Outgoing(OutgoingMessage::TtsEnd))
            .await?;
        info!(
            session_id = %self.id,
            provider = self.tts.provider_name(),
            chunks,
            "Synthesis complete"
        );
        self.finish_phase();
        Ok(())
    }

    fn finish_phase(&mut self) {
        self.state = SessionState::Idle;
        self.pending_transcript = None;
    }

    /// Send a recoverable error to the peer.
    async fn report(&mut self, error: SessionError) -> Result<(), SessionError> {
        warn!(
            session_id = %self.id,
            code = error.code(),
            state = %self.state,
            "{}", error
        );
        let message = OutgoingMessage::error(error.code(), error.to_string());
        self.emit(MessageRoute::Outgoing(message)).await
    }

    /// Queue a frame for the writer, waiting for capacity.
    async fn emit(&mut self, route: MessageRoute) -> Result<(), SessionError> {
        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = self.outbound.send(route) => result.is_ok(),
        };
        if !sent {
            self.state = SessionState::Errored;
            return Err(SessionError::TransportClosed);
        }
        Ok(())
    }
}
