//! Voice session WebSocket handlers
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - **start**: Open a phase; `text_only` (default `false`) chooses text input over audio
//! - **end** (alias **audio_end**): Close the recording phase and transcribe it
//! - **text**: Text to speak, accepted after a `text_only` start
//! - **Binary frames**: Microphone audio (PCM 16-bit LE, mono, configured sample rate)
//!
//! ## Server → Client
//!
//! - **transcript**: Final transcript of a recording phase
//! - **tts_end**: All synthesized audio of the phase has been sent
//! - **error**: Problem report with a machine-readable `code`
//! - **Binary frames**: Synthesized audio (same format as the input)

mod handler;
pub mod inbound;
pub mod messages;
pub mod session;

pub use handler::{INBOUND_QUEUE_DEPTH, voice_handler};
pub use inbound::{InboundFrame, InboundReceiver, InboundSender, PushError, inbound_queue};
pub use messages::{IncomingMessage, MessageRoute, OutgoingMessage};
pub use session::{SessionController, SessionError, SessionState};
