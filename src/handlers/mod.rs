//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `voice` - Voice session WebSocket

pub mod api;
pub mod voice;

pub use voice::voice_handler;
