//! Voice WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::voice::voice_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the voice session WebSocket router
///
/// # Endpoint
///
/// `GET /voice/ws` - WebSocket upgrade, one voice session per connection
///
/// # Example
///
/// ```json
/// // Client opens a recording phase, streams binary PCM frames, then ends it
/// {"event": "start"}
/// {"event": "end"}
///
/// // Server answers with the transcript, binary audio frames, and the end marker
/// {"event": "transcript", "text": "what time is it"}
/// {"event": "tts_end"}
/// ```
pub fn create_voice_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/voice/ws", get(voice_handler))
        .layer(TraceLayer::new_for_http())
}
