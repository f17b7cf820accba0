//! Voice WebSocket handler
//!
//! Splits the socket into a writer task draining the outbound route channel
//! and a reader loop that forwards frames to the session task. The session
//! task owns the [`SessionController`]; the reader never waits on it, so idle
//! detection and disconnects are noticed while a provider call is in flight.
//! Frames that do not fit the inbound queue are dropped and reported.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::{select, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::inbound::{InboundFrame, InboundSender, PushError, inbound_queue};
use super::messages::{MAX_TEXT_SIZE, MessageRoute, OutgoingMessage};
use super::session::SessionController;
use crate::middleware::ClientIp;
use crate::state::AppState;

/// Frames buffered between the socket reader and a busy session
pub const INBOUND_QUEUE_DEPTH: usize = 64;

/// Upper bound for a single WebSocket message (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// How often we check if the connection is stale
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Maximum time without inbound frames before the connection is closed
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// How long a cancelled session may take to wind down before it is aborted
const SESSION_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Voice WebSocket handler
///
/// Upgrades the HTTP connection to a WebSocket carrying one voice session.
/// The `ClientIp` extension is present when the connection-limit middleware
/// reserved a slot; the slot is released when the socket closes.
pub async fn voice_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    let client_ip = client_ip.map(|Extension(ip)| ip);
    debug!(ip = ?client_ip, "Voice WebSocket upgrade requested");

    // Nothing larger than the inbound byte budget can ever be queued.
    let max_message = inbound_budget(&state).min(MAX_WS_MESSAGE_SIZE);
    ws.max_frame_size(max_message)
        .max_message_size(max_message)
        .on_upgrade(move |socket| handle_voice_socket(socket, state, client_ip))
}

/// Bytes the inbound queue of one connection may hold.
fn inbound_budget(state: &AppState) -> usize {
    state.config.max_audio_bytes.max(MAX_TEXT_SIZE)
}

async fn handle_voice_socket(
    socket: WebSocket,
    app_state: Arc<AppState>,
    client_ip: Option<ClientIp>,
) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Voice WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (message_tx, mut message_rx) =
        mpsc::channel::<MessageRoute>(app_state.config.tts_queue_depth);
    let (inbound_tx, inbound_rx) = inbound_queue(INBOUND_QUEUE_DEPTH, inbound_budget(&app_state));
    let cancel = CancellationToken::new();

    // Sender task for outgoing messages
    let sender_task = tokio::spawn(async move {
        while let Some(route) = message_rx.recv().await {
            let should_close = matches!(route, MessageRoute::Close);

            let result = match route {
                MessageRoute::Outgoing(message) => match serde_json::to_string(&message) {
                    Ok(json_str) => sender.send(Message::Text(json_str.into())).await,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                },
                MessageRoute::Audio(data) => sender.send(Message::Binary(data)).await,
                MessageRoute::Close => {
                    info!("Closing voice WebSocket connection");
                    sender.send(Message::Close(None)).await
                }
            };

            if let Err(e) = result {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }

            if should_close {
                break;
            }
        }
    });

    let (stt, tts) = app_state.session_gateways();
    let session = SessionController::new(
        session_id.clone(),
        stt,
        tts,
        app_state.interceptor.clone(),
        app_state.config.max_audio_bytes,
        message_tx.clone(),
        cancel.clone(),
    );
    let mut session_task = tokio::spawn(session.run(inbound_rx));

    let mut last_activity = std::time::Instant::now();
    let mut closed_by_peer = false;

    loop {
        select! {
            msg_result = receiver.next() => {
                last_activity = std::time::Instant::now();

                match msg_result {
                    Some(Ok(msg)) => {
                        let continue_processing =
                            process_voice_message(msg, &inbound_tx, &message_tx, &session_id);
                        if !continue_processing {
                            closed_by_peer = true;
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, "Voice WebSocket error: {}", e);
                        closed_by_peer = true;
                        break;
                    }
                    None => {
                        info!(session_id = %session_id, "Voice WebSocket connection closed by client");
                        closed_by_peer = true;
                        break;
                    }
                }
            }
            _ = &mut session_task => {
                debug!(session_id = %session_id, "Session task finished before the socket closed");
                break;
            }
            _ = tokio::time::sleep(IDLE_CHECK_INTERVAL) => {
                if last_activity.elapsed() > IDLE_TIMEOUT {
                    warn!(
                        session_id = %session_id,
                        "Voice WebSocket connection idle for {}s, closing stale connection",
                        last_activity.elapsed().as_secs()
                    );
                    let _ = message_tx.try_send(MessageRoute::Outgoing(OutgoingMessage::error(
                        "idle_timeout",
                        "Connection closed due to inactivity",
                    )));
                    let _ = message_tx.try_send(MessageRoute::Close);
                    break;
                }
                debug!(session_id = %session_id, "Voice WebSocket connection idle check - still active");
            }
        }
    }

    // Stop the session: no more inbound frames, and any in-flight provider call
    // or chunk forwarding is abandoned.
    drop(inbound_tx);
    cancel.cancel();
    if !session_task.is_finished()
        && tokio::time::timeout(SESSION_SHUTDOWN_GRACE, &mut session_task)
            .await
            .is_err()
    {
        warn!(session_id = %session_id, "Session did not stop in time, aborting");
        session_task.abort();
    }

    if closed_by_peer {
        sender_task.abort();
    } else {
        // Let queued frames (idle notice, close) reach the peer.
        drop(message_tx);
        if tokio::time::timeout(SESSION_SHUTDOWN_GRACE, sender_task)
            .await
            .is_err()
        {
            debug!(session_id = %session_id, "Writer did not drain in time");
        }
    }

    if let Some(ClientIp(ip)) = client_ip {
        app_state.release_connection(ip);
    }

    info!(session_id = %session_id, "Voice WebSocket connection terminated");
}

/// Forward one WebSocket message to the session; `false` ends the connection.
fn process_voice_message(
    msg: Message,
    inbound_tx: &InboundSender,
    message_tx: &mpsc::Sender<MessageRoute>,
    session_id: &str,
) -> bool {
    let frame = match msg {
        Message::Text(text) => {
            debug!("Received text message: {} bytes", text.len());
            InboundFrame::Text(text.as_str().to_owned())
        }
        Message::Binary(data) => {
            debug!("Received binary audio: {} bytes", data.len());
            InboundFrame::Binary(data)
        }
        Message::Ping(_) => {
            debug!("Received ping");
            return true;
        }
        Message::Pong(_) => {
            debug!("Received pong");
            return true;
        }
        Message::Close(_) => {
            info!("Voice WebSocket close received");
            return false;
        }
    };

    let size = frame.len();
    match inbound_tx.try_push(frame) {
        Ok(()) => true,
        Err(PushError::Full) => {
            warn!(
                session_id = %session_id,
                bytes = size,
                queued_bytes = inbound_tx.queued_bytes(),
                "Session busy, dropping inbound frame"
            );
            let notice = OutgoingMessage::error(
                "session_busy",
                "Session is busy; frame dropped",
            );
            if message_tx.try_send(MessageRoute::Outgoing(notice)).is_err() {
                debug!(session_id = %session_id, "Outbound queue full, busy notice not sent");
            }
            true
        }
        Err(PushError::Closed) => false,
    }
}
