//! WebSocket transport for game sessions.
//!
//! Each socket is split into a reader (this task) and a writer task that
//! drains the session's bounded outbound buffer. A write that exceeds the
//! configured timeout ends the session; the reader ends it on close, error
//! or end of stream. Either way the [`ClientConnection`] is dropped once.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::AppState;
use crate::protocol::Frame;
use crate::session::ClientConnection;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let coordinator = match state.gate.wait().await {
        Ok(coordinator) => coordinator,
        Err(e) => {
            warn!(error = %e, "Closing socket, no world to join");
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Frame>(state.config.outbound_buffer);
    let send_timeout = state.config.send_timeout();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let message = Message::Text((&*frame).into());
            match tokio::time::timeout(send_timeout, sink.send(message)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(error = %e, "Socket write failed");
                    break;
                }
                Err(_) => {
                    warn!(timeout_ms = send_timeout.as_millis() as u64, "Socket write timed out, dropping client");
                    break;
                }
            }
        }
        let _ = sink.close().await;
    });

    let mut conn = match ClientConnection::open(coordinator, tx).await {
        Ok(conn) => conn,
        Err(e) => {
            warn!(error = %e, "Failed to open session");
            writer.abort();
            return;
        }
    };

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = conn.on_message(text.as_str()).await {
                        debug!(player_id = conn.id(), error = %e, "Session ended while sending");
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(player_id = conn.id(), error = %e, "Socket read failed");
                    break;
                }
            },
            _ = &mut writer => break,
        }
    }

    conn.close();
    writer.abort();
}
