//! WebSocket connection handler
//!
//! One connection runs two halves: the read loop (this task) parses client
//! frames and dispatches them, and a spawned write task owns the sink,
//! interleaving request acks with engine events and stamping events with a
//! per-connection sequence number.

use crate::handlers::{ConnectionContext, RequestDispatcher};
use crate::protocol::{ClientRequest, CloseCode, ServerMessage};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use collab_core::CollabEvent;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

/// Buffer for engine events; a connection that falls this far behind
/// starts missing events rather than blocking the room
const EVENT_BUFFER_SIZE: usize = 256;

/// Buffer for acks and rejections
const OUTBOUND_BUFFER_SIZE: usize = 64;

/// Frames handed to the write task
enum Outbound {
    Message(ServerMessage),
    Close(CloseCode),
}

/// WebSocket upgrade handler for `/ws`
pub async fn ws_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let (events_tx, events_rx) = mpsc::channel::<CollabEvent>(EVENT_BUFFER_SIZE);
    let (out_tx, out_rx) = mpsc::channel::<Outbound>(OUTBOUND_BUFFER_SIZE);

    let (ws_sink, mut ws_stream) = socket.split();
    let write_task = tokio::spawn(write_loop(ws_sink, out_rx, events_rx));

    let mut ctx = ConnectionContext::new();

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Some(close_code) =
                    handle_text_frame(&state, &mut ctx, &events_tx, &out_tx, &text).await
                {
                    let _ = out_tx.send(Outbound::Close(close_code)).await;
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!("Binary frames not supported");
                let _ = out_tx.send(Outbound::Close(CloseCode::DecodeError)).await;
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Pong replies are handled by axum
            }
            Ok(Message::Close(_)) => {
                tracing::debug!("Client closed connection");
                break;
            }
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Tear down in-memory state before the write task drains
    if let Some(session) = ctx.session.take() {
        state.engine().disconnect(session.session_id());
    }

    drop(out_tx);
    drop(events_tx);
    let _ = write_task.await;
}

/// Handle one text frame; a returned close code terminates the connection
async fn handle_text_frame(
    state: &GatewayState,
    ctx: &mut ConnectionContext,
    events_tx: &mpsc::Sender<CollabEvent>,
    out_tx: &mpsc::Sender<Outbound>,
    text: &str,
) -> Option<CloseCode> {
    let request = match ClientRequest::from_json(text) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable frame");
            return Some(CloseCode::DecodeError);
        }
    };

    let name = request.name();
    match RequestDispatcher::dispatch(state, ctx, events_tx, request) {
        Ok(ack) => {
            if out_tx.send(Outbound::Message(ack)).await.is_err() {
                return Some(CloseCode::UnknownError);
            }
            None
        }
        Err(e) => {
            tracing::debug!(request = name, code = e.code(), "Request rejected");
            let rejected = ServerMessage::rejected(name, e.code(), e.to_string());
            let _ = out_tx.send(Outbound::Message(rejected)).await;
            e.close_code()
        }
    }
}

/// Owns the sink: sends acks and engine events, assigning event sequence
/// numbers in send order
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<Outbound>,
    mut events_rx: mpsc::Receiver<CollabEvent>,
) {
    let mut seq: u64 = 0;

    loop {
        let message = tokio::select! {
            out = out_rx.recv() => match out {
                Some(Outbound::Message(message)) => message,
                Some(Outbound::Close(code)) => {
                    let _ = sink
                        .send(Message::Close(Some(CloseFrame {
                            code: code.as_u16(),
                            reason: code.description().into(),
                        })))
                        .await;
                    break;
                }
                None => break,
            },
            event = events_rx.recv() => match event {
                Some(event) => {
                    seq += 1;
                    ServerMessage::event(event, seq)
                }
                None => break,
            },
        };

        match message.to_json() {
            Ok(json) => {
                if sink.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode frame");
            }
        }
    }

    let _ = sink.close().await;
}
