use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use melotech_core::registry::{ChannelSubscriber, DEFAULT_OUTBOX_BUFFER, Room, TransportError};
use melotech_sdk::objects::ws::ECHO_PREFIX;

use crate::state::AppState;

/// `GET /ws/admin`: every submission update.
pub(super) async fn admin_ws(state: State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let app_state = state.0.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, Room::admin(), None))
}

/// `GET /ws/artist/{user_id}`: updates of one artist's submissions.
pub(super) async fn artist_ws(
    state: State<AppState>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let app_state = state.0.clone();
    let room = Room::artist(&user_id);
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, room, Some(user_id)))
}

/// Drives one WebSocket connection.
///
/// Outbound frames come from the registry through a bounded outbox served
/// by a writer task. Inbound text is echoed back to the sender only. The
/// connection is removed from the registry when the client goes away.
async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    room: Room,
    subscriber_id: Option<String>,
) {
    let send_timeout = state.config.server.read().await.send_timeout;
    let (sink, mut outbox) = ChannelSubscriber::channel(DEFAULT_OUTBOX_BUFFER, send_timeout);
    // axum has already completed the upgrade by the time we get here.
    let handshake = std::future::ready(Ok::<_, TransportError>(sink));
    let info = match state.registry.connect(handshake, room, subscriber_id).await {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(error = %e, "WS: connection refused");
            return;
        }
    };

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Ends when the registry drops the subscriber or the client is gone.
    let writer = tokio::spawn(async move {
        while let Some(text) = outbox.recv().await {
            if ws_tx.send(Message::Text(String::from(&*text).into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = format!("{ECHO_PREFIX}{}", text.as_str());
                if let Err(e) = state.registry.send_to(info.id, &reply).await {
                    tracing::debug!(connection_id = %info.id, error = %e, "WS: echo failed");
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %info.id, error = %e, "WS: receive failed");
                break;
            }
        }
    }

    state.registry.disconnect(info.id).await;
    let _ = writer.await;
}
