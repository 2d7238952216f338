use axum::{
    extract::{ws::Message, State, WebSocketUpgrade},
    response::Response,
};
use axum::extract::ws::WebSocket;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::handlers::{self, Connection};
use crate::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn send_all(
    sender: &mut SplitSink<WebSocket, Message>,
    messages: Vec<Value>,
) -> Result<(), axum::Error> {
    for msg in messages {
        sender.send(Message::Text(msg.to_string())).await?;
    }
    Ok(())
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_uid = state.generate_client_uid();
    info!("New WebSocket connection: {}", client_uid);

    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let mut conn = Connection::new(client_uid.clone(), state.default_pair(), results_tx);
    let (mut sender, mut receiver) = socket.split();

    let initial_messages = vec![
        json!({
            "type": "connected",
            "client_uid": client_uid,
        }),
        handlers::languages_message(),
        handlers::pair_message(conn.session.pair()),
        handlers::credential_message(&state),
    ];

    if let Err(e) = send_all(&mut sender, initial_messages).await {
        error!("Failed to send initial message: {}", e);
        return;
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match handlers::handle_message(&state, &mut conn, &text).await {
                            Ok(replies) => {
                                if let Err(e) = send_all(&mut sender, replies).await {
                                    error!("Failed to send reply: {}", e);
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("Error handling message: {}", e);
                                let reply = json!({ "type": "error", "message": e.to_string() });
                                if send_all(&mut sender, vec![reply]).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Client {} disconnected", client_uid);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            Some(done) = results_rx.recv() => {
                if let Some(reply) = handlers::handle_worker_result(&state, &mut conn, done) {
                    let status = handlers::translating_message(&conn.session);
                    if let Err(e) = send_all(&mut sender, vec![reply, status]).await {
                        error!("Failed to deliver translation result: {}", e);
                        break;
                    }
                }
            }
        }
    }

    // Cleanup
    handlers::disconnect(&state, &mut conn);

    info!("Cleaned up client {}", client_uid);
}
