use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use crate::{
    structs::event::{LiveEventKind, WsEvent},
    utils::real_time_event_management::{EventTracker, UserConnection},
};

pub async fn ws_route(
    ws: WebSocketUpgrade,
    Extension(event_tracker): Extension<EventTracker>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, event_tracker))
}

/// Every connection receives all like and comment updates until it
/// unsubscribes; per-post filtering happens on the client.
pub async fn handle_socket(socket: WebSocket, event_tracker: EventTracker) {
    let (mut sink, mut receiver) = socket.split();
    let (sender, mut outgoing) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(message) = outgoing.recv().await {
            if let Err(e) = sink.send(message).await {
                warn!("Error writing to websocket : {e}");
                break;
            }
        }
    });

    let connection = Arc::new(RwLock::new(UserConnection::new(sender)));

    for event_type in LiveEventKind::ALL {
        event_tracker
            .subscribe(event_type, connection.clone())
            .await;
    }

    connection
        .read()
        .await
        .send_event(&WsEvent::Ready(LiveEventKind::ALL.to_vec()));
    info!("Websocket connection registered");

    while let Some(msg) = receiver.next().await {
        let Ok(msg) = msg else {
            break;
        };

        match msg {
            Message::Text(text) => {
                if let Err(e) = event_tracker
                    .handle_client_event(&text, connection.clone())
                    .await
                {
                    connection.read().await.send_event(&WsEvent::new_error(&e));
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    event_tracker.disconnect(connection).await;
    writer.abort();
    info!("Websocket connection closed");
}
