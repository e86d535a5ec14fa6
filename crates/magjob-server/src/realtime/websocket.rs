use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use magjob_core::{chat_topic, NotificationTarget};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::AppError;
use crate::service::chat::NewMessage;
use crate::AppState;

/// Frames a chat client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
enum ClientFrame {
    Send {
        chat_member_id: Uuid,
        content: String,
        attachment: Option<String>,
        first_and_last_name: Option<String>,
    },
    Viewed {
        message_id: Uuid,
        viewer: String,
    },
}

/// WebSocket handler for a chat room
async fn chat_ws(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    state.services.chats.find(chat_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, state, chat_id)))
}

/// WebSocket handler for a notification inbox
async fn notifications_ws(
    State(state): State<AppState>,
    Path((scope, id)): Path<(String, Uuid)>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let target = NotificationTarget::from_scope(&scope, id)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown notification scope '{}'", scope)))?;
    Ok(ws.on_upgrade(move |socket| handle_notification_socket(socket, state, target)))
}

async fn apply_frame(state: &AppState, chat_id: Uuid, frame: ClientFrame) -> Result<(), AppError> {
    match frame {
        ClientFrame::Send {
            chat_member_id,
            content,
            attachment,
            first_and_last_name,
        } => {
            state
                .services
                .chat_messages
                .send(
                    chat_id,
                    NewMessage {
                        chat_member_id,
                        content,
                        attachment,
                        first_and_last_name,
                    },
                )
                .await?;
        }
        ClientFrame::Viewed { message_id, viewer } => {
            state
                .services
                .chat_messages
                .mark_viewed(message_id, &viewer)
                .await?;
        }
    }
    Ok(())
}

async fn handle_chat_socket(socket: WebSocket, state: AppState, chat_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let topic = chat_topic(chat_id);
    let hub = state.hub.clone();
    let mut events = hub.subscribe(&topic).await;

    // Forward chat events to this client
    let send_task = tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            if sender.send(Message::Text(event.into())).await.is_err() {
                break;
            }
        }
    });

    // Persist frames from this client; the service publishes the results
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let frame = match serde_json::from_str::<ClientFrame>(text.as_str()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!("Skipping malformed chat frame: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = apply_frame(&state, chat_id, frame).await {
                        tracing::warn!("Chat frame rejected in chat {}: {}", chat_id, e);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    join_either(send_task, recv_task).await;
    hub.release(&topic).await;

    tracing::debug!("WebSocket connection closed for chat {}", chat_id);
}

async fn handle_notification_socket(socket: WebSocket, state: AppState, target: NotificationTarget) {
    let (mut sender, mut receiver) = socket.split();
    let topic = target.topic();
    let hub = state.hub;
    let mut events = hub.subscribe(&topic).await;

    let send_task = tokio::spawn(async move {
        while let Some(event) = next_event(&mut events).await {
            if sender.send(Message::Text(event.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive-only channel: incoming frames are drained until close
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    join_either(send_task, recv_task).await;
    hub.release(&topic).await;

    tracing::debug!("WebSocket connection closed for {}", topic);
}

/// Run until either half of a socket finishes, then stop the other and wait
/// for it so its hub receiver is dropped before the caller releases the topic.
async fn join_either(mut send_task: JoinHandle<()>, mut recv_task: JoinHandle<()>) {
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
            let _ = recv_task.await;
        }
        _ = &mut recv_task => {
            send_task.abort();
            let _ = send_task.await;
        }
    }
}

/// Next payload, skipping over messages lost to a slow consumer.
async fn next_event(events: &mut broadcast::Receiver<String>) -> Option<String> {
    loop {
        match events.recv().await {
            Ok(event) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Subscriber lagged, {} events dropped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ws/chats/{chat_id}", get(chat_ws))
        .route("/ws/notifications/{scope}/{id}", get(notifications_ws))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_frames_parse() {
        let member = Uuid::new_v4();
        let frame: ClientFrame = serde_json::from_str(&format!(
            r#"{{"type":"send","chatMemberId":"{}","content":"hi"}}"#,
            member
        ))
        .unwrap();
        assert!(matches!(
            frame,
            ClientFrame::Send { chat_member_id, attachment: None, .. } if chat_member_id == member
        ));

        let frame: ClientFrame = serde_json::from_str(&format!(
            r#"{{"type":"viewed","messageId":"{}","viewer":"anna"}}"#,
            Uuid::nil()
        ))
        .unwrap();
        assert!(matches!(frame, ClientFrame::Viewed { .. }));

        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"shout"}"#).is_err());
    }
}
