use std::collections::HashSet;

use axum::{
    Extension,
    extract::{
        Json, Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::time::{Duration, interval};
use uuid::Uuid;

use super::model::{ChatMessage, SendMessageRequest, SendMessageResponse, validate_content};
use crate::{
    AppState,
    error::{AppError, AppResult},
    middleware::current_user,
    routes::profile::Profile,
    utils::{Claims, success_to_api_response},
};

const PING_INTERVAL_SECS: u64 = 30;

/// WebSocket 下发的帧
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatFrame {
    History { messages: Vec<ChatMessage> },
    Message { message: ChatMessage },
    Error { message: String },
}

#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(peer_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let me = current_user(&claims)?;
    let messages = ChatMessage::conversation(&state.pool, me, peer_id).await?;
    Ok(success_to_api_response(messages))
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(peer_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let me = current_user(&claims)?;
    // 先校验内容，空消息不访问数据库
    let content = validate_content(&req.content).map_err(AppError::Validation)?;

    if Profile::find_by_id(&state.pool, peer_id).await?.is_none() {
        return Err(AppError::NotFound("Recipient not found".into()));
    }

    let message = ChatMessage::insert(&state.pool, me, peer_id, &content).await?;
    let message_id = message.id;
    state.feed.publish(message);

    Ok((
        StatusCode::CREATED,
        success_to_api_response(SendMessageResponse { message_id }),
    ))
}

#[axum::debug_handler]
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(peer_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let me = current_user(&claims)?;
    Ok(ws.on_upgrade(move |socket| run_conversation(socket, state, me, peer_id)))
}

async fn send_frame(socket: &mut WebSocket, frame: &ChatFrame) -> Result<(), ()> {
    let json = serde_json::to_string(frame).map_err(|e| {
        tracing::error!("Failed to encode chat frame: {}", e);
    })?;
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

/// 先订阅再读历史，实时消息按历史 id 去重
async fn run_conversation(mut socket: WebSocket, state: AppState, me: Uuid, peer: Uuid) {
    let mut subscription = state.feed.subscribe(me, peer);

    let history = match ChatMessage::conversation(&state.pool, me, peer).await {
        Ok(history) => history,
        Err(e) => {
            tracing::error!("Failed to load conversation {} <-> {}: {}", me, peer, e);
            let _ = send_frame(&mut socket, &ChatFrame::Error { message: e.to_string() }).await;
            return;
        }
    };
    let mut seen: HashSet<Uuid> = history.iter().map(|m| m.id).collect();

    if send_frame(&mut socket, &ChatFrame::History { messages: history })
        .await
        .is_err()
    {
        return;
    }

    let mut ping = interval(Duration::from_secs(PING_INTERVAL_SECS));
    ping.tick().await;

    loop {
        tokio::select! {
            live = subscription.next() => {
                let Some(message) = live else { break };
                if !seen.insert(message.id) {
                    continue;
                }
                if send_frame(&mut socket, &ChatFrame::Message { message }).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if socket.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // 客户端发送消息走 HTTP 接口
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!("Conversation socket {} <-> {} closed", me, peer);
}
