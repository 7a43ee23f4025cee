//! Handlers for direct-message chats.
//!
//! | Method       | Path | Notes |
//! |--------------|------|-------|
//! | `GET`/`POST` | `/chats` | Create body: `{"participants":[…]}` (caller is added) |
//! | `GET`/`POST` | `/chats/{id}/messages` | Send body: `{"body":…}` |
//! | `POST`       | `/chats/{id}/messages/{message_id}/delete` | Sender only; returns the restoration token |
//! | `GET`        | `/chat/deleted-messages` | Caller's deleted messages with `time_remaining_ms` |
//! | `POST`       | `/chat/restore-message` | Body: `{"restoration_token":…}` |

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use showcase_core::{
  ActorContext, Authority,
  chat::{Chat, ChatMessage, DeletedMessage},
  lifecycle::Trashed,
  store::Platform,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Chats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub participants: Vec<Uuid>,
}

/// `GET /chats`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
) -> Result<Json<Vec<Chat>>, ApiError>
where
  S: Platform,
{
  let chats = state
    .store
    .list_chats(actor.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(chats))
}

/// `POST /chats`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Platform,
{
  let chat = state
    .store
    .create_chat(actor.id, body.participants, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(chat)))
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageBody {
  pub body: String,
}

/// `GET /chats/{id}/messages`
pub async fn list_messages<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, ApiError>
where
  S: Platform,
{
  let messages = state
    .store
    .list_messages(id, actor)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}

/// `POST /chats/{id}/messages`
pub async fn send_message<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
  Json(body): Json<MessageBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Platform,
{
  let message = state
    .store
    .send_message(id, actor, body.body, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(message)))
}

/// `POST /chats/{id}/messages/{message_id}/delete`
pub async fn delete_message<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path((chat_id, message_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeletedMessage>, ApiError>
where
  S: Platform,
{
  let in_chat = state
    .store
    .get_message(message_id)
    .await
    .map_err(ApiError::store)?
    .is_some_and(|m| m.chat_id == chat_id);
  if !in_chat {
    return Err(ApiError::NotFound(format!(
      "message not found: {message_id}"
    )));
  }

  let deleted = state
    .store
    .delete_message(message_id, actor, Authority::Owner, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(deleted))
}

/// `GET /chat/deleted-messages`
pub async fn list_deleted_messages<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
) -> Result<Json<Vec<Trashed<DeletedMessage>>>, ApiError>
where
  S: Platform,
{
  let now = Utc::now();
  let messages = state
    .store
    .list_deleted_messages(actor.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(
    messages
      .into_iter()
      .map(|m| {
        let deletion = m.deletion();
        Trashed::with_deletion(m, &deletion, now)
      })
      .collect(),
  ))
}

#[derive(Debug, Deserialize)]
pub struct RestoreBody {
  #[serde(alias = "restorationToken")]
  pub restoration_token: String,
}

/// `POST /chat/restore-message`
pub async fn restore_message<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Json(body): Json<RestoreBody>,
) -> Result<Json<ChatMessage>, ApiError>
where
  S: Platform,
{
  let message = state
    .store
    .restore_message(body.restoration_token, actor, Authority::Owner, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(message))
}
