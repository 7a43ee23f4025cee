//! Direct-message chats.
//!
//! Messages are soft-deleted in place, like projects, so a restored message
//! keeps its original position. Deleting a message also issues a
//! restoration token that can be handed back to undo the deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::EntityKind,
  lifecycle::{Deletion, Lifecycle, SoftDeletable},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
  pub chat_id:      Uuid,
  pub participants: Vec<Uuid>,
  pub created_at:   DateTime<Utc>,
}

impl Chat {
  pub fn has_participant(&self, user_id: Uuid) -> bool {
    self.participants.contains(&user_id)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub message_id: Uuid,
  pub chat_id:    Uuid,
  pub sender_id:  Uuid,
  pub body:       String,
  pub sent_at:    DateTime<Utc>,
  /// Position within the chat; strictly increasing per chat.
  pub seq:        i64,
  #[serde(flatten)]
  pub lifecycle:  Lifecycle,
}

impl SoftDeletable for ChatMessage {
  const KIND: EntityKind = EntityKind::Message;

  fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }
}

/// Snapshot handed back when a message is deleted, carrying the token needed
/// to restore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedMessage {
  pub message_id:              Uuid,
  pub chat_id:                 Uuid,
  pub sender_id:               Uuid,
  pub body:                    String,
  pub sent_at:                 DateTime<Utc>,
  pub deleted_at:              DateTime<Utc>,
  pub deleted_by:              Uuid,
  pub restore_available_until: DateTime<Utc>,
  pub restoration_token:       String,
}

impl DeletedMessage {
  pub fn from_parts(message: &ChatMessage, deletion: &Deletion, token: String) -> Self {
    Self {
      message_id:              message.message_id,
      chat_id:                 message.chat_id,
      sender_id:               message.sender_id,
      body:                    message.body.clone(),
      sent_at:                 message.sent_at,
      deleted_at:              deletion.deleted_at,
      deleted_by:              deletion.deleted_by,
      restore_available_until: deletion.restore_available_until,
      restoration_token:       token,
    }
  }

  pub fn deletion(&self) -> Deletion {
    Deletion {
      deleted_at:              self.deleted_at,
      deleted_by:              self.deleted_by,
      restore_available_until: self.restore_available_until,
    }
  }
}
