//! [`ChatStore`] for [`SqliteStore`].
//!
//! Deleting a message flags it in place and stamps a restoration token on
//! the row. Restoring by token clears both, so the message reappears at its
//! original `seq` and the token cannot be used twice.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use showcase_core::{
  ActorContext, Authority, EntityKind, Error as CoreError, Role,
  chat::{Chat, ChatMessage, DeletedMessage},
  lifecycle::Deletion,
  moderation::Action,
  store::ChatStore,
};
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{MESSAGE_COLUMNS, RawChat, RawMessage, encode_dt, encode_uuid, stored_dt},
  store::PendingActivity,
};

// ─── Access checks ───────────────────────────────────────────────────────────

/// Whether a user may see a chat, as determined inside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChatAccess {
  Missing,
  Denied,
  Granted,
}

impl ChatAccess {
  fn into_result(self, chat_id: Uuid) -> Result<()> {
    match self {
      Self::Granted => Ok(()),
      Self::Missing => Err(CoreError::not_found(EntityKind::Chat, chat_id).into()),
      Self::Denied => Err(
        CoreError::forbidden(format!("not a participant of chat {chat_id}")).into(),
      ),
    }
  }
}

fn chat_access(
  conn: &rusqlite::Connection,
  chat_str: &str,
  user_str: &str,
  is_admin: bool,
) -> rusqlite::Result<ChatAccess> {
  let exists = conn
    .query_row(
      "SELECT 1 FROM chats WHERE chat_id = ?1",
      rusqlite::params![chat_str],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if !exists {
    return Ok(ChatAccess::Missing);
  }
  if is_admin || is_participant(conn, chat_str, user_str)? {
    Ok(ChatAccess::Granted)
  } else {
    Ok(ChatAccess::Denied)
  }
}

fn is_participant(
  conn: &rusqlite::Connection,
  chat_str: &str,
  user_str: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM chat_participants WHERE chat_id = ?1 AND user_id = ?2",
        rusqlite::params![chat_str, user_str],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn load_chat(conn: &rusqlite::Connection, chat_str: &str) -> rusqlite::Result<Option<RawChat>> {
  let created_at: Option<String> = conn
    .query_row(
      "SELECT created_at FROM chats WHERE chat_id = ?1",
      rusqlite::params![chat_str],
      |row| row.get(0),
    )
    .optional()?;
  let Some(created_at) = created_at else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(
    "SELECT user_id FROM chat_participants WHERE chat_id = ?1 ORDER BY user_id",
  )?;
  let participants = stmt
    .query_map(rusqlite::params![chat_str], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;

  Ok(Some(RawChat {
    chat_id: chat_str.to_owned(),
    created_at,
    participants,
  }))
}

fn select_message(
  conn: &rusqlite::Connection,
  message_str: &str,
) -> rusqlite::Result<Option<RawMessage>> {
  conn
    .query_row(
      &format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.message_id = ?1"),
      rusqlite::params![message_str],
      RawMessage::from_row,
    )
    .optional()
}

fn message_missing(id: impl ToString) -> Error {
  CoreError::not_found(EntityKind::Message, id).into()
}

// ─── ChatStore impl ──────────────────────────────────────────────────────────

impl ChatStore for SqliteStore {
  async fn create_chat(
    &self,
    creator: Uuid,
    participants: Vec<Uuid>,
    at: DateTime<Utc>,
  ) -> Result<Chat> {
    let mut members = participants;
    members.push(creator);
    members.sort();
    members.dedup();
    if members.len() < 2 {
      return Err(
        CoreError::InvalidInput("a chat needs at least one other participant".to_owned())
          .into(),
      );
    }

    let chat = Chat {
      chat_id:      Uuid::new_v4(),
      participants: members,
      created_at:   stored_dt(at),
    };

    let chat_str    = encode_uuid(chat.chat_id);
    let member_strs = chat.participants.iter().copied().map(encode_uuid).collect::<Vec<_>>();
    let at_str      = encode_dt(at);

    let missing: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for m in &member_strs {
          let exists = tx
            .query_row(
              "SELECT 1 FROM users WHERE user_id = ?1",
              rusqlite::params![m],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !exists {
            return Ok(Some(m.clone()));
          }
        }
        tx.execute(
          "INSERT INTO chats (chat_id, created_at) VALUES (?1, ?2)",
          rusqlite::params![chat_str, at_str],
        )?;
        for m in &member_strs {
          tx.execute(
            "INSERT INTO chat_participants (chat_id, user_id) VALUES (?1, ?2)",
            rusqlite::params![chat_str, m],
          )?;
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    if let Some(user) = missing {
      return Err(CoreError::not_found(EntityKind::User, user).into());
    }
    Ok(chat)
  }

  async fn get_chat(&self, id: Uuid) -> Result<Option<Chat>> {
    let chat_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(load_chat(conn, &chat_str)?))
      .await?;

    raw.map(RawChat::into_chat).transpose()
  }

  async fn list_chats(&self, user_id: Uuid) -> Result<Vec<Chat>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawChat> = self
      .conn
      .call(move |conn| {
        let ids = {
          let mut stmt = conn.prepare(
            "SELECT c.chat_id
             FROM chats c
             JOIN chat_participants p ON p.chat_id = c.chat_id
             WHERE p.user_id = ?1
             ORDER BY c.created_at DESC",
          )?;
          stmt
            .query_map(rusqlite::params![user_str], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?
        };
        let mut chats = Vec::with_capacity(ids.len());
        for id in ids {
          if let Some(chat) = load_chat(conn, &id)? {
            chats.push(chat);
          }
        }
        Ok(chats)
      })
      .await?;

    raws.into_iter().map(RawChat::into_chat).collect()
  }

  async fn send_message(
    &self,
    chat_id: Uuid,
    sender: ActorContext,
    body: String,
    at: DateTime<Utc>,
  ) -> Result<ChatMessage> {
    if body.trim().is_empty() {
      return Err(CoreError::InvalidInput("message must not be empty".to_owned()).into());
    }

    let message_id  = Uuid::new_v4();
    let message_str = encode_uuid(message_id);
    let chat_str    = encode_uuid(chat_id);
    let sender_str  = encode_uuid(sender.id);
    let at_str      = encode_dt(at);

    let (access, seq) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Posting requires real membership, even for admins.
        let access = chat_access(&tx, &chat_str, &sender_str, false)?;
        if access != ChatAccess::Granted {
          return Ok((access, 0));
        }
        let seq: i64 = tx.query_row(
          "SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE chat_id = ?1",
          rusqlite::params![chat_str],
          |row| row.get(0),
        )?;
        tx.execute(
          "INSERT INTO messages (message_id, chat_id, sender_id, body, sent_at, seq)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![message_str, chat_str, sender_str, body, at_str, seq],
        )?;
        tx.commit()?;
        Ok((access, seq))
      })
      .await?;

    access.into_result(chat_id)?;
    self
      .get_message(message_id)
      .await?
      .filter(|m| m.seq == seq)
      .ok_or_else(|| message_missing(message_id))
  }

  async fn list_messages(&self, chat_id: Uuid, actor: ActorContext) -> Result<Vec<ChatMessage>> {
    let chat_str  = encode_uuid(chat_id);
    let actor_str = encode_uuid(actor.id);
    let is_admin  = actor.is_admin();

    let (access, raws) = self
      .conn
      .call(move |conn| {
        let access = chat_access(conn, &chat_str, &actor_str, is_admin)?;
        if access != ChatAccess::Granted {
          return Ok((access, Vec::new()));
        }
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages m
           WHERE m.chat_id = ?1 AND m.is_deleted = 0
           ORDER BY m.seq"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![chat_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((access, rows))
      })
      .await?;

    access.into_result(chat_id)?;
    raws.into_iter().map(RawMessage::into_message).collect()
  }

  async fn delete_message(
    &self,
    message_id: Uuid,
    actor: ActorContext,
    authority: Authority,
    at: DateTime<Utc>,
  ) -> Result<DeletedMessage> {
    authority.admit(&actor)?;

    let deletion    = Deletion::begin(actor.id, at);
    let token       = Uuid::new_v4().simple().to_string();
    let message_str = encode_uuid(message_id);
    let actor_str   = encode_uuid(actor.id);
    let at_str      = encode_dt(deletion.deleted_at);
    let until_str   = encode_dt(deletion.restore_available_until);
    let any_sender  = authority.is_moderator();
    let audit       = authority
      .is_moderator()
      .then(|| PendingActivity::new(actor.id, Action::MessageDeleted, message_id, at));

    let (applied, raw) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE messages
           SET is_deleted = 1, deleted_at = ?2, deleted_by = ?3,
               restore_available_until = ?4, restoration_token = ?5
           WHERE message_id = ?1
             AND is_deleted = 0
             AND (?6 OR sender_id = ?3)",
          rusqlite::params![message_str, at_str, actor_str, until_str, token, any_sender],
        )?;
        if n == 1
          && let Some(audit) = &audit
        {
          audit.insert(&tx)?;
        }
        let raw = select_message(&tx, &message_str)?;
        tx.commit()?;
        Ok((n == 1, raw))
      })
      .await?;

    let raw = raw.ok_or_else(|| message_missing(message_id))?;

    if !applied {
      let message = raw.into_message()?;
      message.lifecycle.check_delete(EntityKind::Message, message_id)?;
      return Err(
        CoreError::forbidden(format!("message {message_id} was sent by another user")).into(),
      );
    }

    tracing::info!(message_id = %message_id, actor = %actor.id, "message soft-deleted");
    raw.into_deleted()
  }

  async fn restore_message(
    &self,
    restoration_token: String,
    actor: ActorContext,
    authority: Authority,
    at: DateTime<Utc>,
  ) -> Result<ChatMessage> {
    authority.admit(&actor)?;

    let actor_str   = encode_uuid(actor.id);
    let now_str     = encode_dt(at);
    let is_admin    = actor.is_admin();
    let any_deleter = authority.is_moderator();
    let mut audit = PendingActivity::new(actor.id, Action::MessageRestored, Uuid::nil(), at);

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let target: Option<(String, String)> = tx
          .query_row(
            "SELECT message_id, chat_id FROM messages WHERE restoration_token = ?1",
            rusqlite::params![restoration_token],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;
        let Some((message_str, chat_str)) = target else {
          return Ok(None);
        };
        audit.target_id = message_str.clone();

        let allowed = is_admin || is_participant(&tx, &chat_str, &actor_str)?;
        let n = if allowed {
          tx.execute(
            "UPDATE messages
             SET is_deleted = 0, deleted_at = NULL, deleted_by = NULL,
                 restore_available_until = NULL, restoration_token = NULL
             WHERE message_id = ?1
               AND restoration_token = ?2
               AND is_deleted = 1
               AND restore_available_until > ?3
               AND (?5 OR deleted_by = ?4)",
            rusqlite::params![message_str, restoration_token, now_str, actor_str, any_deleter],
          )?
        } else {
          0
        };
        let raw = select_message(&tx, &message_str)?;
        // Restoring someone else's message undoes a moderator deletion.
        if n == 1
          && let Some(raw) = &raw
          && (any_deleter || raw.sender_id != actor_str)
        {
          audit.insert(&tx)?;
        }
        tx.commit()?;
        Ok(Some((n == 1, allowed, raw)))
      })
      .await?;

    let (applied, allowed, raw) = found.ok_or_else(|| message_missing("restoration token"))?;
    let message = raw
      .ok_or_else(|| message_missing("restoration token"))?
      .into_message()?;

    if !applied {
      if !allowed {
        return Err(
          CoreError::forbidden(format!(
            "no longer a participant of chat {}",
            message.chat_id
          ))
          .into(),
        );
      }
      message.lifecycle.check_restore(
        EntityKind::Message,
        message.message_id,
        &actor,
        authority,
        at,
      )?;
      return Err(CoreError::NotDeleted(EntityKind::Message, message.message_id.to_string()).into());
    }

    tracing::info!(message_id = %message.message_id, actor = %actor.id, "message restored");
    Ok(message)
  }

  async fn list_deleted_messages(&self, deleted_by: Uuid) -> Result<Vec<DeletedMessage>> {
    let by_str = encode_uuid(deleted_by);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages m
           WHERE m.is_deleted = 1
             AND m.deleted_by = ?1
             AND m.restoration_token IS NOT NULL
           ORDER BY m.deleted_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![by_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_deleted).collect()
  }

  async fn purge_message(
    &self,
    message_id: Uuid,
    actor: ActorContext,
    at: DateTime<Utc>,
  ) -> Result<()> {
    actor.require(Role::SuperAdmin)?;

    let message_str = encode_uuid(message_id);
    let audit       = PendingActivity::new(actor.id, Action::MessagePurged, message_id, at);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "DELETE FROM messages WHERE message_id = ?1",
          rusqlite::params![message_str],
        )?;
        if n == 1 {
          audit.insert(&tx)?;
        }
        tx.commit()?;
        Ok(n == 1)
      })
      .await?;

    if !removed {
      return Err(message_missing(message_id));
    }
    tracing::warn!(message_id = %message_id, actor = %actor.id, "message permanently purged");
    Ok(())
  }

  async fn get_message(&self, id: Uuid) -> Result<Option<ChatMessage>> {
    let message_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_message(conn, &message_str)?))
      .await?;

    raw.map(RawMessage::into_message).transpose()
  }
}
