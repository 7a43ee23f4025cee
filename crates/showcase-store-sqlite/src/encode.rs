//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that string comparison in SQL orders them correctly. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use showcase_core::{
  Role,
  chat::{Chat, ChatMessage, DeletedMessage},
  lifecycle::{Deletion, Lifecycle},
  moderation::{Action, ActivityEntry, Report, ReportStatus, ReportTarget},
  project::{Comment, Project},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// `dt` cut to the precision [`encode_dt`] keeps. Values built from a write's
/// timestamp go through this so they equal what a later read returns.
pub fn stored_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::User => "user",
    Role::Admin => "admin",
    Role::SuperAdmin => "super_admin",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "user" => Ok(Role::User),
    "admin" => Ok(Role::Admin),
    "super_admin" => Ok(Role::SuperAdmin),
    other => Err(Error::Decode(format!("unknown role: {other:?}"))),
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Reports ─────────────────────────────────────────────────────────────────

pub fn encode_report_status(s: ReportStatus) -> &'static str {
  match s {
    ReportStatus::Open => "open",
    ReportStatus::Resolved => "resolved",
    ReportStatus::Dismissed => "dismissed",
  }
}

pub fn decode_report_status(s: &str) -> Result<ReportStatus> {
  match s {
    "open" => Ok(ReportStatus::Open),
    "resolved" => Ok(ReportStatus::Resolved),
    "dismissed" => Ok(ReportStatus::Dismissed),
    other => Err(Error::Decode(format!("unknown report status: {other:?}"))),
  }
}

pub fn decode_report_target(kind: &str, id: &str) -> Result<ReportTarget> {
  let id = decode_uuid(id)?;
  match kind {
    "project" => Ok(ReportTarget::Project(id)),
    "user" => Ok(ReportTarget::User(id)),
    "message" => Ok(ReportTarget::Message(id)),
    other => Err(Error::Decode(format!("unknown report target: {other:?}"))),
  }
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// The four soft-delete columns, as read.
pub struct RawLifecycle {
  pub is_deleted:              bool,
  pub deleted_at:              Option<String>,
  pub deleted_by:              Option<String>,
  pub restore_available_until: Option<String>,
}

impl RawLifecycle {
  /// Read the four columns starting at index `start`.
  pub fn from_row(row: &rusqlite::Row<'_>, start: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      is_deleted:              row.get(start)?,
      deleted_at:              row.get(start + 1)?,
      deleted_by:              row.get(start + 2)?,
      restore_available_until: row.get(start + 3)?,
    })
  }

  pub fn into_lifecycle(self) -> Result<Lifecycle> {
    match (
      self.is_deleted,
      self.deleted_at,
      self.deleted_by,
      self.restore_available_until,
    ) {
      (false, None, None, None) => Ok(Lifecycle::Active),
      (true, Some(at), Some(by), Some(until)) => Ok(Lifecycle::Deleted(Deletion {
        deleted_at:              decode_dt(&at)?,
        deleted_by:              decode_uuid(&by)?,
        restore_available_until: decode_dt(&until)?,
      })),
      _ => Err(Error::Decode("inconsistent soft-delete columns".to_owned())),
    }
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str =
  "u.user_id, u.username, u.display_name, u.bio, u.role, u.created_at";

pub struct RawUser {
  pub user_id:      String,
  pub username:     String,
  pub display_name: String,
  pub bio:          Option<String>,
  pub role:         String,
  pub created_at:   String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:      row.get(0)?,
      username:     row.get(1)?,
      display_name: row.get(2)?,
      bio:          row.get(3)?,
      role:         row.get(4)?,
      created_at:   row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:      decode_uuid(&self.user_id)?,
      username:     self.username,
      display_name: self.display_name,
      bio:          self.bio,
      role:         decode_role(&self.role)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawProject::from_row`]. Like and share counts are
/// computed, not stored.
pub const PROJECT_COLUMNS: &str = "
  p.project_id, p.owner_id, p.title, p.description, p.repo_url, p.tags,
  p.created_at,
  (SELECT COUNT(*) FROM likes  l WHERE l.project_id = p.project_id),
  (SELECT COUNT(*) FROM shares s WHERE s.project_id = p.project_id),
  p.is_deleted, p.deleted_at, p.deleted_by, p.restore_available_until";

pub struct RawProject {
  pub project_id:  String,
  pub owner_id:    String,
  pub title:       String,
  pub description: String,
  pub repo_url:    Option<String>,
  pub tags:        String,
  pub created_at:  String,
  pub like_count:  i64,
  pub share_count: i64,
  pub lifecycle:   RawLifecycle,
}

impl RawProject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      project_id:  row.get(0)?,
      owner_id:    row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      repo_url:    row.get(4)?,
      tags:        row.get(5)?,
      created_at:  row.get(6)?,
      like_count:  row.get(7)?,
      share_count: row.get(8)?,
      lifecycle:   RawLifecycle::from_row(row, 9)?,
    })
  }

  pub fn into_project(self) -> Result<Project> {
    Ok(Project {
      project_id:  decode_uuid(&self.project_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      title:       self.title,
      description: self.description,
      repo_url:    self.repo_url,
      tags:        decode_tags(&self.tags)?,
      created_at:  decode_dt(&self.created_at)?,
      like_count:  decode_count(self.like_count),
      share_count: decode_count(self.share_count),
      lifecycle:   self.lifecycle.into_lifecycle()?,
    })
  }
}

pub const COMMENT_COLUMNS: &str =
  "c.comment_id, c.project_id, c.author_id, c.body, c.created_at";

pub struct RawComment {
  pub comment_id: String,
  pub project_id: String,
  pub author_id:  String,
  pub body:       String,
  pub created_at: String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      project_id: row.get(1)?,
      author_id:  row.get(2)?,
      body:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      project_id: decode_uuid(&self.project_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      body:       self.body,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// A chat row plus its participant ids.
pub struct RawChat {
  pub chat_id:      String,
  pub created_at:   String,
  pub participants: Vec<String>,
}

impl RawChat {
  pub fn into_chat(self) -> Result<Chat> {
    Ok(Chat {
      chat_id:      decode_uuid(&self.chat_id)?,
      participants: self
        .participants
        .iter()
        .map(|p| decode_uuid(p))
        .collect::<Result<_>>()?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawMessage::from_row`].
pub const MESSAGE_COLUMNS: &str = "
  m.message_id, m.chat_id, m.sender_id, m.body, m.sent_at, m.seq,
  m.is_deleted, m.deleted_at, m.deleted_by, m.restore_available_until,
  m.restoration_token";

pub struct RawMessage {
  pub message_id:        String,
  pub chat_id:           String,
  pub sender_id:         String,
  pub body:              String,
  pub sent_at:           String,
  pub seq:               i64,
  pub lifecycle:         RawLifecycle,
  pub restoration_token: Option<String>,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:        row.get(0)?,
      chat_id:           row.get(1)?,
      sender_id:         row.get(2)?,
      body:              row.get(3)?,
      sent_at:           row.get(4)?,
      seq:               row.get(5)?,
      lifecycle:         RawLifecycle::from_row(row, 6)?,
      restoration_token: row.get(10)?,
    })
  }

  pub fn into_message(self) -> Result<ChatMessage> {
    Ok(self.into_parts()?.0)
  }

  /// The message plus its restoration token, if it has one.
  pub fn into_parts(self) -> Result<(ChatMessage, Option<String>)> {
    let message = ChatMessage {
      message_id: decode_uuid(&self.message_id)?,
      chat_id:    decode_uuid(&self.chat_id)?,
      sender_id:  decode_uuid(&self.sender_id)?,
      body:       self.body,
      sent_at:    decode_dt(&self.sent_at)?,
      seq:        self.seq,
      lifecycle:  self.lifecycle.into_lifecycle()?,
    };
    Ok((message, self.restoration_token))
  }

  /// Snapshot view of a deleted message. Fails on live messages.
  pub fn into_deleted(self) -> Result<DeletedMessage> {
    let (message, token) = self.into_parts()?;
    let deletion = message
      .lifecycle
      .deletion()
      .ok_or_else(|| Error::Decode("message is not deleted".to_owned()))?;
    let token = token
      .ok_or_else(|| Error::Decode("deleted message has no restoration token".to_owned()))?;
    Ok(DeletedMessage::from_parts(&message, deletion, token))
  }
}

pub const REPORT_COLUMNS: &str = "
  r.report_id, r.reporter_id, r.target_kind, r.target_id, r.reason, r.status,
  r.resolved_by, r.resolution_note, r.created_at, r.resolved_at";

pub struct RawReport {
  pub report_id:       String,
  pub reporter_id:     String,
  pub target_kind:     String,
  pub target_id:       String,
  pub reason:          String,
  pub status:          String,
  pub resolved_by:     Option<String>,
  pub resolution_note: Option<String>,
  pub created_at:      String,
  pub resolved_at:     Option<String>,
}

impl RawReport {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      report_id:       row.get(0)?,
      reporter_id:     row.get(1)?,
      target_kind:     row.get(2)?,
      target_id:       row.get(3)?,
      reason:          row.get(4)?,
      status:          row.get(5)?,
      resolved_by:     row.get(6)?,
      resolution_note: row.get(7)?,
      created_at:      row.get(8)?,
      resolved_at:     row.get(9)?,
    })
  }

  pub fn into_report(self) -> Result<Report> {
    Ok(Report {
      report_id:       decode_uuid(&self.report_id)?,
      reporter_id:     decode_uuid(&self.reporter_id)?,
      target:          decode_report_target(&self.target_kind, &self.target_id)?,
      reason:          self.reason,
      status:          decode_report_status(&self.status)?,
      resolved_by:     decode_opt_uuid(self.resolved_by)?,
      resolution_note: self.resolution_note,
      created_at:      decode_dt(&self.created_at)?,
      resolved_at:     decode_opt_dt(self.resolved_at)?,
    })
  }
}

pub struct RawActivity {
  pub activity_id: String,
  pub actor_id:    String,
  pub action:      String,
  pub target_id:   String,
  pub detail:      Option<String>,
  pub recorded_at: String,
}

impl RawActivity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      activity_id: row.get(0)?,
      actor_id:    row.get(1)?,
      action:      row.get(2)?,
      target_id:   row.get(3)?,
      detail:      row.get(4)?,
      recorded_at: row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<ActivityEntry> {
    Ok(ActivityEntry {
      activity_id: decode_uuid(&self.activity_id)?,
      actor_id:    decode_uuid(&self.actor_id)?,
      action:      Action::parse(&self.action)
        .ok_or_else(|| Error::Decode(format!("unknown action: {:?}", self.action)))?,
      target_id:   decode_uuid(&self.target_id)?,
      detail:      self.detail,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, TimeZone};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + TimeDelta::microseconds(1);
    let c = a + TimeDelta::hours(24);
    assert!(encode_dt(a) < encode_dt(b));
    assert!(encode_dt(b) < encode_dt(c));
    assert_eq!(encode_dt(a).len(), encode_dt(b).len());
  }

  #[test]
  fn timestamps_round_trip() {
    let a = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();
    assert_eq!(decode_dt(&encode_dt(a)).unwrap(), a);
  }

  #[test]
  fn partial_lifecycle_columns_are_rejected() {
    let raw = RawLifecycle {
      is_deleted:              true,
      deleted_at:              Some(encode_dt(Utc::now())),
      deleted_by:              None,
      restore_available_until: None,
    };
    assert!(matches!(raw.into_lifecycle(), Err(Error::Decode(_))));
  }
}
