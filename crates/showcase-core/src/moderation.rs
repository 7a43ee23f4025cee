//! Reports filed by users and the admin audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Reports ─────────────────────────────────────────────────────────────────

/// What a report is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReportTarget {
  Project(Uuid),
  User(Uuid),
  Message(Uuid),
}

impl ReportTarget {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Project(_) => "project",
      Self::User(_) => "user",
      Self::Message(_) => "message",
    }
  }

  pub fn id(&self) -> Uuid {
    match self {
      Self::Project(id) | Self::User(id) | Self::Message(id) => *id,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
  #[default]
  Open,
  Resolved,
  Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub report_id:       Uuid,
  pub reporter_id:     Uuid,
  pub target:          ReportTarget,
  pub reason:          String,
  pub status:          ReportStatus,
  pub resolved_by:     Option<Uuid>,
  pub resolution_note: Option<String>,
  pub created_at:      DateTime<Utc>,
  pub resolved_at:     Option<DateTime<Utc>>,
}

/// Input to [`crate::store::ModerationStore::file_report`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
  pub target: ReportTarget,
  pub reason: String,
}

// ─── Audit log ───────────────────────────────────────────────────────────────

/// Actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  ProjectDeleted,
  ProjectRestored,
  ProjectPurged,
  MessageDeleted,
  MessageRestored,
  MessagePurged,
  ReportResolved,
  RoleChanged,
}

impl Action {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::ProjectDeleted => "project_deleted",
      Self::ProjectRestored => "project_restored",
      Self::ProjectPurged => "project_purged",
      Self::MessageDeleted => "message_deleted",
      Self::MessageRestored => "message_restored",
      Self::MessagePurged => "message_purged",
      Self::ReportResolved => "report_resolved",
      Self::RoleChanged => "role_changed",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Some(match s {
      "project_deleted" => Self::ProjectDeleted,
      "project_restored" => Self::ProjectRestored,
      "project_purged" => Self::ProjectPurged,
      "message_deleted" => Self::MessageDeleted,
      "message_restored" => Self::MessageRestored,
      "message_purged" => Self::MessagePurged,
      "report_resolved" => Self::ReportResolved,
      "role_changed" => Self::RoleChanged,
      _ => return None,
    })
  }
}

/// One row of the append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub activity_id: Uuid,
  pub actor_id:    Uuid,
  pub action:      Action,
  pub target_id:   Uuid,
  pub detail:      Option<String>,
  pub recorded_at: DateTime<Utc>,
}
