//! [`ModerationStore`] for [`SqliteStore`]: reports, the audit log, roles.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use showcase_core::{
  ActorContext, EntityKind, Error as CoreError, Role,
  moderation::{Action, ActivityEntry, NewReport, Report, ReportStatus, ReportTarget},
  store::ModerationStore,
  user::User,
};
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{
    RawActivity, RawReport, RawUser, REPORT_COLUMNS, USER_COLUMNS, encode_dt,
    encode_report_status, encode_role, encode_uuid, stored_dt,
  },
  store::PendingActivity,
};

fn target_exists(conn: &rusqlite::Connection, target: ReportTarget) -> rusqlite::Result<bool> {
  let sql = match target {
    ReportTarget::Project(_) => "SELECT 1 FROM projects WHERE project_id = ?1",
    ReportTarget::User(_) => "SELECT 1 FROM users WHERE user_id = ?1",
    ReportTarget::Message(_) => "SELECT 1 FROM messages WHERE message_id = ?1",
  };
  Ok(
    conn
      .query_row(sql, rusqlite::params![encode_uuid(target.id())], |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

fn select_report(
  conn: &rusqlite::Connection,
  report_str: &str,
) -> rusqlite::Result<Option<RawReport>> {
  conn
    .query_row(
      &format!("SELECT {REPORT_COLUMNS} FROM reports r WHERE r.report_id = ?1"),
      rusqlite::params![report_str],
      RawReport::from_row,
    )
    .optional()
}

impl ModerationStore for SqliteStore {
  async fn file_report(
    &self,
    reporter_id: Uuid,
    input: NewReport,
    at: DateTime<Utc>,
  ) -> Result<Report> {
    let reason = input.reason.trim().to_owned();
    if reason.is_empty() {
      return Err(CoreError::InvalidInput("a report needs a reason".to_owned()).into());
    }

    let report = Report {
      report_id:       Uuid::new_v4(),
      reporter_id,
      target:          input.target,
      reason,
      status:          ReportStatus::Open,
      resolved_by:     None,
      resolution_note: None,
      created_at:      stored_dt(at),
      resolved_at:     None,
    };

    let target       = report.target;
    let report_str   = encode_uuid(report.report_id);
    let reporter_str = encode_uuid(reporter_id);
    let reason       = report.reason.clone();
    let at_str       = encode_dt(at);

    let filed = self
      .conn
      .call(move |conn| {
        if !target_exists(conn, target)? {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO reports (report_id, reporter_id, target_kind, target_id, reason, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, 'open', ?6)",
          rusqlite::params![
            report_str,
            reporter_str,
            target.kind(),
            encode_uuid(target.id()),
            reason,
            at_str,
          ],
        )?;
        Ok(true)
      })
      .await?;

    if !filed {
      let kind = match target {
        ReportTarget::Project(_) => EntityKind::Project,
        ReportTarget::User(_) => EntityKind::User,
        ReportTarget::Message(_) => EntityKind::Message,
      };
      return Err(CoreError::not_found(kind, target.id()).into());
    }
    tracing::info!(report_id = %report.report_id, target = target.kind(), "report filed");
    Ok(report)
  }

  async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
    let status_str = status.map(encode_report_status);

    let raws: Vec<RawReport> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REPORT_COLUMNS} FROM reports r
           WHERE (?1 IS NULL OR r.status = ?1)
           ORDER BY r.created_at DESC, r.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status_str], RawReport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReport::into_report).collect()
  }

  async fn resolve_report(
    &self,
    report_id: Uuid,
    actor: ActorContext,
    status: ReportStatus,
    note: Option<String>,
    at: DateTime<Utc>,
  ) -> Result<Report> {
    actor.require(Role::Admin)?;
    if status == ReportStatus::Open {
      return Err(
        CoreError::InvalidInput("a report cannot be resolved back to open".to_owned()).into(),
      );
    }

    let report_str = encode_uuid(report_id);
    let actor_str  = encode_uuid(actor.id);
    let status_str = encode_report_status(status);
    let at_str     = encode_dt(at);
    let audit      = PendingActivity::new(actor.id, Action::ReportResolved, report_id, at)
      .with_detail(status_str);

    let (applied, raw) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE reports
           SET status = ?2, resolved_by = ?3, resolution_note = ?4, resolved_at = ?5
           WHERE report_id = ?1 AND status = 'open'",
          rusqlite::params![report_str, status_str, actor_str, note, at_str],
        )?;
        if n == 1 {
          audit.insert(&tx)?;
        }
        let raw = select_report(&tx, &report_str)?;
        tx.commit()?;
        Ok((n == 1, raw))
      })
      .await?;

    let raw = raw.ok_or_else(|| CoreError::not_found(EntityKind::Report, report_id))?;
    if !applied {
      return Err(CoreError::Conflict(format!("report {report_id} is already closed")).into());
    }
    tracing::info!(report_id = %report_id, status = status_str, actor = %actor.id, "report resolved");
    raw.into_report()
  }

  async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT activity_id, actor_id, action, target_id, detail, recorded_at
           FROM activity
           ORDER BY recorded_at DESC, rowid DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], RawActivity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_entry).collect()
  }

  async fn set_role(
    &self,
    user_id: Uuid,
    role: Role,
    actor: ActorContext,
    at: DateTime<Utc>,
  ) -> Result<User> {
    actor.require(Role::SuperAdmin)?;
    if user_id == actor.id && role != Role::SuperAdmin {
      return Err(CoreError::InvalidInput("cannot demote yourself".to_owned()).into());
    }

    let user_str = encode_uuid(user_id);
    let role_str = encode_role(role);
    let audit    =
      PendingActivity::new(actor.id, Action::RoleChanged, user_id, at).with_detail(role_str);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE users SET role = ?2 WHERE user_id = ?1",
          rusqlite::params![user_str, role_str],
        )?;
        if n == 0 {
          return Ok(None);
        }
        audit.insert(&tx)?;
        let raw = tx
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
            rusqlite::params![user_str],
            RawUser::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    let user = raw
      .ok_or_else(|| CoreError::not_found(EntityKind::User, user_id))?
      .into_user()?;
    tracing::info!(user_id = %user_id, role = role_str, actor = %actor.id, "role changed");
    Ok(user)
  }
}
