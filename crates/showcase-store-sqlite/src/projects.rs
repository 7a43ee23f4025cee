//! [`ProjectStore`] for [`SqliteStore`]: projects, likes, shares, comments,
//! and the soft-delete lifecycle.
//!
//! Delete and restore are each one conditional `UPDATE`; the row is read back
//! in the same transaction, and only when the update matched nothing is the
//! row inspected to explain why.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use showcase_core::{
  ActorContext, Authority, EntityKind, Error as CoreError, Role,
  lifecycle::Deletion,
  moderation::Action,
  project::{Comment, NewProject, Project, ProjectQuery},
  store::ProjectStore,
};
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{
    COMMENT_COLUMNS, PROJECT_COLUMNS, RawComment, RawProject, encode_dt, encode_tags,
    encode_uuid, stored_dt,
  },
  store::PendingActivity,
};

const DEFAULT_PAGE: usize = 50;

/// Read one project row, deleted or not.
fn select_project(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawProject>> {
  conn
    .query_row(
      &format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.project_id = ?1"),
      rusqlite::params![id_str],
      RawProject::from_row,
    )
    .optional()
}

/// `Some(is_deleted)` if the project exists.
fn project_state(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<bool>> {
  conn
    .query_row(
      "SELECT is_deleted FROM projects WHERE project_id = ?1",
      rusqlite::params![id_str],
      |row| row.get(0),
    )
    .optional()
}

fn live_project_missing(id: Uuid) -> Error {
  CoreError::not_found(EntityKind::Project, id).into()
}

impl SqliteStore {
  async fn count_for_live_project(
    &self,
    id: Uuid,
    write: impl FnOnce(&rusqlite::Connection) -> rusqlite::Result<()> + Send + 'static,
    count_sql: &'static str,
  ) -> Result<u64> {
    let id_str = encode_uuid(id);

    let count: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if project_state(&tx, &id_str)? != Some(false) {
          return Ok(None);
        }
        write(&tx)?;
        let n: i64 = tx.query_row(count_sql, rusqlite::params![id_str], |r| r.get(0))?;
        tx.commit()?;
        Ok(Some(n))
      })
      .await?;

    count
      .map(|n| u64::try_from(n).unwrap_or(0))
      .ok_or_else(|| live_project_missing(id))
  }
}

impl ProjectStore for SqliteStore {
  async fn create_project(
    &self,
    owner_id: Uuid,
    input: NewProject,
    at: DateTime<Utc>,
  ) -> Result<Project> {
    if input.title.trim().is_empty() {
      return Err(CoreError::InvalidInput("title must not be empty".to_owned()).into());
    }

    let project = Project {
      project_id:  Uuid::new_v4(),
      owner_id,
      title:       input.title,
      description: input.description,
      repo_url:    input.repo_url,
      tags:        input.tags,
      created_at:  stored_dt(at),
      like_count:  0,
      share_count: 0,
      lifecycle:   Default::default(),
    };

    let id_str      = encode_uuid(project.project_id);
    let owner_str   = encode_uuid(owner_id);
    let title       = project.title.clone();
    let description = project.description.clone();
    let repo_url    = project.repo_url.clone();
    let tags_str    = encode_tags(&project.tags)?;
    let at_str      = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO projects (project_id, owner_id, title, description, repo_url, tags, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, owner_str, title, description, repo_url, tags_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(project)
  }

  async fn get_project(&self, id: Uuid, include_deleted: bool) -> Result<Option<Project>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(select_project(conn, &id_str)?))
      .await?;

    let project = raw.map(RawProject::into_project).transpose()?;
    Ok(project.filter(|p| include_deleted || !p.lifecycle.is_deleted()))
  }

  async fn list_projects(&self, query: ProjectQuery) -> Result<Vec<Project>> {
    let owner_str    = query.owner_id.map(encode_uuid);
    let tag          = query.tag;
    let text_pattern = query.text.as_deref().map(|t| format!("%{t}%"));
    let limit_val    = query.limit.unwrap_or(DEFAULT_PAGE) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawProject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLUMNS}
           FROM projects p
           WHERE p.is_deleted = 0
             AND (?1 IS NULL OR p.owner_id = ?1)
             AND (?2 IS NULL OR EXISTS (
                   SELECT 1 FROM json_each(p.tags) t WHERE t.value = ?2))
             AND (?3 IS NULL OR p.title LIKE ?3 OR p.description LIKE ?3)
           ORDER BY p.created_at DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![owner_str, tag, text_pattern, limit_val, offset_val],
            RawProject::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  async fn list_deleted_projects(&self, deleted_by: Option<Uuid>) -> Result<Vec<Project>> {
    let by_str = deleted_by.map(encode_uuid);

    let raws: Vec<RawProject> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROJECT_COLUMNS}
           FROM projects p
           WHERE p.is_deleted = 1
             AND p.restore_available_until IS NOT NULL
             AND (?1 IS NULL OR p.deleted_by = ?1)
           ORDER BY p.deleted_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![by_str], RawProject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProject::into_project).collect()
  }

  async fn soft_delete_project(
    &self,
    id: Uuid,
    actor: ActorContext,
    authority: Authority,
    at: DateTime<Utc>,
  ) -> Result<Project> {
    authority.admit(&actor)?;

    let deletion     = Deletion::begin(actor.id, at);
    let id_str       = encode_uuid(id);
    let actor_str    = encode_uuid(actor.id);
    let at_str       = encode_dt(deletion.deleted_at);
    let until_str    = encode_dt(deletion.restore_available_until);
    let any_owner    = authority.is_moderator();
    let audit        = authority
      .is_moderator()
      .then(|| PendingActivity::new(actor.id, Action::ProjectDeleted, id, at));

    let (applied, raw) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE projects
           SET is_deleted = 1, deleted_at = ?2, deleted_by = ?3, restore_available_until = ?4
           WHERE project_id = ?1
             AND is_deleted = 0
             AND (?5 OR owner_id = ?3)",
          rusqlite::params![id_str, at_str, actor_str, until_str, any_owner],
        )?;
        if n == 1
          && let Some(audit) = &audit
        {
          audit.insert(&tx)?;
        }
        let raw = select_project(&tx, &id_str)?;
        tx.commit()?;
        Ok((n == 1, raw))
      })
      .await?;

    let project = raw
      .ok_or_else(|| live_project_missing(id))?
      .into_project()?;

    if !applied {
      project.lifecycle.check_delete(EntityKind::Project, id)?;
      return Err(
        CoreError::forbidden(format!("project {id} belongs to another user")).into(),
      );
    }

    tracing::info!(
      project_id = %id,
      actor = %actor.id,
      moderator = any_owner,
      "project soft-deleted"
    );
    Ok(project)
  }

  async fn restore_project(
    &self,
    id: Uuid,
    actor: ActorContext,
    authority: Authority,
    at: DateTime<Utc>,
  ) -> Result<Project> {
    authority.admit(&actor)?;

    let id_str    = encode_uuid(id);
    let actor_str = encode_uuid(actor.id);
    let now_str   = encode_dt(at);
    let any_actor = authority.is_moderator();
    let audit     = authority
      .is_moderator()
      .then(|| PendingActivity::new(actor.id, Action::ProjectRestored, id, at));

    let (applied, raw) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "UPDATE projects
           SET is_deleted = 0, deleted_at = NULL, deleted_by = NULL,
               restore_available_until = NULL
           WHERE project_id = ?1
             AND is_deleted = 1
             AND restore_available_until > ?2
             AND (?3 OR deleted_by = ?4)",
          rusqlite::params![id_str, now_str, any_actor, actor_str],
        )?;
        if n == 1
          && let Some(audit) = &audit
        {
          audit.insert(&tx)?;
        }
        let raw = select_project(&tx, &id_str)?;
        tx.commit()?;
        Ok((n == 1, raw))
      })
      .await?;

    let project = raw
      .ok_or_else(|| live_project_missing(id))?
      .into_project()?;

    if !applied {
      project
        .lifecycle
        .check_restore(EntityKind::Project, id, &actor, authority, at)?;
      return Err(CoreError::NotDeleted(EntityKind::Project, id.to_string()).into());
    }

    tracing::info!(project_id = %id, actor = %actor.id, "project restored");
    Ok(project)
  }

  async fn purge_project(&self, id: Uuid, actor: ActorContext, at: DateTime<Utc>) -> Result<()> {
    actor.require(Role::SuperAdmin)?;

    let id_str = encode_uuid(id);
    let audit  = PendingActivity::new(actor.id, Action::ProjectPurged, id, at);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for sql in [
          "DELETE FROM likes    WHERE project_id = ?1",
          "DELETE FROM shares   WHERE project_id = ?1",
          "DELETE FROM comments WHERE project_id = ?1",
        ] {
          tx.execute(sql, rusqlite::params![id_str])?;
        }
        let n = tx.execute(
          "DELETE FROM projects WHERE project_id = ?1",
          rusqlite::params![id_str],
        )?;
        if n == 1 {
          audit.insert(&tx)?;
        }
        tx.commit()?;
        Ok(n == 1)
      })
      .await?;

    if !removed {
      return Err(live_project_missing(id));
    }
    tracing::warn!(project_id = %id, actor = %actor.id, "project permanently purged");
    Ok(())
  }

  async fn like_project(&self, id: Uuid, user_id: Uuid, at: DateTime<Utc>) -> Result<u64> {
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(user_id);
    let at_str   = encode_dt(at);

    self
      .count_for_live_project(
        id,
        move |conn| {
          conn.execute(
            "INSERT OR IGNORE INTO likes (project_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![id_str, user_str, at_str],
          )?;
          Ok(())
        },
        "SELECT COUNT(*) FROM likes WHERE project_id = ?1",
      )
      .await
  }

  async fn unlike_project(&self, id: Uuid, user_id: Uuid) -> Result<u64> {
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(user_id);

    self
      .count_for_live_project(
        id,
        move |conn| {
          conn.execute(
            "DELETE FROM likes WHERE project_id = ?1 AND user_id = ?2",
            rusqlite::params![id_str, user_str],
          )?;
          Ok(())
        },
        "SELECT COUNT(*) FROM likes WHERE project_id = ?1",
      )
      .await
  }

  async fn share_project(&self, id: Uuid, user_id: Uuid, at: DateTime<Utc>) -> Result<u64> {
    let share_str = encode_uuid(Uuid::new_v4());
    let id_str    = encode_uuid(id);
    let user_str  = encode_uuid(user_id);
    let at_str    = encode_dt(at);

    self
      .count_for_live_project(
        id,
        move |conn| {
          conn.execute(
            "INSERT INTO shares (share_id, project_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![share_str, id_str, user_str, at_str],
          )?;
          Ok(())
        },
        "SELECT COUNT(*) FROM shares WHERE project_id = ?1",
      )
      .await
  }

  async fn add_comment(
    &self,
    project_id: Uuid,
    author_id: Uuid,
    body: String,
    at: DateTime<Utc>,
  ) -> Result<Comment> {
    if body.trim().is_empty() {
      return Err(CoreError::InvalidInput("comment must not be empty".to_owned()).into());
    }

    let comment = Comment {
      comment_id: Uuid::new_v4(),
      project_id,
      author_id,
      body,
      created_at: stored_dt(at),
    };

    let comment_str = encode_uuid(comment.comment_id);
    let project_str = encode_uuid(project_id);
    let author_str  = encode_uuid(author_id);
    let body        = comment.body.clone();
    let at_str      = encode_dt(at);

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO comments (comment_id, project_id, author_id, body, created_at)
           SELECT ?1, ?2, ?3, ?4, ?5
           WHERE EXISTS (SELECT 1 FROM projects WHERE project_id = ?2 AND is_deleted = 0)",
          rusqlite::params![comment_str, project_str, author_str, body, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    if !inserted {
      return Err(live_project_missing(project_id));
    }
    Ok(comment)
  }

  async fn list_comments(&self, project_id: Uuid) -> Result<Vec<Comment>> {
    let project_str = encode_uuid(project_id);

    let raws: Option<Vec<RawComment>> = self
      .conn
      .call(move |conn| {
        if project_state(conn, &project_str)? != Some(false) {
          return Ok(None);
        }
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments c
           WHERE c.project_id = ?1
           ORDER BY c.created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![project_str], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .ok_or_else(|| live_project_missing(project_id))?
      .into_iter()
      .map(RawComment::into_comment)
      .collect()
  }

  async fn delete_comment(&self, comment_id: Uuid, actor: ActorContext) -> Result<()> {
    let comment_str = encode_uuid(comment_id);
    let actor_str   = encode_uuid(actor.id);
    let is_admin    = actor.is_admin();

    let (exists, removed) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute(
          "DELETE FROM comments WHERE comment_id = ?1 AND (?2 OR author_id = ?3)",
          rusqlite::params![comment_str, is_admin, actor_str],
        )?;
        let exists = n == 1
          || tx
            .query_row(
              "SELECT 1 FROM comments WHERE comment_id = ?1",
              rusqlite::params![comment_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        tx.commit()?;
        Ok((exists, n == 1))
      })
      .await?;

    match (exists, removed) {
      (_, true) => Ok(()),
      (false, _) => Err(CoreError::not_found(EntityKind::Comment, comment_id).into()),
      (true, false) => Err(
        CoreError::forbidden(format!("comment {comment_id} belongs to another user")).into(),
      ),
    }
  }
}
