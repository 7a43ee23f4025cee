//! [`SqliteStore`]: connection handling and helpers shared by the
//! per-entity trait implementations.

use std::path::Path;

use chrono::{DateTime, Utc};
use showcase_core::{moderation::Action, store::Store};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Showcase store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All
/// statements run on the connection's own thread, one closure at a time, and
/// every multi-statement operation runs inside a transaction.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection. Further calls on any clone fail.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl Store for SqliteStore {
  type Error = Error;
}

// ─── Audit log ───────────────────────────────────────────────────────────────

/// An audit entry waiting to be written alongside the mutation it describes.
pub(crate) struct PendingActivity {
  pub actor_id:  String,
  pub action:    &'static str,
  pub target_id: String,
  pub detail:    Option<String>,
  pub at:        String,
}

impl PendingActivity {
  pub fn new(actor_id: Uuid, action: Action, target_id: Uuid, at: DateTime<Utc>) -> Self {
    Self {
      actor_id:  encode_uuid(actor_id),
      action:    action.as_str(),
      target_id: encode_uuid(target_id),
      detail:    None,
      at:        encode_dt(at),
    }
  }

  pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
    self.detail = Some(detail.into());
    self
  }

  /// Insert on `conn`, which is expected to be an open transaction.
  pub fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO activity (activity_id, actor_id, action, target_id, detail, recorded_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        self.actor_id,
        self.action,
        self.target_id,
        self.detail,
        self.at,
      ],
    )?;
    Ok(())
  }
}
