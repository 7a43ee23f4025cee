//! Error types for `showcase-core`.

use thiserror::Error;

/// What kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
  User,
  Project,
  Comment,
  Chat,
  Message,
  Report,
}

impl std::fmt::Display for EntityKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::User => "user",
      Self::Project => "project",
      Self::Comment => "comment",
      Self::Chat => "chat",
      Self::Message => "message",
      Self::Report => "report",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} not found: {1}")]
  NotFound(EntityKind, String),

  #[error("{0} {1} is already deleted")]
  AlreadyDeleted(EntityKind, String),

  #[error("{0} {1} is not deleted")]
  NotDeleted(EntityKind, String),

  #[error("restore window for {0} {1} has expired")]
  WindowExpired(EntityKind, String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("invalid input: {0}")]
  InvalidInput(String),
}

impl Error {
  pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
    Self::NotFound(kind, id.to_string())
  }

  pub fn forbidden(message: impl Into<String>) -> Self {
    Self::Forbidden(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by storage backend errors so callers can recover the domain
/// error (if any) behind an opaque backend failure.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&Error> { Some(self) }
}
