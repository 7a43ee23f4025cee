//! Projects and the engagement around them (likes, shares, comments).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::EntityKind,
  lifecycle::{Lifecycle, SoftDeletable},
};

/// A project shared by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
  pub project_id:  Uuid,
  pub owner_id:    Uuid,
  pub title:       String,
  pub description: String,
  pub repo_url:    Option<String>,
  pub tags:        Vec<String>,
  pub created_at:  DateTime<Utc>,
  pub like_count:  u64,
  pub share_count: u64,
  #[serde(flatten)]
  pub lifecycle:   Lifecycle,
}

impl SoftDeletable for Project {
  const KIND: EntityKind = EntityKind::Project;

  fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }
}

/// Input to [`crate::store::ProjectStore::create_project`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
  pub title:       String,
  #[serde(default)]
  pub description: String,
  pub repo_url:    Option<String>,
  #[serde(default)]
  pub tags:        Vec<String>,
}

/// Parameters for [`crate::store::ProjectStore::list_projects`]. Only live
/// projects are ever returned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectQuery {
  pub owner_id: Option<Uuid>,
  /// Exact tag match.
  pub tag:      Option<String>,
  /// Substring match over title and description.
  pub text:     Option<String>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// A comment on a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub project_id: Uuid,
  pub author_id:  Uuid,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}
