//! Users, sessions and the follow graph.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::{ActorContext, Role};

/// A registered account. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  pub username:     String,
  pub display_name: String,
  pub bio:          Option<String>,
  pub role:         Role,
  pub created_at:   DateTime<Utc>,
}

impl User {
  pub fn actor(&self) -> ActorContext { ActorContext::new(self.user_id, self.role) }
}

/// Input to [`crate::store::UserStore::add_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub display_name:  String,
  pub bio:           Option<String>,
  /// argon2 PHC string.
  pub password_hash: String,
  pub role:          Role,
}

/// A user with the counters shown on their profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
  #[serde(flatten)]
  pub user:            User,
  pub follower_count:  u64,
  pub following_count: u64,
  /// Projects that are not soft-deleted.
  pub project_count:   u64,
}

/// A bearer session. Only the SHA-256 of the token is persisted.
#[derive(Debug, Clone)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}
