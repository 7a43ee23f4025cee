//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, TimeZone, Utc};
use showcase_core::{
  Error as CoreError, Role,
  project::{NewProject, Project},
  store::{ProjectStore, UserStore},
  user::{NewUser, User},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

mod moderation;
mod projects;
mod users;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A fixed starting instant so window arithmetic is exact.
fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

async fn user_with_role(s: &SqliteStore, username: &str, role: Role) -> User {
  s.add_user(
    NewUser {
      username:      username.into(),
      display_name:  username.to_uppercase(),
      bio:           None,
      password_hash: "$argon2id$test".into(),
      role,
    },
    t0(),
  )
  .await
  .unwrap()
}

async fn user(s: &SqliteStore, username: &str) -> User {
  user_with_role(s, username, Role::User).await
}

async fn project(s: &SqliteStore, owner: &User, title: &str) -> Project {
  s.create_project(
    owner.user_id,
    NewProject {
      title:       title.into(),
      description: format!("{title} description"),
      repo_url:    None,
      tags:        vec!["rust".into()],
    },
    t0(),
  )
  .await
  .unwrap()
}

fn core_err(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

#[tokio::test]
async fn close_then_use_fails() {
  let s = store().await;
  let other = s.clone();
  s.close().await.unwrap();
  assert!(other.get_user(Uuid::new_v4()).await.is_err());
}
