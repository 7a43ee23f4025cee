use chrono::TimeDelta;
use showcase_core::{
  Error as CoreError, Role,
  store::{ProjectStore, UserStore},
  user::{NewUser, Session},
};
use uuid::Uuid;

use super::{core_err, project, store, t0, user};

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let fetched = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!(fetched, alice);
  assert_eq!(fetched.role, Role::User);
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
  let s = store().await;
  user(&s, "alice").await;

  let err = s
    .add_user(
      NewUser {
        username:      "alice".into(),
        display_name:  "Other".into(),
        bio:           None,
        password_hash: "x".into(),
        role:          Role::User,
      },
      t0(),
    )
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Conflict(_)));
}

#[tokio::test]
async fn credentials_include_hash() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let (found, hash) = s.find_credentials("alice".into()).await.unwrap().unwrap();
  assert_eq!(found.user_id, alice.user_id);
  assert_eq!(hash, "$argon2id$test");
  assert!(s.find_credentials("nobody".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn sessions_resolve_until_expiry() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  s.open_session(Session {
    token_hash: "abc".into(),
    user_id:    alice.user_id,
    created_at: t0(),
    expires_at: t0() + TimeDelta::hours(1),
  })
  .await
  .unwrap();

  let actor = s.resolve_session("abc".into(), t0()).await.unwrap().unwrap();
  assert_eq!(actor.id, alice.user_id);
  assert_eq!(actor.role, Role::User);

  let expired = s
    .resolve_session("abc".into(), t0() + TimeDelta::hours(1))
    .await
    .unwrap();
  assert!(expired.is_none());

  s.close_session("abc".into()).await.unwrap();
  assert!(s.resolve_session("abc".into(), t0()).await.unwrap().is_none());
}

#[tokio::test]
async fn follow_is_idempotent_and_listed() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  s.follow(alice.user_id, bob.user_id, t0()).await.unwrap();
  s.follow(alice.user_id, bob.user_id, t0()).await.unwrap();

  let followers = s.list_followers(bob.user_id).await.unwrap();
  assert_eq!(followers.len(), 1);
  assert_eq!(followers[0].user_id, alice.user_id);

  let following = s.list_following(alice.user_id).await.unwrap();
  assert_eq!(following.len(), 1);
  assert_eq!(following[0].user_id, bob.user_id);

  s.unfollow(alice.user_id, bob.user_id).await.unwrap();
  s.unfollow(alice.user_id, bob.user_id).await.unwrap();
  assert!(s.list_followers(bob.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn follow_rejects_self_and_unknown() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s.follow(alice.user_id, alice.user_id, t0()).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::InvalidInput(_)));

  let err = s.follow(alice.user_id, Uuid::new_v4(), t0()).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));
}

#[tokio::test]
async fn profile_counts_only_live_projects() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  s.follow(bob.user_id, alice.user_id, t0()).await.unwrap();

  let p = project(&s, &alice, "One").await;
  project(&s, &alice, "Two").await;
  s.soft_delete_project(p.project_id, alice.actor(), showcase_core::Authority::Owner, t0())
    .await
    .unwrap();

  let profile = s.profile(alice.user_id).await.unwrap().unwrap();
  assert_eq!(profile.follower_count, 1);
  assert_eq!(profile.following_count, 0);
  assert_eq!(profile.project_count, 1);
}
