use chrono::TimeDelta;
use showcase_core::{
  Authority, Error as CoreError, Role,
  lifecycle::Trashed,
  moderation::Action,
  project::{NewProject, ProjectQuery},
  store::{ModerationStore, ProjectStore, UserStore},
  user::NewUser,
};
use uuid::Uuid;

use super::{core_err, project, store, t0, user, user_with_role};

// ─── Soft delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn owner_soft_delete_sets_window() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let p = project(&s, &alice, "Demo").await;

  let deleted = s
    .soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  let deletion = deleted.lifecycle.deletion().unwrap();
  assert_eq!(deletion.deleted_at, t0());
  assert_eq!(deletion.deleted_by, alice.user_id);
  assert_eq!(deletion.restore_available_until, t0() + TimeDelta::hours(24));
}

#[tokio::test]
async fn deleting_twice_is_already_deleted() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let p = project(&s, &alice, "Demo").await;

  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();
  let err = s
    .soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::AlreadyDeleted(..)));
}

#[tokio::test]
async fn non_owner_cannot_delete() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let p = project(&s, &alice, "Demo").await;

  let err = s
    .soft_delete_project(p.project_id, bob.actor(), Authority::Owner, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));

  let still_live = s.get_project(p.project_id, false).await.unwrap();
  assert!(still_live.is_some());
}

#[tokio::test]
async fn deleting_unknown_project_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s
    .soft_delete_project(Uuid::new_v4(), alice.actor(), Authority::Owner, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));
}

#[tokio::test]
async fn moderator_path_requires_admin() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let p = project(&s, &alice, "Demo").await;

  let err = s
    .soft_delete_project(p.project_id, alice.actor(), Authority::Moderator, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));
}

// ─── Restore ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_then_restore_round_trips() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let p = project(&s, &alice, "Demo").await;
  s.like_project(p.project_id, bob.user_id, t0()).await.unwrap();
  s.add_comment(p.project_id, bob.user_id, "nice".into(), t0())
    .await
    .unwrap();
  let before = s.get_project(p.project_id, false).await.unwrap().unwrap();

  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();
  let restored = s
    .restore_project(
      p.project_id,
      alice.actor(),
      Authority::Owner,
      t0() + TimeDelta::minutes(5),
    )
    .await
    .unwrap();

  assert_eq!(restored, before);
  assert_eq!(s.list_comments(p.project_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn written_values_match_reads_at_sub_microsecond_times() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let at = t0() + TimeDelta::nanoseconds(123_456_789);

  let created = s
    .create_project(
      alice.user_id,
      NewProject {
        title:       "Precise".into(),
        description: String::new(),
        repo_url:    None,
        tags:        Vec::new(),
      },
      at,
    )
    .await
    .unwrap();
  assert_eq!(created.created_at, t0() + TimeDelta::microseconds(123_456));

  s.soft_delete_project(created.project_id, alice.actor(), Authority::Owner, at)
    .await
    .unwrap();
  let restored = s
    .restore_project(
      created.project_id,
      alice.actor(),
      Authority::Owner,
      at + TimeDelta::minutes(1),
    )
    .await
    .unwrap();
  assert_eq!(restored, created);

  let comment = s
    .add_comment(created.project_id, alice.user_id, "first".into(), at)
    .await
    .unwrap();
  assert_eq!(s.list_comments(created.project_id).await.unwrap(), vec![comment]);

  let carol = s
    .add_user(
      NewUser {
        username:      "carol".into(),
        display_name:  "Carol".into(),
        bio:           None,
        password_hash: "$argon2id$test".into(),
        role:          Role::User,
      },
      at,
    )
    .await
    .unwrap();
  assert_eq!(s.get_user(carol.user_id).await.unwrap(), Some(carol));
}

#[tokio::test]
async fn restore_after_window_expires() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let p = project(&s, &alice, "Demo").await;
  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  // The window is closed at exactly 24h.
  let err = s
    .restore_project(
      p.project_id,
      alice.actor(),
      Authority::Owner,
      t0() + TimeDelta::hours(24),
    )
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::WindowExpired(..)));

  let unchanged = s.get_project(p.project_id, true).await.unwrap().unwrap();
  assert!(unchanged.lifecycle.is_deleted());
}

#[tokio::test]
async fn restore_by_other_user_is_forbidden() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let p = project(&s, &alice, "Demo").await;
  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  let err = s
    .restore_project(p.project_id, bob.actor(), Authority::Owner, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));
}

#[tokio::test]
async fn forbidden_is_reported_before_expiry() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let p = project(&s, &alice, "Demo").await;
  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  let err = s
    .restore_project(
      p.project_id,
      bob.actor(),
      Authority::Owner,
      t0() + TimeDelta::hours(48),
    )
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));
}

#[tokio::test]
async fn restoring_live_project_is_not_deleted() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let p = project(&s, &alice, "Demo").await;

  let err = s
    .restore_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotDeleted(..)));
}

#[tokio::test]
async fn restore_just_inside_window_then_fresh_delete() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let p = project(&s, &alice, "Demo").await;

  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  let t_restore = t0() + TimeDelta::hours(23) + TimeDelta::minutes(59);
  s.restore_project(p.project_id, alice.actor(), Authority::Owner, t_restore)
    .await
    .unwrap();

  let t_again = t0() + TimeDelta::hours(24) + TimeDelta::minutes(1);
  let again = s
    .soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t_again)
    .await
    .unwrap();
  let deletion = again.lifecycle.deletion().unwrap();
  assert_eq!(deletion.deleted_at, t_again);
  assert_eq!(deletion.restore_available_until, t_again + TimeDelta::hours(24));
}

// ─── Moderator path & audit ──────────────────────────────────────────────────

#[tokio::test]
async fn admin_delete_logs_once_owner_delete_logs_nothing() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let admin = user_with_role(&s, "mod", Role::Admin).await;
  let own = project(&s, &alice, "Own").await;
  let moderated = project(&s, &alice, "Moderated").await;

  s.soft_delete_project(own.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();
  assert!(s.list_activity(10).await.unwrap().is_empty());

  s.soft_delete_project(moderated.project_id, admin.actor(), Authority::Moderator, t0())
    .await
    .unwrap();
  // A racing second attempt loses and must not log.
  let _ = s
    .soft_delete_project(moderated.project_id, admin.actor(), Authority::Moderator, t0())
    .await
    .unwrap_err();

  let log = s.list_activity(10).await.unwrap();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].action, Action::ProjectDeleted);
  assert_eq!(log[0].actor_id, admin.user_id);
  assert_eq!(log[0].target_id, moderated.project_id);
}

#[tokio::test]
async fn owner_cannot_restore_admin_deletion_but_admin_can() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let admin = user_with_role(&s, "mod", Role::Admin).await;
  let p = project(&s, &alice, "Demo").await;

  s.soft_delete_project(p.project_id, admin.actor(), Authority::Moderator, t0())
    .await
    .unwrap();

  let err = s
    .restore_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));

  s.restore_project(p.project_id, admin.actor(), Authority::Moderator, t0())
    .await
    .unwrap();
  let log = s.list_activity(10).await.unwrap();
  assert_eq!(log[0].action, Action::ProjectRestored);
}

// ─── Purge ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn purge_requires_super_admin_and_is_irreversible() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let admin = user_with_role(&s, "mod", Role::Admin).await;
  let root = user_with_role(&s, "root", Role::SuperAdmin).await;
  let p = project(&s, &alice, "Demo").await;
  s.like_project(p.project_id, admin.user_id, t0()).await.unwrap();
  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  let err = s
    .purge_project(p.project_id, admin.actor(), t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));

  s.purge_project(p.project_id, root.actor(), t0()).await.unwrap();

  let err = s
    .restore_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));
  assert!(s.get_project(p.project_id, true).await.unwrap().is_none());

  let log = s.list_activity(10).await.unwrap();
  assert_eq!(log[0].action, Action::ProjectPurged);
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn listings_partition_live_and_deleted() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let keep = project(&s, &alice, "Keep").await;
  let gone = project(&s, &alice, "Gone").await;
  let bobs = project(&s, &bob, "Bob's").await;

  s.soft_delete_project(gone.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();
  s.soft_delete_project(bobs.project_id, bob.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  let live = s.list_projects(ProjectQuery::default()).await.unwrap();
  assert_eq!(live.len(), 1);
  assert_eq!(live[0].project_id, keep.project_id);

  let mine = s.list_deleted_projects(Some(alice.user_id)).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].project_id, gone.project_id);

  let all = s.list_deleted_projects(None).await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(all.iter().all(|p| p.lifecycle.is_deleted()));

  assert!(s.get_project(gone.project_id, false).await.unwrap().is_none());
}

#[tokio::test]
async fn trashed_time_remaining_floors_at_zero() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let p = project(&s, &alice, "Demo").await;
  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  let deleted = s.list_deleted_projects(Some(alice.user_id)).await.unwrap();
  let fresh = Trashed::new(deleted[0].clone(), t0() + TimeDelta::hours(1)).unwrap();
  assert_eq!(fresh.time_remaining_ms, 23 * 60 * 60 * 1000);

  let stale = Trashed::new(deleted[0].clone(), t0() + TimeDelta::hours(30)).unwrap();
  assert_eq!(stale.time_remaining_ms, 0);
}

#[tokio::test]
async fn list_projects_filters() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  project(&s, &alice, "Parser").await;
  project(&s, &bob, "Compiler").await;

  let by_owner = s
    .list_projects(ProjectQuery {
      owner_id: Some(bob.user_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_owner.len(), 1);
  assert_eq!(by_owner[0].title, "Compiler");

  let by_text = s
    .list_projects(ProjectQuery {
      text: Some("pars".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_text.len(), 1);
  assert_eq!(by_text[0].title, "Parser");

  let by_tag = s
    .list_projects(ProjectQuery {
      tag: Some("rust".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_tag.len(), 2);

  let paged = s
    .list_projects(ProjectQuery {
      limit: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(paged.len(), 1);
}

// ─── Engagement ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn likes_are_idempotent_and_counted() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let p = project(&s, &alice, "Demo").await;

  assert_eq!(s.like_project(p.project_id, bob.user_id, t0()).await.unwrap(), 1);
  assert_eq!(s.like_project(p.project_id, bob.user_id, t0()).await.unwrap(), 1);
  assert_eq!(s.like_project(p.project_id, alice.user_id, t0()).await.unwrap(), 2);
  assert_eq!(s.unlike_project(p.project_id, bob.user_id).await.unwrap(), 1);

  assert_eq!(s.share_project(p.project_id, bob.user_id, t0()).await.unwrap(), 1);
  assert_eq!(s.share_project(p.project_id, bob.user_id, t0()).await.unwrap(), 2);

  let fetched = s.get_project(p.project_id, false).await.unwrap().unwrap();
  assert_eq!(fetched.like_count, 1);
  assert_eq!(fetched.share_count, 2);
}

#[tokio::test]
async fn engagement_rejects_deleted_projects() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let p = project(&s, &alice, "Demo").await;
  s.soft_delete_project(p.project_id, alice.actor(), Authority::Owner, t0())
    .await
    .unwrap();

  let err = s.like_project(p.project_id, bob.user_id, t0()).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));

  let err = s
    .add_comment(p.project_id, bob.user_id, "hi".into(), t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));

  let err = s.list_comments(p.project_id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));
}

#[tokio::test]
async fn comments_can_be_removed_by_author_or_admin() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let admin = user_with_role(&s, "mod", Role::Admin).await;
  let p = project(&s, &alice, "Demo").await;

  let first = s
    .add_comment(p.project_id, bob.user_id, "first".into(), t0())
    .await
    .unwrap();
  let second = s
    .add_comment(p.project_id, bob.user_id, "second".into(), t0())
    .await
    .unwrap();

  let err = s.delete_comment(first.comment_id, alice.actor()).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));

  s.delete_comment(first.comment_id, bob.actor()).await.unwrap();
  s.delete_comment(second.comment_id, admin.actor()).await.unwrap();
  assert!(s.list_comments(p.project_id).await.unwrap().is_empty());

  let err = s.delete_comment(first.comment_id, bob.actor()).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));
}

#[tokio::test]
async fn empty_title_is_rejected() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s
    .create_project(
      alice.user_id,
      showcase_core::project::NewProject {
        title:       "  ".into(),
        description: String::new(),
        repo_url:    None,
        tags:        vec![],
      },
      t0(),
    )
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::InvalidInput(_)));
}
