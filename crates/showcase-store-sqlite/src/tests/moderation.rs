use showcase_core::{
  Error as CoreError, Role,
  moderation::{Action, NewReport, ReportStatus, ReportTarget},
  store::{ModerationStore, UserStore},
};
use uuid::Uuid;

use super::{core_err, project, store, t0, user, user_with_role};

#[tokio::test]
async fn file_and_resolve_report() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let admin = user_with_role(&s, "mod", Role::Admin).await;
  let p = project(&s, &alice, "Demo").await;

  let report = s
    .file_report(
      bob.user_id,
      NewReport {
        target: ReportTarget::Project(p.project_id),
        reason: "  spam  ".into(),
      },
      t0(),
    )
    .await
    .unwrap();
  assert_eq!(report.status, ReportStatus::Open);
  assert_eq!(report.reason, "spam");

  let open = s.list_reports(Some(ReportStatus::Open)).await.unwrap();
  assert_eq!(open.len(), 1);

  let resolved = s
    .resolve_report(
      report.report_id,
      admin.actor(),
      ReportStatus::Dismissed,
      Some("not spam".into()),
      t0(),
    )
    .await
    .unwrap();
  assert_eq!(resolved.status, ReportStatus::Dismissed);
  assert_eq!(resolved.resolved_by, Some(admin.user_id));
  assert_eq!(resolved.resolution_note.as_deref(), Some("not spam"));
  assert_eq!(resolved.resolved_at, Some(t0()));

  assert!(s.list_reports(Some(ReportStatus::Open)).await.unwrap().is_empty());
  assert_eq!(s.list_reports(None).await.unwrap().len(), 1);

  let log = s.list_activity(10).await.unwrap();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].action, Action::ReportResolved);
  assert_eq!(log[0].detail.as_deref(), Some("dismissed"));
}

#[tokio::test]
async fn resolving_twice_conflicts() {
  let s = store().await;
  let bob = user(&s, "bob").await;
  let admin = user_with_role(&s, "mod", Role::Admin).await;

  let report = s
    .file_report(
      admin.user_id,
      NewReport {
        target: ReportTarget::User(bob.user_id),
        reason: "rude".into(),
      },
      t0(),
    )
    .await
    .unwrap();

  s.resolve_report(report.report_id, admin.actor(), ReportStatus::Resolved, None, t0())
    .await
    .unwrap();
  let err = s
    .resolve_report(report.report_id, admin.actor(), ReportStatus::Resolved, None, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Conflict(_)));

  let err = s
    .resolve_report(Uuid::new_v4(), admin.actor(), ReportStatus::Resolved, None, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));
}

#[tokio::test]
async fn resolve_requires_admin_and_closed_status() {
  let s = store().await;
  let bob = user(&s, "bob").await;
  let admin = user_with_role(&s, "mod", Role::Admin).await;

  let err = s
    .resolve_report(Uuid::new_v4(), bob.actor(), ReportStatus::Resolved, None, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));

  let err = s
    .resolve_report(Uuid::new_v4(), admin.actor(), ReportStatus::Open, None, t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn report_needs_reason_and_existing_target() {
  let s = store().await;
  let bob = user(&s, "bob").await;

  let err = s
    .file_report(
      bob.user_id,
      NewReport {
        target: ReportTarget::Project(Uuid::new_v4()),
        reason: "spam".into(),
      },
      t0(),
    )
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));

  let err = s
    .file_report(
      bob.user_id,
      NewReport {
        target: ReportTarget::User(bob.user_id),
        reason: "   ".into(),
      },
      t0(),
    )
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn set_role_is_super_admin_only_and_logged() {
  let s = store().await;
  let bob = user(&s, "bob").await;
  let admin = user_with_role(&s, "mod", Role::Admin).await;
  let root = user_with_role(&s, "root", Role::SuperAdmin).await;

  let err = s
    .set_role(bob.user_id, Role::Admin, admin.actor(), t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::Forbidden(_)));

  let promoted = s
    .set_role(bob.user_id, Role::Admin, root.actor(), t0())
    .await
    .unwrap();
  assert_eq!(promoted.role, Role::Admin);
  assert_eq!(s.get_user(bob.user_id).await.unwrap().unwrap().role, Role::Admin);

  let log = s.list_activity(10).await.unwrap();
  assert_eq!(log[0].action, Action::RoleChanged);
  assert_eq!(log[0].target_id, bob.user_id);
  assert_eq!(log[0].detail.as_deref(), Some("admin"));

  let err = s
    .set_role(root.user_id, Role::User, root.actor(), t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::InvalidInput(_)));

  let err = s
    .set_role(Uuid::new_v4(), Role::Admin, root.actor(), t0())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), CoreError::NotFound(..)));
}

#[tokio::test]
async fn activity_limit_applies() {
  let s = store().await;
  let root = user_with_role(&s, "root", Role::SuperAdmin).await;
  let bob = user(&s, "bob").await;

  for role in [Role::Admin, Role::User, Role::Admin] {
    s.set_role(bob.user_id, role, root.actor(), t0()).await.unwrap();
  }
  let log = s.list_activity(2).await.unwrap();
  assert_eq!(log.len(), 2);
  assert_eq!(log[0].detail.as_deref(), Some("admin"));
  assert_eq!(log[1].detail.as_deref(), Some("user"));
}
