//! Soft deletion with a time-boxed restore window.
//!
//! A soft-deleted record stays in storage, hidden from normal reads, until
//! either it is restored within [`restore_window`] of its deletion or a
//! super-admin purges it. Whether the window has lapsed is always computed
//! from `restore_available_until` at the time of the request; it is never a
//! stored flag.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  actor::{ActorContext, Authority},
  error::EntityKind,
};

pub const RESTORE_WINDOW_HOURS: i64 = 24;

/// How long after deletion the record can still be restored.
pub fn restore_window() -> TimeDelta { TimeDelta::hours(RESTORE_WINDOW_HOURS) }

// ─── Deletion ────────────────────────────────────────────────────────────────

/// The three fields set together when a record is soft-deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
  pub deleted_at:              DateTime<Utc>,
  pub deleted_by:              Uuid,
  pub restore_available_until: DateTime<Utc>,
}

impl Deletion {
  /// A deletion by `actor` at `at`, with a fresh restore window.
  pub fn begin(actor: Uuid, at: DateTime<Utc>) -> Self {
    Self {
      deleted_at:              at,
      deleted_by:              actor,
      restore_available_until: at + restore_window(),
    }
  }

  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
    now >= self.restore_available_until
  }

  /// Time left until the window closes, floored at zero.
  pub fn time_remaining(&self, now: DateTime<Utc>) -> TimeDelta {
    (self.restore_available_until - now).max(TimeDelta::zero())
  }
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

/// Whether a record is live or soft-deleted.
///
/// Serialises as the flat `is_deleted` / `deleted_at` / `deleted_by` /
/// `restore_available_until` fields; deserialisation rejects combinations
/// where `is_deleted` disagrees with the other fields, or where the window
/// does not close [`restore_window`] after `deleted_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LifecycleFields", into = "LifecycleFields")]
pub enum Lifecycle {
  #[default]
  Active,
  Deleted(Deletion),
}

impl Lifecycle {
  pub fn is_deleted(&self) -> bool { matches!(self, Self::Deleted(_)) }

  pub fn deletion(&self) -> Option<&Deletion> {
    match self {
      Self::Active => None,
      Self::Deleted(d) => Some(d),
    }
  }

  /// Precondition for a soft delete.
  pub fn check_delete(&self, kind: EntityKind, id: Uuid) -> Result<()> {
    match self {
      Self::Active => Ok(()),
      Self::Deleted(_) => Err(Error::AlreadyDeleted(kind, id.to_string())),
    }
  }

  /// Preconditions for a restore, checked in order: the record is deleted,
  /// the actor may restore it, and the window is still open.
  pub fn check_restore(
    &self,
    kind: EntityKind,
    id: Uuid,
    actor: &ActorContext,
    authority: Authority,
    now: DateTime<Utc>,
  ) -> Result<&Deletion> {
    let deletion = self
      .deletion()
      .ok_or_else(|| Error::NotDeleted(kind, id.to_string()))?;

    match authority {
      Authority::Owner if deletion.deleted_by != actor.id => {
        return Err(Error::forbidden(format!(
          "only the actor who deleted {kind} {id} may restore it"
        )));
      }
      Authority::Owner => {}
      Authority::Moderator => authority.admit(actor)?,
    }

    if deletion.is_expired_at(now) {
      return Err(Error::WindowExpired(kind, id.to_string()));
    }
    Ok(deletion)
  }
}

/// Wire form of [`Lifecycle`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LifecycleFields {
  #[serde(default)]
  is_deleted:              bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  deleted_at:              Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  deleted_by:              Option<Uuid>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  restore_available_until: Option<DateTime<Utc>>,
}

impl From<Lifecycle> for LifecycleFields {
  fn from(l: Lifecycle) -> Self {
    match l {
      Lifecycle::Active => Self::default(),
      Lifecycle::Deleted(d) => Self {
        is_deleted:              true,
        deleted_at:              Some(d.deleted_at),
        deleted_by:              Some(d.deleted_by),
        restore_available_until: Some(d.restore_available_until),
      },
    }
  }
}

impl TryFrom<LifecycleFields> for Lifecycle {
  type Error = String;

  fn try_from(f: LifecycleFields) -> Result<Self, Self::Error> {
    match (f.is_deleted, f.deleted_at, f.deleted_by) {
      (false, None, None) if f.restore_available_until.is_none() => {
        Ok(Lifecycle::Active)
      }
      (true, Some(deleted_at), Some(deleted_by)) => {
        let deletion = Deletion::begin(deleted_by, deleted_at);
        match f.restore_available_until {
          Some(until) if until != deletion.restore_available_until => Err(format!(
            "restore_available_until must be {RESTORE_WINDOW_HOURS}h after deleted_at"
          )),
          _ => Ok(Lifecycle::Deleted(deletion)),
        }
      }
      _ => Err(
        "is_deleted must be set exactly when deleted_at and deleted_by are"
          .to_owned(),
      ),
    }
  }
}

// ─── Deleted listings ────────────────────────────────────────────────────────

/// Implemented by every record that carries a [`Lifecycle`].
pub trait SoftDeletable {
  const KIND: EntityKind;

  fn lifecycle(&self) -> &Lifecycle;
}

/// A soft-deleted record together with how long it can still be restored.
#[derive(Debug, Clone, Serialize)]
pub struct Trashed<T> {
  #[serde(flatten)]
  pub item:              T,
  /// Milliseconds until the restore window closes, floored at 0.
  pub time_remaining_ms: i64,
}

impl<T> Trashed<T> {
  pub fn with_deletion(item: T, deletion: &Deletion, now: DateTime<Utc>) -> Self {
    Self {
      time_remaining_ms: deletion.time_remaining(now).num_milliseconds(),
      item,
    }
  }
}

impl<T: SoftDeletable> Trashed<T> {
  /// Returns `None` for records that are not deleted.
  pub fn new(item: T, now: DateTime<Utc>) -> Option<Self> {
    let remaining = item.lifecycle().deletion()?.time_remaining(now);
    Some(Self {
      time_remaining_ms: remaining.num_milliseconds(),
      item,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::actor::Role;

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() }

  fn user() -> ActorContext { ActorContext::new(Uuid::new_v4(), Role::User) }

  #[test]
  fn begin_sets_a_24_hour_window() {
    let d = Deletion::begin(Uuid::nil(), t0());
    assert_eq!(d.restore_available_until - d.deleted_at, TimeDelta::hours(24));
  }

  #[test]
  fn time_remaining_is_floored_at_zero() {
    let d = Deletion::begin(Uuid::nil(), t0());
    assert_eq!(d.time_remaining(t0() + TimeDelta::hours(1)), TimeDelta::hours(23));
    assert_eq!(d.time_remaining(t0() + TimeDelta::days(3)), TimeDelta::zero());
  }

  #[test]
  fn check_delete_rejects_deleted() {
    let id = Uuid::new_v4();
    assert!(Lifecycle::Active.check_delete(EntityKind::Project, id).is_ok());

    let deleted = Lifecycle::Deleted(Deletion::begin(Uuid::nil(), t0()));
    assert!(matches!(
      deleted.check_delete(EntityKind::Project, id),
      Err(Error::AlreadyDeleted(EntityKind::Project, _))
    ));
  }

  #[test]
  fn restore_requires_deleted() {
    let actor = user();
    let err = Lifecycle::Active
      .check_restore(EntityKind::Project, Uuid::nil(), &actor, Authority::Owner, t0())
      .unwrap_err();
    assert!(matches!(err, Error::NotDeleted(..)));
  }

  #[test]
  fn restore_just_inside_window_succeeds() {
    let actor = user();
    let l = Lifecycle::Deleted(Deletion::begin(actor.id, t0()));
    let at = t0() + TimeDelta::hours(23) + TimeDelta::minutes(59);
    assert!(l
      .check_restore(EntityKind::Project, Uuid::nil(), &actor, Authority::Owner, at)
      .is_ok());
  }

  #[test]
  fn restore_at_deadline_has_expired() {
    let actor = user();
    let l = Lifecycle::Deleted(Deletion::begin(actor.id, t0()));
    let err = l
      .check_restore(
        EntityKind::Message,
        Uuid::nil(),
        &actor,
        Authority::Owner,
        t0() + restore_window(),
      )
      .unwrap_err();
    assert!(matches!(err, Error::WindowExpired(EntityKind::Message, _)));
  }

  #[test]
  fn restore_by_other_user_is_forbidden() {
    let deleter = user();
    let other = user();
    let l = Lifecycle::Deleted(Deletion::begin(deleter.id, t0()));
    let err = l
      .check_restore(EntityKind::Project, Uuid::nil(), &other, Authority::Owner, t0())
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[test]
  fn moderator_restore_skips_ownership_but_not_window() {
    let deleter = user();
    let admin = ActorContext::new(Uuid::new_v4(), Role::Admin);
    let l = Lifecycle::Deleted(Deletion::begin(deleter.id, t0()));

    assert!(l
      .check_restore(EntityKind::Project, Uuid::nil(), &admin, Authority::Moderator, t0())
      .is_ok());

    let err = l
      .check_restore(
        EntityKind::Project,
        Uuid::nil(),
        &admin,
        Authority::Moderator,
        t0() + TimeDelta::hours(25),
      )
      .unwrap_err();
    assert!(matches!(err, Error::WindowExpired(..)));
  }

  #[test]
  fn moderator_restore_by_plain_user_is_forbidden() {
    let deleter = user();
    let l = Lifecycle::Deleted(Deletion::begin(deleter.id, t0()));
    let err = l
      .check_restore(EntityKind::Project, Uuid::nil(), &deleter, Authority::Moderator, t0())
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[test]
  fn active_serialises_without_deletion_fields() {
    let json = serde_json::to_value(Lifecycle::Active).unwrap();
    assert_eq!(json, serde_json::json!({ "is_deleted": false }));
  }

  #[test]
  fn deleted_serialises_all_fields() {
    let by = Uuid::new_v4();
    let json = serde_json::to_value(Lifecycle::Deleted(Deletion::begin(by, t0()))).unwrap();
    assert_eq!(json["is_deleted"], true);
    assert_eq!(json["deleted_by"], serde_json::json!(by));
    assert!(json.get("deleted_at").is_some());
    assert!(json.get("restore_available_until").is_some());
  }

  #[test]
  fn inconsistent_fields_are_rejected() {
    let bad = serde_json::json!({ "is_deleted": true });
    assert!(serde_json::from_value::<Lifecycle>(bad).is_err());

    let bad = serde_json::json!({ "is_deleted": false, "deleted_by": Uuid::nil() });
    assert!(serde_json::from_value::<Lifecycle>(bad).is_err());
  }

  #[test]
  fn window_must_close_a_full_window_after_deletion() {
    let by = Uuid::new_v4();
    let mut json = serde_json::to_value(Lifecycle::Deleted(Deletion::begin(by, t0()))).unwrap();
    let ok: Lifecycle = serde_json::from_value(json.clone()).unwrap();
    assert_eq!(ok, Lifecycle::Deleted(Deletion::begin(by, t0())));

    json["restore_available_until"] = serde_json::json!(t0() + TimeDelta::days(30));
    assert!(serde_json::from_value::<Lifecycle>(json.clone()).is_err());

    json.as_object_mut().unwrap().remove("restore_available_until");
    let derived: Lifecycle = serde_json::from_value(json).unwrap();
    assert_eq!(derived.deletion().unwrap().restore_available_until, t0() + restore_window());
  }
}
